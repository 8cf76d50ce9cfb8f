//! Poll discovery, enrichment, filtering and creation for the community
//! polls program.
//!
//! The crate sits between a ledger accessor and a UI:
//!
//! - [`enrich`] fetches every poll and attaches community and creator
//!   metadata, tolerating per-poll metadata misses.
//! - [`filter`] narrows the enriched collection by category and search text.
//! - [`members`] loads a community's members for member-based polls.
//! - [`create`] validates a draft, encodes its options and submits it.
//! - [`view`] ties these together as page-level state.
//!
//! The ledger itself is abstracted behind [`ledger::LedgerReader`] and
//! [`ledger::LedgerWriter`].

pub mod config;
pub mod create;
pub mod draft;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod members;
pub mod scope;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod view;

pub use config::Config;
pub use create::{CreationFlow, CreationState};
pub use draft::{NewPollDraft, OptionStrategy};
pub use enrich::{enrich_polls, EnrichedPoll};
pub use error::{LedgerError, PollsError, UnknownCategory, ValidationError};
pub use filter::{filter_polls, Category};
pub use ledger::{CreatePollRequest, LedgerReader, LedgerWriter, TransactionSignature};
pub use members::{load_members, MemberEntry};
pub use scope::ViewScope;
pub use session::Session;
pub use view::PollsView;

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
