//! Error definitions

use thiserror::Error;

/// Failures reported by a ledger accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{kind} account {address} not found")]
    NotFound { kind: &'static str, address: String },

    #[error("Failed to decode {kind} account: {reason}")]
    Decode { kind: &'static str, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by the ledger: {0}")]
    Rejected(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Pre-submission gate failures for a poll draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a community")]
    MissingCommunity,

    #[error("Please enter a question")]
    MissingQuestion,

    #[error("Please choose an end time")]
    MissingEndTime,

    #[error("Please add at least one option")]
    NoTextOptions,

    #[error("Please select at least 2 members for the poll (selected {selected})")]
    TooFewMembers { selected: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown poll category {0:?}")]
pub struct UnknownCategory(pub String);

#[derive(Error, Debug)]
pub enum PollsError {
    #[error("Ledger request failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid account address: {input:?}")]
    InvalidIdentifier { input: String },

    #[error("Invalid end time: {input:?}")]
    InvalidEndTime { input: String },

    #[error("Connect a wallet to create polls")]
    NotConnected,

    #[error("Failed to create poll: {0}")]
    Submission(LedgerError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PollsError {
    /// Whether the error came from the draft rather than the network.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            PollsError::Validation(_)
                | PollsError::InvalidIdentifier { .. }
                | PollsError::InvalidEndTime { .. }
        )
    }
}

pub type Result<T, E = PollsError> = std::result::Result<T, E>;
