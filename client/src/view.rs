//! Page-level polls view state
//!
//! Owns the enriched collection and the creation flow. The collection is
//! only ever replaced wholesale by a completed refresh.

use solana_pubkey::Pubkey;
use tracing::warn;

use crate::create::CreationFlow;
use crate::enrich::{enrich_polls, EnrichedPoll};
use crate::error::{PollsError, Result};
use crate::filter::{filter_polls, Category};
use crate::ledger::{LedgerReader, LedgerWriter, TransactionSignature};
use crate::scope::ViewScope;
use crate::session::Session;

pub const LOAD_FAILED_BANNER: &str = "Failed to load polls";

#[derive(Debug)]
pub struct PollsView {
    polls: Vec<EnrichedPoll>,
    loading: bool,
    error: Option<String>,
    category: Category,
    search: String,
    scope: ViewScope,
    creation: CreationFlow,
}

impl PollsView {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            polls: Vec::new(),
            loading: true,
            error: None,
            category: Category::All,
            search: String::new(),
            scope: ViewScope::new(),
            creation: CreationFlow::new(program_id),
        }
    }

    pub fn polls(&self) -> &[EnrichedPoll] {
        &self.polls
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn creation(&self) -> &CreationFlow {
        &self.creation
    }

    pub fn creation_mut(&mut self) -> &mut CreationFlow {
        &mut self.creation
    }

    pub fn categories(&self, session: &Session) -> Vec<Category> {
        Category::available(session)
    }

    /// Re-runs the enrichment pipeline and commits the result.
    ///
    /// A failed listing raises the error banner and keeps the previous
    /// collection. A refresh cancelled by `teardown` commits nothing.
    pub async fn refresh<R>(&mut self, reader: &R, now: i64) -> Result<()>
    where
        R: LedgerReader + ?Sized,
    {
        self.loading = true;
        self.error = None;

        let outcome = self.scope.run(enrich_polls(reader, now)).await.and_then(|r| r);
        match outcome {
            Ok(polls) => {
                self.polls = polls;
                self.loading = false;
                Ok(())
            }
            Err(PollsError::Cancelled) => {
                self.loading = false;
                Err(PollsError::Cancelled)
            }
            Err(e) => {
                self.error = Some(LOAD_FAILED_BANNER.to_string());
                self.loading = false;
                Err(e)
            }
        }
    }

    /// The collection narrowed by the current search and category.
    pub fn filtered_polls(&self, session: &Session) -> Vec<&EnrichedPoll> {
        filter_polls(&self.polls, self.category, &self.search, session.caller())
    }

    pub fn filtered_polls_json(&self, session: &Session) -> Result<String> {
        Ok(serde_json::to_string(&self.filtered_polls(session))?)
    }

    /// Sets the draft's community and reloads the member list for it.
    pub async fn load_members_for<R>(&mut self, reader: &R, community_input: &str)
    where
        R: LedgerReader + ?Sized,
    {
        self.creation.draft_mut().community = community_input.to_string();
        self.creation
            .load_members_for(reader, &self.scope, community_input)
            .await;
    }

    /// Submits the open draft. On success the view is refreshed once so the
    /// new poll shows up; a failure of that refresh does not undo the
    /// submission.
    pub async fn create_poll<R, W>(
        &mut self,
        reader: &R,
        writer: Option<&W>,
        session: &Session,
        now: i64,
    ) -> Result<TransactionSignature>
    where
        R: LedgerReader + ?Sized,
        W: LedgerWriter + ?Sized,
    {
        let signature = self.creation.submit(session, writer, &self.scope).await?;
        if let Err(e) = self.refresh(reader, now).await {
            warn!(error = %e, "refresh after poll creation failed");
        }
        Ok(signature)
    }

    /// Cancels in-flight work. Nothing started before teardown commits.
    pub fn teardown(&self) {
        self.scope.close();
    }
}
