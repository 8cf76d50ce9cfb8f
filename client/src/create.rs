//! Poll creation flow
//!
//! Editing -> Validating -> Submitting, then either closed with a fresh
//! draft (success) or back to Editing with the draft intact (failure).
//! Nothing is retried automatically; the user re-submits.

use solana_pubkey::Pubkey;
use tracing::{debug, error, info, warn};

use crate::draft::{parse_address, parse_end_time, NewPollDraft};
use crate::error::{PollsError, Result};
use crate::ledger::{CreatePollRequest, LedgerReader, LedgerWriter, TransactionSignature};
use crate::members::{load_members, MemberEntry};
use crate::scope::ViewScope;
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreationState {
    #[default]
    Closed,
    Editing,
    Validating,
    Submitting,
}

#[derive(Debug)]
pub struct CreationFlow {
    program_id: Pubkey,
    state: CreationState,
    draft: NewPollDraft,
    members: Vec<MemberEntry>,
    loading_members: bool,
    last_error: Option<String>,
}

impl CreationFlow {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: CreationState::Closed,
            draft: NewPollDraft::default(),
            members: Vec::new(),
            loading_members: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != CreationState::Closed
    }

    pub fn draft(&self) -> &NewPollDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut NewPollDraft {
        &mut self.draft
    }

    pub fn members(&self) -> &[MemberEntry] {
        &self.members
    }

    pub fn is_loading_members(&self) -> bool {
        self.loading_members
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn open(&mut self) {
        if self.state == CreationState::Closed {
            self.state = CreationState::Editing;
        }
    }

    /// Discards the draft and closes the flow. Refused once a submission
    /// is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.state == CreationState::Submitting {
            return false;
        }
        self.clear();
        true
    }

    fn clear(&mut self) {
        self.draft.reset();
        self.members.clear();
        self.last_error = None;
        self.state = CreationState::Closed;
    }

    fn fail(&mut self, err: &PollsError) {
        self.last_error = Some(err.to_string());
        self.state = CreationState::Editing;
    }

    /// Replaces the member list with the members of `community_input`.
    ///
    /// Failures are not reported to the caller: a malformed address or a
    /// failed fetch leaves an empty list. Selections that are not in the
    /// new list are dropped.
    pub async fn load_members_for<R>(&mut self, reader: &R, scope: &ViewScope, community_input: &str)
    where
        R: LedgerReader + ?Sized,
    {
        if community_input.trim().is_empty() {
            self.members.clear();
            self.draft.selected_members.clear();
            return;
        }

        self.loading_members = true;
        let loaded = scope.run(load_members(reader, community_input)).await;
        self.loading_members = false;

        self.members = match loaded.and_then(|r| r) {
            Ok(members) => members,
            Err(PollsError::Cancelled) => return,
            Err(PollsError::InvalidIdentifier { input }) => {
                debug!(input = %input, "community address not parseable yet");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch community members");
                Vec::new()
            }
        };

        let members = &self.members;
        self.draft
            .selected_members
            .retain(|selected| members.iter().any(|m| m.member.user == *selected));
    }

    /// Validates the draft and turns it into a creation request.
    pub fn assemble(&self, session: &Session) -> Result<CreatePollRequest> {
        self.draft.validate()?;
        let creator = session.caller.ok_or(PollsError::NotConnected)?;

        let community = parse_address(&self.draft.community)?;
        let end_time = parse_end_time(&self.draft.end_time)?;
        let options = self.draft.encode_options(&community, &self.program_id);

        Ok(CreatePollRequest::new(
            creator,
            community,
            self.draft.question.clone(),
            options,
            end_time,
        ))
    }

    /// Validates, assembles and submits the draft through `writer`.
    ///
    /// `writer` is absent when no wallet is connected. On success the draft
    /// is reset and the flow closes; on any failure the draft is kept and
    /// the flow returns to editing.
    pub async fn submit<W>(
        &mut self,
        session: &Session,
        writer: Option<&W>,
        scope: &ViewScope,
    ) -> Result<TransactionSignature>
    where
        W: LedgerWriter + ?Sized,
    {
        self.state = CreationState::Validating;

        let request = match self.assemble(session) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "poll draft rejected");
                self.fail(&e);
                return Err(e);
            }
        };
        let Some(writer) = writer else {
            let e = PollsError::NotConnected;
            self.fail(&e);
            return Err(e);
        };

        self.state = CreationState::Submitting;
        let outcome = scope.run(writer.create_poll(&request)).await;

        match outcome {
            Ok(Ok(signature)) => {
                info!(
                    %signature,
                    community = %request.community,
                    poll_id = request.poll_id,
                    options = request.options.len(),
                    "poll created"
                );
                self.clear();
                Ok(signature)
            }
            Ok(Err(e)) => {
                error!(error = %e, "error creating poll");
                let e = PollsError::Submission(e);
                self.fail(&e);
                Err(e)
            }
            Err(e) => {
                self.state = CreationState::Editing;
                Err(e)
            }
        }
    }
}
