//! Poll creation draft, validation gate and option encoding

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use solana_pubkey::Pubkey;

use crate::error::{PollsError, Result, ValidationError};
use crate::state::text_option_address;

pub const MIN_OPTION_SLOTS: usize = 2;
pub const MAX_OPTION_SLOTS: usize = 5;
pub const MIN_MEMBER_OPTIONS: usize = 2;

/// Formats produced by a `datetime-local` input.
const LOCAL_END_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// How a poll's options are represented on the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionStrategy {
    /// Free-text labels, encoded as content-addressed references
    #[default]
    Text,
    /// Each option is a community member's wallet
    Member,
}

/// The creation form. Owned by the creation flow and discarded on cancel
/// or successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPollDraft {
    /// Community address as typed; parsed at submission
    pub community: String,
    pub question: String,
    pub strategy: OptionStrategy,
    pub options: Vec<String>,
    /// Selection order is preserved and becomes option order
    pub selected_members: Vec<Pubkey>,
    /// Local wall-clock end time, `YYYY-MM-DDTHH:MM`
    pub end_time: String,
}

impl Default for NewPollDraft {
    fn default() -> Self {
        Self {
            community: String::new(),
            question: String::new(),
            strategy: OptionStrategy::Text,
            options: vec![String::new(); MIN_OPTION_SLOTS],
            selected_members: Vec::new(),
            end_time: String::new(),
        }
    }
}

impl NewPollDraft {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds an empty slot. Returns false at the slot limit.
    pub fn add_option_slot(&mut self) -> bool {
        if self.options.len() >= MAX_OPTION_SLOTS {
            return false;
        }
        self.options.push(String::new());
        true
    }

    /// Removes slot `index`. The draft never drops below two slots.
    pub fn remove_option_slot(&mut self, index: usize) -> bool {
        if self.options.len() <= MIN_OPTION_SLOTS || index >= self.options.len() {
            return false;
        }
        self.options.remove(index);
        true
    }

    pub fn set_option(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.options.get_mut(index) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    pub fn set_member_selected(&mut self, member: Pubkey, selected: bool) {
        if selected {
            if !self.selected_members.contains(&member) {
                self.selected_members.push(member);
            }
        } else {
            self.selected_members.retain(|m| *m != member);
        }
    }

    pub fn is_member_selected(&self, member: &Pubkey) -> bool {
        self.selected_members.contains(member)
    }

    /// Trimmed labels of the non-empty text slots, in slot order.
    pub fn filled_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn distinct_members(&self) -> usize {
        self.selected_members.iter().collect::<HashSet<_>>().len()
    }

    /// Whether the required fields are filled in; mirrors the submit
    /// button's enabled state.
    pub fn is_submittable(&self) -> bool {
        !self.community.trim().is_empty()
            && !self.question.trim().is_empty()
            && !self.end_time.trim().is_empty()
    }

    /// Runs the pre-submission gate. Performs no I/O.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.community.trim().is_empty() {
            return Err(ValidationError::MissingCommunity);
        }
        if self.question.trim().is_empty() {
            return Err(ValidationError::MissingQuestion);
        }
        if self.end_time.trim().is_empty() {
            return Err(ValidationError::MissingEndTime);
        }
        match self.strategy {
            OptionStrategy::Text if self.filled_options().is_empty() => {
                Err(ValidationError::NoTextOptions)
            }
            OptionStrategy::Member if self.distinct_members() < MIN_MEMBER_OPTIONS => {
                Err(ValidationError::TooFewMembers {
                    selected: self.distinct_members(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Option references for the creation request.
    ///
    /// Member polls use the selected wallets directly. Text polls get one
    /// content-addressed reference per non-empty slot.
    pub fn encode_options(&self, community: &Pubkey, program_id: &Pubkey) -> Vec<Pubkey> {
        match self.strategy {
            OptionStrategy::Member => self.selected_members.clone(),
            OptionStrategy::Text => self
                .filled_options()
                .into_iter()
                .map(|label| text_option_address(community, label, program_id).0)
                .collect(),
        }
    }
}

pub fn parse_address(input: &str) -> Result<Pubkey> {
    input
        .trim()
        .parse::<Pubkey>()
        .map_err(|_| PollsError::InvalidIdentifier {
            input: input.to_string(),
        })
}

/// Parses an end-time input into unix seconds, truncating sub-second
/// precision. Accepts the local wall-clock form or RFC 3339.
pub fn parse_end_time(input: &str) -> Result<i64> {
    let input = input.trim();
    let invalid = || PollsError::InvalidEndTime {
        input: input.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp());
    }

    let naive = LOCAL_END_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(invalid)?;

    // `earliest` resolves the repeated hour at a DST fall-back; a time in a
    // spring-forward gap does not exist and is rejected.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(invalid)
}
