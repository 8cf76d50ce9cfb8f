//! Client-side filtering and search over enriched polls

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use solana_pubkey::Pubkey;

use crate::enrich::EnrichedPoll;
use crate::error::UnknownCategory;
use crate::session::Session;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Active,
    Ended,
    /// Polls created by the caller
    #[serde(rename = "my")]
    Mine,
    /// Reserved for polls from the caller's communities; no predicate yet,
    /// behaves like `All`.
    Community,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Active => "active",
            Category::Ended => "ended",
            Category::Mine => "my",
            Category::Community => "community",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::All => "All Polls",
            Category::Active => "Active",
            Category::Ended => "Ended",
            Category::Mine => "My Polls",
            Category::Community => "My Communities",
        }
    }

    /// Tabs offered to the given session. `Mine` needs a caller.
    pub fn available(session: &Session) -> Vec<Category> {
        let mut tabs = vec![Category::All, Category::Active, Category::Ended];
        if session.is_connected() {
            tabs.push(Category::Mine);
        }
        tabs
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Category::All),
            "active" => Ok(Category::Active),
            "ended" => Ok(Category::Ended),
            "my" => Ok(Category::Mine),
            "community" => Ok(Category::Community),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Case-insensitive substring match on the question or the community name.
pub fn matches_search(poll: &EnrichedPoll, needle_lower: &str) -> bool {
    poll.poll.question_uri.to_lowercase().contains(needle_lower)
        || poll
            .community_name()
            .is_some_and(|name| name.to_lowercase().contains(needle_lower))
}

pub fn matches_category(poll: &EnrichedPoll, category: Category, caller: Option<&Pubkey>) -> bool {
    match category {
        Category::All | Category::Community => true,
        Category::Active => poll.is_active,
        Category::Ended => !poll.is_active,
        Category::Mine => match caller {
            Some(caller) => poll.poll.created_by == *caller,
            // Unreachable from the UI; degrade to no identity filter.
            None => true,
        },
    }
}

/// Narrows `polls` by search text, then by category. Never reorders and
/// never mutates the input.
pub fn filter_polls<'a>(
    polls: &'a [EnrichedPoll],
    category: Category,
    search: &str,
    caller: Option<&Pubkey>,
) -> Vec<&'a EnrichedPoll> {
    let needle = search.to_lowercase();
    polls
        .iter()
        .filter(|poll| needle.is_empty() || matches_search(poll, &needle))
        .filter(|poll| matches_category(poll, category, caller))
        .collect()
}
