//! Poll enrichment pipeline
//!
//! Fetches every poll in one request, then enriches each poll
//! independently with its community and creator profile. Metadata misses
//! never drop a poll; only the top-level listing can fail the pipeline.

use futures::future::join_all;
use serde::Serialize;
use solana_pubkey::Pubkey;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::ledger::LedgerReader;
use crate::state::{serialize_address, Community, Keyed, Poll, Profile};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    #[serde(serialize_with = "serialize_address")]
    pub address: Pubkey,
    pub name: String,
    pub member_count: u64,
}

impl CommunitySummary {
    pub fn from_account(address: Pubkey, community: &Community) -> Self {
        Self {
            address,
            name: community.name.clone(),
            member_count: community.member_count,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    #[serde(serialize_with = "serialize_address")]
    pub owner: Pubkey,
    pub display_name: String,
    pub avatar_uri: String,
    /// First character of the display name, upper-cased, for avatar badges
    pub initial: Option<char>,
}

impl From<Profile> for ProfileSummary {
    fn from(profile: Profile) -> Self {
        let initial = profile
            .display_name
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next());
        Self {
            owner: profile.owner,
            display_name: profile.display_name,
            avatar_uri: profile.avatar_uri,
            initial,
        }
    }
}

/// A poll plus metadata and fields derived at fetch time.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPoll {
    #[serde(serialize_with = "serialize_address")]
    pub address: Pubkey,
    pub poll: Poll,
    pub community: Option<CommunitySummary>,
    pub creator: Option<ProfileSummary>,
    /// `now < end_time` at enrichment time
    pub is_active: bool,
    pub total_votes: u64,
    /// Vote tracking is not wired up yet; always false.
    pub has_user_voted: bool,
}

impl EnrichedPoll {
    /// Wraps a poll with its derived fields and no metadata attached.
    pub fn derive(keyed: Keyed<Poll>, now: i64) -> Self {
        let Keyed {
            address,
            account: poll,
        } = keyed;
        Self {
            address,
            is_active: is_active(&poll, now),
            total_votes: total_votes(&poll),
            has_user_voted: false,
            community: None,
            creator: None,
            poll,
        }
    }

    pub fn community_name(&self) -> Option<&str> {
        self.community.as_ref().map(|c| c.name.as_str())
    }

    pub fn creator_name(&self) -> Option<&str> {
        self.creator.as_ref().map(|p| p.display_name.as_str())
    }

    /// Share of the total for option `index`, in percent. Zero when no
    /// votes have been cast.
    pub fn vote_share(&self, index: usize) -> f64 {
        match self.poll.votes_per_option.get(index) {
            Some(&count) if self.total_votes > 0 => {
                count as f64 * 100.0 / self.total_votes as f64
            }
            _ => 0.0,
        }
    }
}

/// A poll is active strictly before its end time.
pub fn is_active(poll: &Poll, now: i64) -> bool {
    now < poll.end_time
}

pub fn total_votes(poll: &Poll) -> u64 {
    poll.votes_per_option
        .iter()
        .fold(0u64, |acc, &count| acc.saturating_add(count))
}

/// Newest first. The sort is stable, so ties keep fetch order.
pub fn sort_newest_first(polls: &mut [EnrichedPoll]) {
    polls.sort_by(|a, b| b.poll.created_at.cmp(&a.poll.created_at));
}

/// Runs the full pipeline against `reader`, evaluating activity at `now`
/// (unix seconds).
pub async fn enrich_polls<R>(reader: &R, now: i64) -> Result<Vec<EnrichedPoll>>
where
    R: LedgerReader + ?Sized,
{
    let polls = reader.fetch_all_polls().await.map_err(|e| {
        error!(error = %e, "failed to fetch polls");
        e
    })?;
    debug!(count = polls.len(), "fetched polls, enriching");

    let mut enriched = join_all(polls.into_iter().map(|poll| enrich_one(reader, poll, now))).await;
    sort_newest_first(&mut enriched);
    Ok(enriched)
}

async fn enrich_one<R>(reader: &R, keyed: Keyed<Poll>, now: i64) -> EnrichedPoll
where
    R: LedgerReader + ?Sized,
{
    let community_key = keyed.account.community;
    let creator_key = keyed.account.created_by;
    let address = keyed.address;

    let (community, creator) = futures::join!(
        reader.fetch_community(&community_key),
        reader.fetch_profile(&creator_key),
    );

    let mut enriched = EnrichedPoll::derive(keyed, now);
    enriched.community = match community {
        Ok(community) => Some(CommunitySummary::from_account(community_key, &community)),
        Err(e) => {
            warn!(poll = %address, community = %community_key, error = %e, "failed to fetch community info");
            None
        }
    };
    enriched.creator = match creator {
        Ok(profile) => Some(profile.into()),
        Err(e) => {
            warn!(poll = %address, creator = %creator_key, error = %e, "failed to fetch creator profile");
            None
        }
    };
    enriched
}
