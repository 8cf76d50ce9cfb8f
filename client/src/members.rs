//! Community member loading for member-based polls

use futures::future::join_all;
use serde::Serialize;
use solana_pubkey::Pubkey;
use tracing::{debug, warn};

use crate::draft::parse_address;
use crate::enrich::ProfileSummary;
use crate::error::Result;
use crate::ledger::LedgerReader;
use crate::state::{serialize_address, Keyed, Member};

const UNKNOWN_USER: &str = "Unknown User";
const SHORT_ID_LEN: usize = 8;

/// A member with its profile, if one could be fetched.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    #[serde(serialize_with = "serialize_address")]
    pub address: Pubkey,
    pub member: Member,
    pub profile: Option<ProfileSummary>,
}

impl MemberEntry {
    /// Wallet of the member; this is what a member poll option refers to.
    pub fn user(&self) -> Pubkey {
        self.member.user
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_USER)
    }

    pub fn initial(&self) -> char {
        self.profile
            .as_ref()
            .and_then(|p| p.initial)
            .or_else(|| self.member.user.to_string().chars().next())
            .unwrap_or('?')
    }

    /// Abbreviated wallet, e.g. `7xKXtg2C...`
    pub fn short_id(&self) -> String {
        let user = self.member.user.to_string();
        let prefix: String = user.chars().take(SHORT_ID_LEN).collect();
        format!("{}...", prefix)
    }
}

/// Loads the members of the community typed into `community_input`, each
/// with its profile attached where available.
///
/// A malformed address fails before any fetch. A member whose profile
/// cannot be fetched is kept with `profile: None`.
pub async fn load_members<R>(reader: &R, community_input: &str) -> Result<Vec<MemberEntry>>
where
    R: LedgerReader + ?Sized,
{
    let community = parse_address(community_input)?;
    let members = reader.fetch_community_members(&community).await?;
    debug!(%community, count = members.len(), "fetched community members");

    Ok(join_all(members.into_iter().map(|member| attach_profile(reader, member))).await)
}

async fn attach_profile<R>(reader: &R, keyed: Keyed<Member>) -> MemberEntry
where
    R: LedgerReader + ?Sized,
{
    let profile = match reader.fetch_profile(&keyed.account.user).await {
        Ok(profile) => Some(profile.into()),
        Err(e) => {
            warn!(user = %keyed.account.user, error = %e, "failed to fetch member profile");
            None
        }
    };
    MemberEntry {
        address: keyed.address,
        member: keyed.account,
        profile,
    }
}
