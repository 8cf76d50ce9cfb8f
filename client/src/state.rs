//! Account layouts of the community polls program
//!
//! Every account is stored as an 8-byte discriminator followed by the
//! Borsh body. The discriminator is the first 8 bytes of
//! `sha256("account:<Name>")`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use solana_pubkey::Pubkey;

use crate::error::LedgerError;

pub const DISCRIMINATOR_LEN: usize = 8;

pub const POLL_SEED: &[u8] = b"poll";
pub const PROFILE_SEED: &[u8] = b"profile";
pub const MEMBER_SEED: &[u8] = b"member";
pub const POLL_OPTION_SEED: &[u8] = b"poll_option";

fn hashed_prefix(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", namespace, name).as_bytes());
    let result = hasher.finalize();
    let mut disc = [0u8; DISCRIMINATOR_LEN];
    disc.copy_from_slice(&result[..DISCRIMINATOR_LEN]);
    disc
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    hashed_prefix("account", name)
}

pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    hashed_prefix("global", name)
}

/// An account type owned by the polls program.
pub trait ProgramAccount: BorshSerialize + BorshDeserialize + Sized {
    /// Account type name, used for the discriminator.
    const NAME: &'static str;

    /// Checks invariants the Borsh layout alone cannot express.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    fn decode(data: &[u8]) -> Result<Self, LedgerError> {
        let decode_err = |reason: String| LedgerError::Decode {
            kind: Self::NAME,
            reason,
        };

        if data.len() < DISCRIMINATOR_LEN {
            return Err(decode_err(format!("account data too short ({} bytes)", data.len())));
        }
        let (disc, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if disc != account_discriminator(Self::NAME) {
            return Err(decode_err("discriminator mismatch".to_string()));
        }

        // Accounts may be allocated larger than their body; trailing bytes are ignored.
        let account = Self::deserialize(&mut body).map_err(|e| decode_err(e.to_string()))?;
        account.check().map_err(decode_err)?;
        Ok(account)
    }

    fn encode(&self) -> Vec<u8> {
        let mut data = account_discriminator(Self::NAME).to_vec();
        // Writing into a Vec cannot fail.
        let _ = self.serialize(&mut data);
        data
    }
}

/// A poll with its per-option tallies
#[derive(BorshSerialize, BorshDeserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Creator-chosen identifier, part of the poll PDA seeds
    pub poll_id: u64,
    /// Community the poll belongs to
    #[serde(serialize_with = "serialize_address")]
    pub community: Pubkey,
    /// Wallet that created the poll
    #[serde(serialize_with = "serialize_address")]
    pub created_by: Pubkey,
    /// Question content reference
    pub question_uri: String,
    /// Option references; members or content-addressed text options
    #[serde(serialize_with = "serialize_addresses")]
    pub option_profiles: Vec<Pubkey>,
    /// Vote tally per option, same order as `option_profiles`
    pub votes_per_option: Vec<u64>,
    /// Unix seconds after which voting is closed
    pub end_time: i64,
    /// Unix seconds at creation
    pub created_at: i64,
    /// Bump seed for the poll PDA
    pub bump: u8,
}

impl ProgramAccount for Poll {
    const NAME: &'static str = "Poll";

    fn check(&self) -> Result<(), String> {
        if self.votes_per_option.len() != self.option_profiles.len() {
            return Err(format!(
                "{} vote counters for {} options",
                self.votes_per_option.len(),
                self.option_profiles.len()
            ));
        }
        Ok(())
    }
}

/// A community polls are scoped to
#[derive(BorshSerialize, BorshDeserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    #[serde(serialize_with = "serialize_address")]
    pub authority: Pubkey,
    pub name: String,
    pub member_count: u64,
    pub bump: u8,
}

impl ProgramAccount for Community {
    const NAME: &'static str = "Community";
}

/// A user's public profile, one per wallet
#[derive(BorshSerialize, BorshDeserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(serialize_with = "serialize_address")]
    pub owner: Pubkey,
    pub display_name: String,
    pub avatar_uri: String,
    pub bump: u8,
}

impl ProgramAccount for Profile {
    const NAME: &'static str = "Profile";
}

/// Membership of one user in one community
#[derive(BorshSerialize, BorshDeserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(serialize_with = "serialize_address")]
    pub community: Pubkey,
    #[serde(serialize_with = "serialize_address")]
    pub user: Pubkey,
    pub joined_at: i64,
    pub bump: u8,
}

impl ProgramAccount for Member {
    const NAME: &'static str = "Member";
}

/// A decoded account together with its address.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Keyed<T> {
    #[serde(serialize_with = "serialize_address")]
    pub address: Pubkey,
    pub account: T,
}

impl<T> Keyed<T> {
    pub fn new(address: Pubkey, account: T) -> Self {
        Self { address, account }
    }
}

pub fn profile_address(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PROFILE_SEED, owner.as_ref()], program_id)
}

pub fn member_address(community: &Pubkey, user: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[MEMBER_SEED, community.as_ref(), user.as_ref()], program_id)
}

pub fn poll_address(community: &Pubkey, poll_id: u64, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[POLL_SEED, community.as_ref(), &poll_id.to_le_bytes()],
        program_id,
    )
}

/// Content-addressed reference for a free-text option label.
pub fn text_option_address(community: &Pubkey, label: &str, program_id: &Pubkey) -> (Pubkey, u8) {
    let label_hash: [u8; 32] = Sha256::digest(label.as_bytes()).into();
    Pubkey::find_program_address(
        &[POLL_OPTION_SEED, community.as_ref(), &label_hash],
        program_id,
    )
}

pub(crate) fn serialize_address<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(key)
}

pub(crate) fn serialize_addresses<S: Serializer>(keys: &[Pubkey], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(keys.iter().map(|key| key.to_string()))
}
