//! Ledger accessor contract
//!
//! The polls pipeline consumes the ledger only through these two traits.
//! A read-only accessor is always available; the signing-capable writer
//! exists only while a wallet is connected.

use std::fmt;

use async_trait::async_trait;
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::error::LedgerError;
use crate::state::{instruction_discriminator, poll_address, Community, Keyed, Member, Poll, Profile};

/// Read side of the ledger.
///
/// Implementations may be slow and may fail; callers decide which
/// failures are fatal. Futures are not required to be `Send`, the
/// pipeline runs on a single-threaded event loop.
#[async_trait(?Send)]
pub trait LedgerReader {
    /// Every poll account owned by the program, in a single request.
    async fn fetch_all_polls(&self) -> Result<Vec<Keyed<Poll>>, LedgerError>;

    async fn fetch_community(&self, community: &Pubkey) -> Result<Community, LedgerError>;

    /// Profile owned by `owner` (not the profile address itself).
    async fn fetch_profile(&self, owner: &Pubkey) -> Result<Profile, LedgerError>;

    async fn fetch_community_members(
        &self,
        community: &Pubkey,
    ) -> Result<Vec<Keyed<Member>>, LedgerError>;
}

/// Signing-capable side of the ledger.
#[async_trait(?Send)]
pub trait LedgerWriter {
    /// Signs and submits a single poll-creation transaction.
    async fn create_poll(
        &self,
        request: &CreatePollRequest,
    ) -> Result<TransactionSignature, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature(pub String);

impl fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Instruction arguments in program order
#[derive(BorshSerialize)]
struct CreatePollArgs<'a> {
    poll_id: u64,
    question: &'a str,
    option_profiles: &'a [Pubkey],
    end_time: i64,
}

/// A fully assembled poll-creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePollRequest {
    /// Wallet the poll is attributed to; signs and pays
    pub creator: Pubkey,
    pub community: Pubkey,
    pub poll_id: u64,
    pub question: String,
    pub options: Vec<Pubkey>,
    /// Unix seconds
    pub end_time: i64,
}

impl CreatePollRequest {
    pub fn new(
        creator: Pubkey,
        community: Pubkey,
        question: String,
        options: Vec<Pubkey>,
        end_time: i64,
    ) -> Self {
        let poll_id = derive_poll_id(&creator, &community, &question, &options, end_time);
        Self {
            creator,
            community,
            poll_id,
            question,
            options,
            end_time,
        }
    }

    pub fn poll_address(&self, program_id: &Pubkey) -> Pubkey {
        poll_address(&self.community, self.poll_id, program_id).0
    }

    pub fn instruction_data(&self) -> Vec<u8> {
        let args = CreatePollArgs {
            poll_id: self.poll_id,
            question: &self.question,
            option_profiles: &self.options,
            end_time: self.end_time,
        };
        let mut data = instruction_discriminator("create_poll").to_vec();
        // Writing into a Vec cannot fail.
        let _ = args.serialize(&mut data);
        data
    }

    pub fn instruction(&self, program_id: &Pubkey) -> Instruction {
        Instruction {
            program_id: *program_id,
            accounts: vec![
                AccountMeta::new(self.creator, true),
                AccountMeta::new_readonly(self.community, false),
                AccountMeta::new(self.poll_address(program_id), false),
                AccountMeta::new_readonly(solana_sdk_ids::system_program::ID, false),
            ],
            data: self.instruction_data(),
        }
    }
}

/// Poll ids are derived from the request content, so resubmitting the same
/// draft targets the same poll address.
pub fn derive_poll_id(
    creator: &Pubkey,
    community: &Pubkey,
    question: &str,
    options: &[Pubkey],
    end_time: i64,
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(creator.as_ref());
    hasher.update(community.as_ref());
    hasher.update((question.len() as u64).to_le_bytes());
    hasher.update(question.as_bytes());
    hasher.update((options.len() as u64).to_le_bytes());
    for option in options {
        hasher.update(option.as_ref());
    }
    hasher.update(end_time.to_le_bytes());
    let digest = hasher.finalize();
    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(id)
}
