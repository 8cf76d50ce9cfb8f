//! Caller session snapshot

use solana_pubkey::Pubkey;

/// Immutable view of the wallet session, handed to each operation.
///
/// The owning collaborator builds a fresh snapshot whenever the wallet
/// connects, disconnects or switches accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub caller: Option<Pubkey>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn connected(caller: Pubkey) -> Self {
        Self {
            caller: Some(caller),
        }
    }

    pub fn caller(&self) -> Option<&Pubkey> {
        self.caller.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.caller.is_some()
    }
}
