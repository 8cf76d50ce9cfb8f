use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use litesvm::LiteSVM;
use polls_client::state::{
    member_address, profile_address, Community, Keyed, Member, Poll, Profile, ProgramAccount,
};
use polls_client::{CreatePollRequest, LedgerError, LedgerReader, LedgerWriter, TransactionSignature};
use solana_account::Account;
use solana_keypair::Keypair;
use solana_native_token::LAMPORTS_PER_SOL;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use tokio::sync::Barrier;

/// Fixed evaluation time for tests, unix seconds (2025-01-01T00:00:00Z).
pub const NOW: i64 = 1_735_689_600;
pub const HOUR: i64 = 3_600;

/// Ledger fixture that keeps program accounts in a LiteSVM instance and
/// reads them back through the client's decoder.
///
/// LiteSVM has no program-account scan, so the fixture remembers which
/// addresses hold polls and memberships.
pub struct FixtureLedger {
    svm: RefCell<LiteSVM>,
    program_id: Pubkey,
    polls: RefCell<Vec<Pubkey>>,
    members: RefCell<HashMap<Pubkey, Vec<Pubkey>>>,
    failing_profiles: RefCell<HashSet<Pubkey>>,
    failing_communities: RefCell<HashSet<Pubkey>>,
    fail_listing: Cell<bool>,
    reject_create: RefCell<Option<LedgerError>>,
    poll_listings: Cell<usize>,
    create_requests: RefCell<Vec<CreatePollRequest>>,
    clock: Cell<i64>,
}

impl Default for FixtureLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureLedger {
    pub fn new() -> Self {
        Self {
            svm: RefCell::new(LiteSVM::new()),
            program_id: Pubkey::new_unique(),
            polls: RefCell::new(Vec::new()),
            members: RefCell::new(HashMap::new()),
            failing_profiles: RefCell::new(HashSet::new()),
            failing_communities: RefCell::new(HashSet::new()),
            fail_listing: Cell::new(false),
            reject_create: RefCell::new(None),
            poll_listings: Cell::new(0),
            create_requests: RefCell::new(Vec::new()),
            clock: Cell::new(NOW),
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn store<T: ProgramAccount>(&self, address: Pubkey, account: &T) {
        self.svm
            .borrow_mut()
            .set_account(
                address,
                Account {
                    lamports: LAMPORTS_PER_SOL,
                    data: account.encode(),
                    owner: self.program_id,
                    executable: false,
                    rent_epoch: 0,
                },
            )
            .expect("Failed to store account");
    }

    fn load<T: ProgramAccount>(&self, address: &Pubkey) -> Result<T, LedgerError> {
        let account = self
            .svm
            .borrow()
            .get_account(address)
            .ok_or_else(|| LedgerError::NotFound {
                kind: T::NAME,
                address: address.to_string(),
            })?;
        T::decode(&account.data)
    }

    pub fn add_community(&self, name: &str) -> Pubkey {
        let address = Keypair::new().pubkey();
        self.store(
            address,
            &Community {
                authority: Pubkey::new_unique(),
                name: name.to_string(),
                member_count: 0,
                bump: 255,
            },
        );
        self.members.borrow_mut().entry(address).or_default();
        address
    }

    pub fn add_profile(&self, owner: &Pubkey, display_name: &str) -> Pubkey {
        let (address, bump) = profile_address(owner, &self.program_id);
        self.store(
            address,
            &Profile {
                owner: *owner,
                display_name: display_name.to_string(),
                avatar_uri: String::new(),
                bump,
            },
        );
        address
    }

    pub fn add_member(&self, community: &Pubkey, user: &Pubkey) -> Pubkey {
        let (address, bump) = member_address(community, user, &self.program_id);
        self.store(
            address,
            &Member {
                community: *community,
                user: *user,
                joined_at: NOW - HOUR,
                bump,
            },
        );
        self.members
            .borrow_mut()
            .entry(*community)
            .or_default()
            .push(address);
        address
    }

    pub fn add_poll(&self, poll: Poll) -> Pubkey {
        let address = Pubkey::new_unique();
        self.store(address, &poll);
        self.polls.borrow_mut().push(address);
        address
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.set(fail);
    }

    pub fn fail_profile(&self, owner: &Pubkey) {
        self.failing_profiles.borrow_mut().insert(*owner);
    }

    pub fn fail_community(&self, community: &Pubkey) {
        self.failing_communities.borrow_mut().insert(*community);
    }

    pub fn reject_create(&self, error: Option<LedgerError>) {
        *self.reject_create.borrow_mut() = error;
    }

    pub fn set_clock(&self, now: i64) {
        self.clock.set(now);
    }

    pub fn poll_listings(&self) -> usize {
        self.poll_listings.get()
    }

    pub fn create_requests(&self) -> Vec<CreatePollRequest> {
        self.create_requests.borrow().clone()
    }
}

pub fn poll(community: Pubkey, creator: Pubkey, question: &str, votes: &[u64], end_time: i64, created_at: i64) -> Poll {
    Poll {
        poll_id: created_at as u64,
        community,
        created_by: creator,
        question_uri: question.to_string(),
        option_profiles: votes.iter().map(|_| Pubkey::new_unique()).collect(),
        votes_per_option: votes.to_vec(),
        end_time,
        created_at,
        bump: 255,
    }
}

#[async_trait(?Send)]
impl LedgerReader for FixtureLedger {
    async fn fetch_all_polls(&self) -> Result<Vec<Keyed<Poll>>, LedgerError> {
        self.poll_listings.set(self.poll_listings.get() + 1);
        tokio::task::yield_now().await;

        if self.fail_listing.get() {
            return Err(LedgerError::Transport("connection reset by peer".to_string()));
        }
        let addresses = self.polls.borrow().clone();
        addresses
            .into_iter()
            .map(|address| Ok(Keyed::new(address, self.load::<Poll>(&address)?)))
            .collect()
    }

    async fn fetch_community(&self, community: &Pubkey) -> Result<Community, LedgerError> {
        tokio::task::yield_now().await;
        if self.failing_communities.borrow().contains(community) {
            return Err(LedgerError::Transport("request timed out".to_string()));
        }
        self.load(community)
    }

    async fn fetch_profile(&self, owner: &Pubkey) -> Result<Profile, LedgerError> {
        tokio::task::yield_now().await;
        if self.failing_profiles.borrow().contains(owner) {
            return Err(LedgerError::Transport("request timed out".to_string()));
        }
        let (address, _) = profile_address(owner, &self.program_id);
        self.load(&address)
    }

    async fn fetch_community_members(
        &self,
        community: &Pubkey,
    ) -> Result<Vec<Keyed<Member>>, LedgerError> {
        tokio::task::yield_now().await;
        let addresses = self
            .members
            .borrow()
            .get(community)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound {
                kind: Community::NAME,
                address: community.to_string(),
            })?;
        addresses
            .into_iter()
            .map(|address| Ok(Keyed::new(address, self.load::<Member>(&address)?)))
            .collect()
    }
}

#[async_trait(?Send)]
impl LedgerWriter for FixtureLedger {
    /// Records the request and, unless a rejection is armed, stores the
    /// poll the program would have created.
    async fn create_poll(
        &self,
        request: &CreatePollRequest,
    ) -> Result<TransactionSignature, LedgerError> {
        self.create_requests.borrow_mut().push(request.clone());
        tokio::task::yield_now().await;

        if let Some(err) = self.reject_create.borrow().clone() {
            return Err(err);
        }

        let address = request.poll_address(&self.program_id);
        self.store(
            address,
            &Poll {
                poll_id: request.poll_id,
                community: request.community,
                created_by: request.creator,
                question_uri: request.question.clone(),
                option_profiles: request.options.clone(),
                votes_per_option: vec![0; request.options.len()],
                end_time: request.end_time,
                created_at: self.clock.get(),
                bump: 255,
            },
        );
        self.polls.borrow_mut().push(address);

        Ok(TransactionSignature(format!(
            "sig-{}",
            self.create_requests.borrow().len()
        )))
    }
}

/// Wraps a [`FixtureLedger`] so that lookups for the listed keys (community
/// addresses or profile owners) only complete once every one of them has
/// started. A caller that awaits those lookups one at a time never finishes.
pub struct RendezvousLedger<'a> {
    inner: &'a FixtureLedger,
    keys: HashSet<Pubkey>,
    barrier: Barrier,
}

impl<'a> RendezvousLedger<'a> {
    pub fn new(inner: &'a FixtureLedger, keys: &[Pubkey]) -> Self {
        let keys: HashSet<Pubkey> = keys.iter().copied().collect();
        let barrier = Barrier::new(keys.len());
        Self {
            inner,
            keys,
            barrier,
        }
    }

    async fn meet(&self, key: &Pubkey) {
        if self.keys.contains(key) {
            self.barrier.wait().await;
        }
    }
}

#[async_trait(?Send)]
impl LedgerReader for RendezvousLedger<'_> {
    async fn fetch_all_polls(&self) -> Result<Vec<Keyed<Poll>>, LedgerError> {
        self.inner.fetch_all_polls().await
    }

    async fn fetch_community(&self, community: &Pubkey) -> Result<Community, LedgerError> {
        self.meet(community).await;
        self.inner.fetch_community(community).await
    }

    async fn fetch_profile(&self, owner: &Pubkey) -> Result<Profile, LedgerError> {
        self.meet(owner).await;
        self.inner.fetch_profile(owner).await
    }

    async fn fetch_community_members(
        &self,
        community: &Pubkey,
    ) -> Result<Vec<Keyed<Member>>, LedgerError> {
        self.inner.fetch_community_members(community).await
    }
}
