//! Fuzz test for the poll collection pipeline
//!
//! Generates random poll collections and checks the properties the view
//! relies on: derived fields match an independent oracle, the collection
//! is ordered newest first, and filtering never grows the collection.

use polls_client::enrich::{sort_newest_first, EnrichedPoll};
use polls_client::filter::{filter_polls, Category};
use polls_client::state::{Keyed, Poll};
use solana_pubkey::Pubkey;

const CATEGORIES: [Category; 5] = [
    Category::All,
    Category::Active,
    Category::Ended,
    Category::Mine,
    Category::Community,
];

const SEARCHES: [&str; 5] = ["", "vote", "VOTE", "q1", "zz"];

/// Fuzz data - the inputs we're randomizing
#[derive(Debug, Clone)]
pub struct CollectionFuzzData {
    /// Evaluation time
    pub now: i64,
    /// (end_time, created_at, votes, question) per poll
    pub polls: Vec<(i64, i64, Vec<u64>, String)>,
    /// Index of the poll whose creator acts as caller
    pub caller_index: usize,
}

impl CollectionFuzzData {
    pub fn from_seed(seed: u64) -> Self {
        let mut state = seed;
        let mut next = || {
            state = rand_u64(state);
            state
        };

        let now = (next() % 2_000_000_000) as i64;
        let len = (next() % 12) as usize;
        let polls = (0..len)
            .map(|i| {
                // Keep end times close to `now` so the boundary is hit often.
                let end_time = now + (next() % 5) as i64 - 2;
                let created_at = (next() % 4) as i64;
                let options = (next() % 6) as usize;
                let votes = (0..options)
                    .map(|_| if next() % 7 == 0 { u64::MAX } else { next() % 1_000 })
                    .collect();
                let question = if next() % 2 == 0 {
                    format!("Vote q{i}")
                } else {
                    format!("q{i}")
                };
                (end_time, created_at, votes, question)
            })
            .collect();

        Self {
            now,
            polls,
            caller_index: next() as usize,
        }
    }

    fn build(&self) -> (Vec<EnrichedPoll>, Option<Pubkey>) {
        let creators: Vec<_> = self.polls.iter().map(|_| Pubkey::new_unique()).collect();
        let polls = self
            .polls
            .iter()
            .zip(&creators)
            .map(|((end_time, created_at, votes, question), creator)| {
                EnrichedPoll::derive(
                    Keyed::new(
                        Pubkey::new_unique(),
                        Poll {
                            poll_id: 0,
                            community: Pubkey::new_unique(),
                            created_by: *creator,
                            question_uri: question.clone(),
                            option_profiles: votes.iter().map(|_| Pubkey::new_unique()).collect(),
                            votes_per_option: votes.clone(),
                            end_time: *end_time,
                            created_at: *created_at,
                            bump: 0,
                        },
                    ),
                    self.now,
                )
            })
            .collect();
        let caller = creators.get(self.caller_index % creators.len().max(1)).copied();
        (polls, caller)
    }
}

/// Property: derived fields agree with a u128 oracle and the strict
/// end-time comparison
fn check_derived_fields(data: &CollectionFuzzData) -> bool {
    let (polls, _) = data.build();
    polls.iter().all(|p| {
        let oracle: u128 = p.poll.votes_per_option.iter().map(|&v| v as u128).sum();
        let expected_total = u64::try_from(oracle).unwrap_or(u64::MAX);
        p.total_votes == expected_total && p.is_active == (p.poll.end_time > data.now)
    })
}

/// Property: ordering is newest first and keeps every poll
fn check_ordering(data: &CollectionFuzzData) -> bool {
    let (mut polls, _) = data.build();
    let before = polls.len();
    sort_newest_first(&mut polls);
    polls.len() == before
        && polls
            .windows(2)
            .all(|pair| pair[0].poll.created_at >= pair[1].poll.created_at)
}

/// Property: every category/search combination returns a subset of the
/// input
fn check_narrowing(data: &CollectionFuzzData) -> bool {
    let (polls, caller) = data.build();
    CATEGORIES.iter().all(|&category| {
        SEARCHES.iter().all(|search| {
            [None, caller.as_ref()].iter().all(|caller| {
                let hits = filter_polls(&polls, category, search, *caller);
                hits.len() <= polls.len()
                    && hits.iter().all(|hit| polls.iter().any(|p| std::ptr::eq(p, *hit)))
            })
        })
    })
}

/// splitmix64
fn rand_u64(seed: u64) -> u64 {
    let mut x = seed.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_end_time_is_ended() {
        let data = CollectionFuzzData {
            now: 100,
            polls: vec![(100, 0, vec![1], "q".to_string()), (101, 0, vec![], "q".to_string())],
            caller_index: 0,
        };
        let (polls, _) = data.build();
        assert!(!polls[0].is_active);
        assert!(polls[1].is_active);
        assert!(check_derived_fields(&data));
    }

    #[test]
    fn test_saturating_total() {
        let data = CollectionFuzzData {
            now: 0,
            polls: vec![(1, 0, vec![u64::MAX, u64::MAX, 3], "q".to_string())],
            caller_index: 0,
        };
        assert!(check_derived_fields(&data));
    }

    #[test]
    fn test_empty_collection() {
        let data = CollectionFuzzData {
            now: 0,
            polls: vec![],
            caller_index: 3,
        };
        assert!(check_ordering(&data));
        assert!(check_narrowing(&data));
    }

    #[test]
    fn test_random_fuzz_iterations() {
        for i in 0..1000 {
            let data = CollectionFuzzData::from_seed(i);
            assert!(check_derived_fields(&data), "derived fields failed for iteration {}: {:?}", i, data);
            assert!(check_ordering(&data), "ordering failed for iteration {}: {:?}", i, data);
            assert!(check_narrowing(&data), "narrowing failed for iteration {}: {:?}", i, data);
        }
        println!("All 1000 random iterations passed!");
    }
}

fn main() {
    println!("Poll Collection Fuzz Test");
    println!("=========================");

    let seed = time_seed();
    let iterations = 10_000u64;
    for i in 0..iterations {
        let data = CollectionFuzzData::from_seed(seed.wrapping_add(i));
        if !(check_derived_fields(&data) && check_ordering(&data) && check_narrowing(&data)) {
            println!("Property violated for seed {}: {:?}", seed.wrapping_add(i), data);
            std::process::exit(1);
        }
    }
    println!("{} iterations passed (base seed {})", iterations, seed);
}
