//! Environment configuration

use std::env;

use solana_pubkey::Pubkey;
use tracing::{info, warn};

use crate::error::{PollsError, Result};

pub const PROGRAM_ID_VAR: &str = "POLLS_PROGRAM_ID";
pub const LOG_FILTER_VAR: &str = "POLLS_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Polls program the accounts and PDAs belong to
    pub program_id: Pubkey,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Config {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_id = lookup(PROGRAM_ID_VAR).ok_or_else(|| {
            warn!("Environment variable {PROGRAM_ID_VAR} not found");
            PollsError::Config(format!("{PROGRAM_ID_VAR} is not set"))
        })?;
        let program_id = raw_id.trim().parse::<Pubkey>().map_err(|e| {
            warn!("Invalid {PROGRAM_ID_VAR} value: {e}");
            PollsError::Config(format!("{PROGRAM_ID_VAR} is not a valid address: {e}"))
        })?;

        let log_filter = lookup(LOG_FILTER_VAR).unwrap_or_else(|| {
            info!("{LOG_FILTER_VAR} not set, using default: {DEFAULT_LOG_FILTER}");
            DEFAULT_LOG_FILTER.to_string()
        });

        Ok(Self {
            program_id,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn loads_program_id_and_default_filter() {
        let program_id = Pubkey::new_unique();
        let config = Config::from_lookup(lookup(&[(PROGRAM_ID_VAR, &program_id.to_string())])).unwrap();
        assert_eq!(config, Config::new(program_id));
    }

    #[test]
    fn custom_log_filter() {
        let program_id = Pubkey::new_unique().to_string();
        let config = Config::from_lookup(lookup(&[
            (PROGRAM_ID_VAR, &program_id),
            (LOG_FILTER_VAR, "polls_client=debug"),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "polls_client=debug");
    }

    #[test]
    fn missing_or_bad_program_id_is_an_error() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(PollsError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(PROGRAM_ID_VAR, "xyz")])),
            Err(PollsError::Config(_))
        ));
    }
}
