//! Runtime settings read from the environment
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the process environment take precedence.

use crate::clients::{DEFAULT_BASE_URL, DEFAULT_PROBE_TIMEOUT};
use crate::contexts::DEFAULT_WORKERS;
use crate::data::ItemId;
use anyhow::{Context, Result, bail};
use std::time::Duration;

const CONSUMER_KEY: &str = "CONSUMER_KEY";
const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
const POCKET_API_URL: &str = "POCKET_API_URL";
const SWEEP_WORKERS: &str = "SWEEP_WORKERS";
const PROBE_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
const CACHE_TTL_SECS: &str = "CACHE_TTL_SECS";
const DEAD_LINK_SKIP: &str = "DEAD_LINK_SKIP";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub consumer_key: String,
    pub access_token: String,
    pub api_url: String,
    pub workers: usize,
    pub probe_timeout: Duration,
    /// How long the favorites list is served from the cache
    pub cache_ttl: Duration,
    /// Item ids the dead-link sweep leaves alone
    pub skip: Vec<ItemId>,
}

impl Settings {
    /// Load settings from `.env` (if any) and the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{} is required", name))
        };

        let workers = parse_number(&lookup, SWEEP_WORKERS)?.unwrap_or(DEFAULT_WORKERS as u64);
        if workers == 0 {
            bail!("{} must be at least 1", SWEEP_WORKERS);
        }

        let probe_timeout = match parse_number(&lookup, PROBE_TIMEOUT_SECS)? {
            Some(0) => bail!("{} must be at least 1", PROBE_TIMEOUT_SECS),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_PROBE_TIMEOUT,
        };

        let cache_ttl = parse_number(&lookup, CACHE_TTL_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Ok(Self {
            consumer_key: required(CONSUMER_KEY)?,
            access_token: required(ACCESS_TOKEN)?,
            api_url: lookup(POCKET_API_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            workers: usize::try_from(workers)
                .with_context(|| format!("{} is too large", SWEEP_WORKERS))?,
            probe_timeout,
            cache_ttl,
            skip: lookup(DEAD_LINK_SKIP).map(|ids| parse_id_list(&ids)).unwrap_or_default(),
        })
    }
}

fn parse_number<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", name, value)),
        None => Ok(None),
    }
}

/// Split a comma separated id list, ignoring blanks
pub fn parse_id_list(ids: &str) -> Vec<ItemId> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ItemId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[(CONSUMER_KEY, "ck"), (ACCESS_TOKEN, "at")]).unwrap();

        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.probe_timeout, Duration::from_secs(30));
        assert_eq!(settings.cache_ttl, Duration::from_secs(3600));
        assert!(settings.skip.is_empty());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            (CONSUMER_KEY, "ck"),
            (ACCESS_TOKEN, "at"),
            (POCKET_API_URL, "http://localhost:8080"),
            (SWEEP_WORKERS, "8"),
            (PROBE_TIMEOUT_SECS, "5"),
            (CACHE_TTL_SECS, "60"),
            (DEAD_LINK_SKIP, "274841724, 758026316,,"),
        ])
        .unwrap();

        assert_eq!(settings.api_url, "http://localhost:8080");
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.probe_timeout, Duration::from_secs(5));
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(
            settings.skip,
            vec![ItemId::new("274841724"), ItemId::new("758026316")]
        );
    }

    #[test]
    fn test_missing_credentials() {
        let err = settings(&[(CONSUMER_KEY, "ck")]).unwrap_err();
        assert!(err.to_string().contains(ACCESS_TOKEN));

        let err = settings(&[(CONSUMER_KEY, ""), (ACCESS_TOKEN, "at")]).unwrap_err();
        assert!(err.to_string().contains(CONSUMER_KEY));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = settings(&[(CONSUMER_KEY, "ck"), (ACCESS_TOKEN, "at"), (SWEEP_WORKERS, "four")])
            .unwrap_err();
        assert!(err.to_string().contains(SWEEP_WORKERS));

        let err = settings(&[(CONSUMER_KEY, "ck"), (ACCESS_TOKEN, "at"), (SWEEP_WORKERS, "0")])
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err = settings(&[(CONSUMER_KEY, "ck"), (ACCESS_TOKEN, "at"), (PROBE_TIMEOUT_SECS, "0")])
            .unwrap_err();
        assert!(err.to_string().contains(PROBE_TIMEOUT_SECS));
    }
}
