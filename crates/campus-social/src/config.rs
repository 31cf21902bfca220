//! Social layer configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the layer can run with zero
//! configuration for local development.

use std::time::Duration;

use campus_store::query::MAX_IN_VALUES;

use crate::constants::{
    DEFAULT_COMMENT_PAGE_SIZE, DEFAULT_FEED_PAGE_SIZE, DEFAULT_SEARCH_LIMIT,
    DEFAULT_STORE_TIMEOUT_MS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SocialConfig {
    /// Events per feed page.
    /// Env: `CAMPUS_FEED_PAGE_SIZE`
    pub feed_page_size: usize,

    /// Maximum number of search hits.
    /// Env: `CAMPUS_SEARCH_LIMIT`
    pub search_limit: usize,

    /// Comments per page.
    /// Env: `CAMPUS_COMMENT_PAGE_SIZE`
    pub comment_page_size: usize,

    /// Deadline applied to every store call.
    /// Env: `CAMPUS_STORE_TIMEOUT_MS`
    pub store_timeout: Duration,

    /// Values per `IN` filter; longer lists are split into several queries.
    /// Env: `CAMPUS_MAX_IN_VALUES`
    pub max_in_values: usize,

    /// Notify the creator's friends when a new event is posted.
    /// Env: `CAMPUS_NOTIFY_FRIENDS_ON_EVENT` (true/false)
    pub notify_friends_on_event: bool,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            feed_page_size: DEFAULT_FEED_PAGE_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
            comment_page_size: DEFAULT_COMMENT_PAGE_SIZE,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            max_in_values: MAX_IN_VALUES,
            notify_friends_on_event: true,
        }
    }
}

impl SocialConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(n) = parse_positive(&lookup, "CAMPUS_FEED_PAGE_SIZE") {
            config.feed_page_size = n;
        }
        if let Some(n) = parse_positive(&lookup, "CAMPUS_SEARCH_LIMIT") {
            config.search_limit = n;
        }
        if let Some(n) = parse_positive(&lookup, "CAMPUS_COMMENT_PAGE_SIZE") {
            config.comment_page_size = n;
        }
        if let Some(ms) = parse_positive(&lookup, "CAMPUS_STORE_TIMEOUT_MS") {
            config.store_timeout = Duration::from_millis(ms as u64);
        }
        if let Some(n) = parse_positive(&lookup, "CAMPUS_MAX_IN_VALUES") {
            if n <= MAX_IN_VALUES {
                config.max_in_values = n;
            } else {
                tracing::warn!(
                    value = n,
                    max = MAX_IN_VALUES,
                    "CAMPUS_MAX_IN_VALUES above store limit, using default"
                );
            }
        }
        if let Some(val) = lookup("CAMPUS_NOTIFY_FRIENDS_ON_EVENT") {
            config.notify_friends_on_event = val != "false" && val != "0";
        }

        config
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SocialConfig::default();
        assert_eq!(config.feed_page_size, 20);
        assert_eq!(config.max_in_values, 30);
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert!(config.notify_friends_on_event);
    }

    #[test]
    fn test_overrides() {
        let config = SocialConfig::from_lookup(lookup_from(&[
            ("CAMPUS_FEED_PAGE_SIZE", "5"),
            ("CAMPUS_STORE_TIMEOUT_MS", "250"),
            ("CAMPUS_NOTIFY_FRIENDS_ON_EVENT", "false"),
        ]));
        assert_eq!(config.feed_page_size, 5);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert!(!config.notify_friends_on_event);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = SocialConfig::from_lookup(lookup_from(&[
            ("CAMPUS_FEED_PAGE_SIZE", "zero"),
            ("CAMPUS_SEARCH_LIMIT", "0"),
            ("CAMPUS_MAX_IN_VALUES", "100"),
        ]));
        assert_eq!(config, SocialConfig::default());
    }
}
