//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Entries are evicted this long after insertion.
    pub ttl: Option<Duration>,

    /// Entries are evicted if not read within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Last-seen records: touched on every message, rarely read back.
    pub fn identity() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(3600)), // 1 hour
            tti: None,
        }
    }

    /// Players are resolved on nearly every command and change on profile
    /// forwards and admin actions, so keep them briefly.
    pub fn hot_data() -> Self {
        Self {
            max_capacity: 20_000,
            ttl: Some(Duration::from_secs(60)),
            tti: Some(Duration::from_secs(30)),
        }
    }

    /// Chat flags change only through admin commands.
    pub fn cold_data() -> Self {
        Self {
            max_capacity: 5_000,
            ttl: Some(Duration::from_secs(600)), // 10 minutes
            tti: None,
        }
    }
}
