//! Cache registry - central management for all caches.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{CacheConfig, TypedCache};

/// Registry of named, typed caches.
///
/// Repositories ask for their caches by name so that two handles to the same
/// name share entries.
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Type-erased registry slot.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl CacheRegistry {
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the cache registered under `name`, creating it from `config` if absent.
    ///
    /// A name already taken by a cache of other types yields a private,
    /// unregistered cache.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(entry) = caches.get(name) {
            if let Some(cache) = entry.cache.downcast_ref::<TypedCache<K, V>>() {
                return cache.clone();
            }
            warn!("Cache '{}' already holds {}, using a private cache", name, entry.type_name);
            return TypedCache::new(name, config);
        }

        debug!("Creating cache: {}", name);
        let cache = TypedCache::new(name, config);
        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );
        cache
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}
