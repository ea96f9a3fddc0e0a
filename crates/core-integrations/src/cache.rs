//! Process-local TTL cache for cacheable read-only dispatcher calls (§4.3).
//!
//! Not authoritative, never invalidated on writes — staleness is bounded
//! purely by the per-entry TTL.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use uuid::Uuid;

#[derive(Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct CacheKey {
    app: &'static str,
    user_id: Uuid,
    method: &'static str,
}

pub struct TtlCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, app: &'static str, user_id: Uuid, method: &'static str) -> Option<serde_json::Value> {
        let key = CacheKey { app, user_id, method };
        let entries = self.entries.read().unwrap();
        let entry = entries.get(&key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(
        &self,
        app: &'static str,
        user_id: Uuid,
        method: &'static str,
        value: serde_json::Value,
        ttl: Duration,
    ) {
        let key = CacheKey { app, user_id, method };
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_before_set() {
        let cache = TtlCache::new();
        assert!(cache.get("gmail", Uuid::new_v4(), "listLabels").is_none());
    }

    #[test]
    fn hit_within_ttl_miss_after_expiry() {
        let cache = TtlCache::new();
        let user_id = Uuid::new_v4();
        cache.set("slack", user_id, "listChannels", serde_json::json!([1, 2]), Duration::from_millis(20));
        assert!(cache.get("slack", user_id, "listChannels").is_some());
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("slack", user_id, "listChannels").is_none());
    }
}
