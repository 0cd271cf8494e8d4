//! Short-lived image cache with TTL expiry.
//!
//! Entries expire after the TTL regardless of hits. Expiry is lazy: checked
//! on read, with a purge of stale entries on insert — no per-entry timers.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::fetcher::FetchedImage;

struct CacheEntry {
    image: FetchedImage,
    inserted_at: Instant,
}

pub struct ImageCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ImageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<FetchedImage> {
        let hit = self.entries.get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.image.clone())
            } else {
                None
            }
        });

        if hit.is_none() {
            self.entries
                .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        }

        hit
    }

    pub fn insert(&self, key: String, image: FetchedImage) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        self.entries.insert(
            key,
            CacheEntry {
                image,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> FetchedImage {
        FetchedImage {
            bytes: vec![1, 2, 3],
            mime: "image/png".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl() {
        let cache = ImageCache::new(Duration::from_secs(300));
        cache.insert("room".to_string(), image());

        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(cache.get("room").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = ImageCache::new(Duration::from_secs(300));
        cache.insert("room".to_string(), image());

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get("room").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn insert_purges_stale_entries() {
        let cache = ImageCache::new(Duration::from_secs(300));
        cache.insert("old".to_string(), image());

        tokio::time::advance(Duration::from_secs(301)).await;
        cache.insert("new".to_string(), image());

        assert_eq!(cache.len(), 1);
        assert!(cache.get("new").is_some());
    }

    #[tokio::test]
    async fn miss_on_unknown_key() {
        let cache = ImageCache::new(Duration::from_secs(300));
        assert!(cache.get("missing").is_none());
    }
}
