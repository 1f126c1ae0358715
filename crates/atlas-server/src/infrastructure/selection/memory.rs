use std::time::{Duration, Instant};

use async_trait::async_trait;
use atlas_core::core_types::{AssetId, SelectionToken};
use atlas_core::error::CoreError;
use atlas_core::selection_cache_key;
use dashmap::DashMap;

use crate::application::ports::selection::SelectionCache;

struct Entry {
    asset_ids: Vec<AssetId>,
    expires_at: Instant,
}

/// 进程内选择缓存；条目在 `now >= expires_at` 时视为过期
pub struct MemorySelectionCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl MemorySelectionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清理所有过期条目
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }
}

#[async_trait]
impl SelectionCache for MemorySelectionCache {
    async fn get(&self, token: &SelectionToken) -> Result<Option<Vec<AssetId>>, CoreError> {
        let key = selection_cache_key(token.as_str());
        let now = Instant::now();

        let hit = self.entries.get(&key).map(|entry| {
            if now >= entry.expires_at {
                None
            } else {
                Some(entry.asset_ids.clone())
            }
        });

        match hit {
            Some(Some(ids)) => Ok(Some(ids)),
            Some(None) => {
                // 读锁已释放后再删除
                self.entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, asset_ids: &[AssetId]) -> Result<SelectionToken, CoreError> {
        self.purge_expired();

        let token = SelectionToken::generate();
        self.entries.insert(
            selection_cache_key(token.as_str()),
            Entry {
                asset_ids: asset_ids.to_vec(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_preserves_order() {
        let cache = MemorySelectionCache::new(Duration::from_secs(60));
        let ids = vec![AssetId::from("b"), AssetId::from("a"), AssetId::from("c")];
        let token = cache.put(&ids).await.unwrap();

        assert_eq!(cache.get(&token).await.unwrap(), Some(ids));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_absent() {
        let cache = MemorySelectionCache::new(Duration::from_secs(60));
        assert_eq!(
            cache.get(&SelectionToken::from("missing")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_removed() {
        let cache = MemorySelectionCache::new(Duration::from_millis(10));
        let token = cache.put(&[AssetId::from("a")]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get(&token).await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemorySelectionCache::new(Duration::ZERO);
        let token = cache.put(&[AssetId::from("a")]).await.unwrap();
        assert_eq!(cache.get(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tokens_are_distinct() {
        let cache = MemorySelectionCache::new(Duration::from_secs(60));
        let t1 = cache.put(&[AssetId::from("a")]).await.unwrap();
        let t2 = cache.put(&[AssetId::from("b")]).await.unwrap();
        assert_ne!(t1, t2);
        assert_eq!(cache.get(&t2).await.unwrap(), Some(vec![AssetId::from("b")]));
    }
}
