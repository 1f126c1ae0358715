use std::time::Duration;

use anyhow::Result;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use atlas_core::core_types::{AssetId, SelectionToken};
use atlas_core::error::CoreError;
use atlas_core::{selection_cache_key, JS_KV_SELECTIONS};
use tracing::info;

use crate::application::ports::selection::SelectionCache;

fn map_nats_err<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Nats {
        message: e.to_string(),
    }
}

/// 基于 JetStream KV 的选择缓存，过期由桶的 `max_age` 负责
pub struct NatsSelectionCache {
    store: kv::Store,
}

impl NatsSelectionCache {
    /// 打开选择缓存桶，不存在则创建
    pub async fn new(js: &async_nats::jetstream::Context, ttl: Duration) -> Result<Self> {
        let store = match js.get_key_value(JS_KV_SELECTIONS).await {
            Ok(store) => store,
            Err(_) => {
                info!(
                    "Creating KV bucket {} with TTL: {}s",
                    JS_KV_SELECTIONS,
                    ttl.as_secs()
                );
                js.create_key_value(kv::Config {
                    bucket: JS_KV_SELECTIONS.to_string(),
                    description: "Bulk asset selections (TTL-based cleanup)".to_string(),
                    max_age: ttl,
                    history: 1,
                    ..Default::default()
                })
                .await?
            }
        };
        Ok(Self { store })
    }
}

#[async_trait]
impl SelectionCache for NatsSelectionCache {
    async fn get(&self, token: &SelectionToken) -> Result<Option<Vec<AssetId>>, CoreError> {
        let key = selection_cache_key(token.as_str());
        match self.store.get(&key).await.map_err(map_nats_err)? {
            Some(bytes) => {
                let ids: Vec<AssetId> = serde_json::from_slice(&bytes)?;
                Ok(Some(ids))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, asset_ids: &[AssetId]) -> Result<SelectionToken, CoreError> {
        let token = SelectionToken::generate();
        let payload = serde_json::to_vec(asset_ids)?;
        self.store
            .put(selection_cache_key(token.as_str()), payload.into())
            .await
            .map_err(map_nats_err)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_errors_map_to_nats_variant() {
        match map_nats_err("bucket not found") {
            CoreError::Nats { message } => assert_eq!(message, "bucket not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
