use std::sync::Arc;

use atlas_core::core_types::AssetId;
use atlas_core::error::CoreError;

use crate::application::ports::repositories::AssetRepository;
use crate::domain::models::Asset;

/// 删除资产用例（不可恢复，级联删除协议与关联行）
pub struct DeleteAssetUseCase {
    asset_repo: Arc<dyn AssetRepository>,
}

impl DeleteAssetUseCase {
    pub fn new(asset_repo: Arc<dyn AssetRepository>) -> Self {
        Self { asset_repo }
    }

    pub async fn execute(&self, id: &AssetId) -> Result<Asset, CoreError> {
        let asset = self.asset_repo.delete(id).await?;
        tracing::info!(asset_id = %asset.id, hostname = %asset.hostname, "asset deleted");
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forms::{AssetForm, AssetSubmission, ProtocolForm};
    use crate::application::ports::repositories::NodeRepository;
    use crate::application::use_cases::commands::CreateAssetUseCase;
    use crate::infrastructure::persistence::SqliteStore;

    #[tokio::test]
    async fn test_delete_cascades_protocols() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let asset = CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
            .execute(
                &AssetSubmission {
                    asset: AssetForm {
                        hostname: "old01".to_string(),
                        ip: "::1".to_string(),
                        nodes: vec![root.id.to_string()],
                        ..Default::default()
                    },
                    protocols: vec![
                        ProtocolForm::default_entry(),
                        ProtocolForm {
                            name: "vnc".to_string(),
                            port: Some(5900_i64.into()),
                        },
                    ],
                },
                None,
            )
            .await
            .unwrap();

        let deleted = DeleteAssetUseCase::new(store.clone())
            .execute(&asset.id)
            .await
            .unwrap();
        assert_eq!(deleted.hostname, "old01");

        assert!(matches!(
            store.get(&asset.id).await,
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(store.protocol_row_count().unwrap(), 0);
        // 节点本身不受影响
        assert!(store.find(&root.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let err = DeleteAssetUseCase::new(store)
            .execute(&AssetId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
