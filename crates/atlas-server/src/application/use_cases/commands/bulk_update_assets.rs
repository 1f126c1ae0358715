use std::sync::Arc;

use atlas_core::core_types::AssetId;
use atlas_core::error::{CoreError, ValidationErrors};

use crate::application::forms::{BulkUpdateForm, ReferenceValidator};
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};

/// 批量更新资产用例
///
/// 所有校验在写入之前完成；写入在单个事务内覆盖全部所选资产，要么全部成功，要么全部不变。
pub struct BulkUpdateAssetsUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
}

impl BulkUpdateAssetsUseCase {
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        node_repo: Arc<dyn NodeRepository>,
        label_repo: Arc<dyn LabelRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
    ) -> Self {
        Self {
            asset_repo,
            node_repo,
            label_repo,
            directory_repo,
        }
    }

    /// 返回被更新的资产数量；补丁为空时不写入
    pub async fn execute(&self, form: &BulkUpdateForm) -> Result<usize, CoreError> {
        let mut errors = ValidationErrors::new();
        let (assets, patch) = form.clean(&mut errors);

        self.check_assets(&assets, &mut errors).await?;
        ReferenceValidator {
            nodes: self.node_repo.as_ref(),
            labels: self.label_repo.as_ref(),
            directory: self.directory_repo.as_ref(),
        }
        .check_patch(&patch, &mut errors)
        .await?;

        errors.into_result()?;

        if patch.is_empty() {
            tracing::info!(assets = assets.len(), "bulk update with empty patch, nothing to write");
            return Ok(0);
        }

        let updated = self.asset_repo.bulk_update(&assets, &patch).await?;
        tracing::info!(assets = updated, "bulk update applied");
        Ok(updated)
    }

    async fn check_assets(
        &self,
        assets: &[AssetId],
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if assets.is_empty() {
            return Ok(());
        }
        let existing = self.asset_repo.existing_ids(assets).await?;
        for id in assets.iter().filter(|id| !existing.contains(*id)) {
            errors.add(
                "assets",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    id
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forms::{AssetForm, AssetSubmission, ProtocolForm};
    use crate::application::use_cases::commands::CreateAssetUseCase;
    use crate::domain::models::Platform;
    use crate::infrastructure::persistence::SqliteStore;

    async fn seed(store: &Arc<SqliteStore>, hostnames: &[&str]) -> Vec<AssetId> {
        let root = store.ensure_root().await.unwrap();
        let create =
            CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());
        let mut ids = Vec::new();
        for hostname in hostnames {
            let asset = create
                .execute(
                    &AssetSubmission {
                        asset: AssetForm {
                            hostname: hostname.to_string(),
                            ip: "10.1.0.1".to_string(),
                            nodes: vec![root.id.to_string()],
                            ..Default::default()
                        },
                        protocols: vec![ProtocolForm::default_entry()],
                    },
                    None,
                )
                .await
                .unwrap();
            ids.push(asset.id);
        }
        ids
    }

    fn use_case(store: &Arc<SqliteStore>) -> BulkUpdateAssetsUseCase {
        BulkUpdateAssetsUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_bulk_update_applies_to_all_selected() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let ids = seed(&store, &["a1", "a2", "a3"]).await;

        let form = BulkUpdateForm {
            assets: ids[..2].iter().map(|id| id.to_string()).collect(),
            platform: Some("Windows".to_string()),
            is_active: Some(false),
            protocols: Some(vec![ProtocolForm {
                name: "rdp".to_string(),
                port: Some(3389_i64.into()),
            }]),
            ..Default::default()
        };
        assert_eq!(use_case(&store).execute(&form).await.unwrap(), 2);

        for id in &ids[..2] {
            let asset = store.get(id).await.unwrap();
            assert_eq!(asset.platform, Platform::Windows);
            assert!(!asset.is_active);
            assert_eq!(asset.protocols_display(), "rdp/3389");
        }
        let untouched = store.get(&ids[2]).await.unwrap();
        assert_eq!(untouched.platform, Platform::Linux);
        assert_eq!(untouched.protocols_display(), "ssh/22");
    }

    #[tokio::test]
    async fn test_unknown_asset_aborts_whole_batch() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let ids = seed(&store, &["b1"]).await;

        let form = BulkUpdateForm {
            assets: vec![ids[0].to_string(), "ghost".to_string()],
            platform: Some("BSD".to_string()),
            ..Default::default()
        };
        let err = use_case(&store).execute(&form).await.unwrap_err();
        match err {
            CoreError::Validation { errors } => assert!(errors.has_field("assets")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.get(&ids[0]).await.unwrap().platform, Platform::Linux);
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let ids = seed(&store, &["c1"]).await;

        let form = BulkUpdateForm::with_assets(&ids);
        assert_eq!(use_case(&store).execute(&form).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_too_many_protocols_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let ids = seed(&store, &["d1"]).await;

        let form = BulkUpdateForm {
            assets: vec![ids[0].to_string()],
            protocols: Some(
                (0..6)
                    .map(|i| ProtocolForm {
                        name: "ssh".to_string(),
                        port: Some((2200_i64 + i).into()),
                    })
                    .collect(),
            ),
            ..Default::default()
        };
        assert!(use_case(&store).execute(&form).await.is_err());
        assert_eq!(store.protocol_row_count().unwrap(), 1);
    }
}
