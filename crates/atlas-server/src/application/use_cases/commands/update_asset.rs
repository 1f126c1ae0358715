use std::sync::Arc;

use atlas_core::core_types::AssetId;
use atlas_core::error::CoreError;

use super::create_asset::validate_submission;
use crate::application::forms::{AssetSubmission, ReferenceValidator};
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::Asset;

/// 更新资产用例：字段整体替换，协议集合整体替换
pub struct UpdateAssetUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
}

impl UpdateAssetUseCase {
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

    pub async fn execute(
        &self,
        id: &AssetId,
        submission: &AssetSubmission,
    ) -> Result<Asset, CoreError> {
        // 先确认目标存在，未知 ID 返回 NotFound 而不是校验错误
        let before = self.asset_repo.get(id).await?;

        let draft = validate_submission(
            submission,
            Some(id),
            self.asset_repo.as_ref(),
            &ReferenceValidator {
                nodes: self.node_repo.as_ref(),
                labels: self.label_repo.as_ref(),
                directory: self.directory_repo.as_ref(),
            },
        )
        .await?;

        let asset = self.asset_repo.update(id, draft).await?;
        tracing::info!(
            asset_id = %asset.id,
            hostname = %asset.hostname,
            previous_protocols = %before.protocols_display(),
            protocols = %asset.protocols_display(),
            "asset updated"
        );
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forms::{AssetForm, ProtocolForm};
    use crate::application::use_cases::commands::create_asset::{
        CreateAssetUseCase, MSG_HOSTNAME_TAKEN,
    };
    use crate::infrastructure::persistence::SqliteStore;

    fn submission(hostname: &str, node: &str, protocols: &[(&str, i64)]) -> AssetSubmission {
        AssetSubmission {
            asset: AssetForm {
                hostname: hostname.to_string(),
                ip: "192.168.1.10".to_string(),
                nodes: vec![node.to_string()],
                ..Default::default()
            },
            protocols: protocols
                .iter()
                .map(|(name, port)| ProtocolForm {
                    name: name.to_string(),
                    port: Some((*port).into()),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_protocol_set() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let create =
            CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());
        let update =
            UpdateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());

        let asset = create
            .execute(
                &submission("db01", root.id.as_str(), &[("ssh", 22), ("telnet", 23)]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(store.protocol_row_count().unwrap(), 2);

        // 同名主机名排除自身，不算冲突
        let updated = update
            .execute(
                &asset.id,
                &submission("db01", root.id.as_str(), &[("rdp", 3389)]),
            )
            .await
            .unwrap();

        assert_eq!(updated.protocols_display(), "rdp/3389");
        assert_eq!(store.protocol_row_count().unwrap(), 1);
        assert_eq!(
            store.get(&asset.id).await.unwrap().protocols_display(),
            "rdp/3389"
        );
    }

    #[tokio::test]
    async fn test_update_rejects_hostname_of_other_asset() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let create =
            CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());
        let update =
            UpdateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());

        create
            .execute(&submission("db01", root.id.as_str(), &[("ssh", 22)]), None)
            .await
            .unwrap();
        let second = create
            .execute(&submission("db02", root.id.as_str(), &[("ssh", 22)]), None)
            .await
            .unwrap();

        let err = update
            .execute(
                &second.id,
                &submission("db01", root.id.as_str(), &[("vnc", 5900)]),
            )
            .await
            .unwrap_err();
        match err {
            CoreError::Validation { errors } => {
                assert_eq!(errors.field("hostname"), &[MSG_HOSTNAME_TAKEN.to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            store.get(&second.id).await.unwrap().protocols_display(),
            "ssh/22"
        );
    }

    #[tokio::test]
    async fn test_update_unknown_asset_is_not_found() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let update =
            UpdateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());

        let err = update
            .execute(
                &AssetId::from("nope"),
                &submission("db01", root.id.as_str(), &[("ssh", 22)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
