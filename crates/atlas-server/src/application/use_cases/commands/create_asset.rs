use std::sync::Arc;

use atlas_core::core_types::AssetId;
use atlas_core::error::{CoreError, ValidationErrors};

use crate::application::forms::{AssetSubmission, ReferenceValidator};
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::{Asset, AssetDraft};

pub const MSG_HOSTNAME_TAKEN: &str = "Asset with this hostname already exists.";

/// 创建资产用例
pub struct CreateAssetUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
}

impl CreateAssetUseCase {
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

    /// 校验主表单与协议表单集合，全部通过后在单个事务中写入
    pub async fn execute(
        &self,
        submission: &AssetSubmission,
        created_by: Option<String>,
    ) -> Result<Asset, CoreError> {
        let draft = validate_submission(
            submission,
            None,
            self.asset_repo.as_ref(),
            &ReferenceValidator {
                nodes: self.node_repo.as_ref(),
                labels: self.label_repo.as_ref(),
                directory: self.directory_repo.as_ref(),
            },
        )
        .await?;

        let asset = self.asset_repo.create(draft, created_by).await?;
        tracing::info!(
            asset_id = %asset.id,
            hostname = %asset.hostname,
            protocols = asset.protocols.len(),
            "asset created"
        );
        Ok(asset)
    }
}

/// 创建与更新共用的完整校验：字段清洗、引用存在性、主机名唯一
pub(crate) async fn validate_submission(
    submission: &AssetSubmission,
    exclude: Option<&AssetId>,
    asset_repo: &dyn AssetRepository,
    references: &ReferenceValidator<'_>,
) -> Result<AssetDraft, CoreError> {
    let mut errors = ValidationErrors::new();
    let draft = submission.clean(&mut errors);

    references.check_draft(&draft, &mut errors).await?;

    if !errors.has_field("hostname") && asset_repo.hostname_taken(&draft.hostname, exclude).await?
    {
        errors.add("hostname", MSG_HOSTNAME_TAKEN);
    }

    if !errors.is_empty() {
        tracing::debug!(errors = %errors, "asset submission rejected");
    }
    errors.into_result()?;
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forms::{AssetForm, ProtocolForm};
    use crate::infrastructure::persistence::SqliteStore;

    fn use_case(store: &Arc<SqliteStore>) -> CreateAssetUseCase {
        CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
    }

    fn submission(hostname: &str, node: &str, protocols: &[(&str, i64)]) -> AssetSubmission {
        AssetSubmission {
            asset: AssetForm {
                hostname: hostname.to_string(),
                ip: "10.0.0.1".to_string(),
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
    async fn test_create_persists_protocols_in_order() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();

        let asset = use_case(&store)
            .execute(
                &submission("web01", root.id.as_str(), &[("ssh", 22), ("rdp", 3389)]),
                Some("admin".to_string()),
            )
            .await
            .unwrap();

        let stored = store.get(&asset.id).await.unwrap();
        assert_eq!(stored.protocols_display(), "ssh/22 rdp/3389");
        assert_eq!(stored.nodes, vec![root.id]);
        assert_eq!(stored.created_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_invalid_formset_persists_nothing() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let uc = use_case(&store);

        let err = uc
            .execute(&submission("web01", root.id.as_str(), &[]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        let six: Vec<(&str, i64)> = (0..6).map(|i| ("ssh", 22 + i)).collect();
        let err = uc
            .execute(&submission("web01", root.id.as_str(), &six), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        assert!(AssetRepository::list(store.as_ref()).await.unwrap().is_empty());
        assert_eq!(store.protocol_row_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_hostname_and_unknown_node() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let uc = use_case(&store);

        uc.execute(&submission("web01", root.id.as_str(), &[("ssh", 22)]), None)
            .await
            .unwrap();

        let err = uc
            .execute(&submission("web01", "missing-node", &[("ssh", 22)]), None)
            .await
            .unwrap_err();
        match err {
            CoreError::Validation { errors } => {
                assert_eq!(errors.field("hostname"), &[MSG_HOSTNAME_TAKEN.to_string()]);
                assert!(errors.has_field("nodes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(AssetRepository::list(store.as_ref()).await.unwrap().len(), 1);
    }
}
