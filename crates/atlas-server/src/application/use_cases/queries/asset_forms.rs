use std::sync::Arc;

use atlas_core::core_types::{AssetId, NodeId, SelectionToken};
use atlas_core::error::{CoreError, ValidationErrors};
use serde::Serialize;

use crate::application::forms::{AssetForm, AssetSubmission, BulkUpdateForm, ProtocolForm};
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::application::ports::selection::SelectionCache;
use crate::domain::models::{
    AdminUser, Asset, AssetSummary, Domain, Label, Node, Platform, ProtocolName, SystemUser,
};

/// 表单下拉选项
#[derive(Debug, Clone, Serialize)]
pub struct FormChoices {
    pub platforms: Vec<&'static str>,
    pub protocols: Vec<&'static str>,
    pub nodes: Vec<Node>,
    pub labels: Vec<Label>,
    pub system_users: Vec<SystemUser>,
    pub admin_users: Vec<AdminUser>,
    pub domains: Vec<Domain>,
}

/// 创建/更新表单视图；校验失败时携带提交值与错误重新渲染
#[derive(Debug, Clone, Serialize)]
pub struct AssetFormView {
    /// 更新表单的目标资产
    pub asset: Option<AssetSummary>,
    pub form: AssetSubmission,
    pub errors: ValidationErrors,
    pub choices: FormChoices,
}

/// 批量更新表单视图
#[derive(Debug, Clone, Serialize)]
pub struct BulkFormView {
    pub form: BulkUpdateForm,
    pub errors: ValidationErrors,
    /// 可供选择的全部资产
    pub assets: Vec<AssetSummary>,
    pub choices: FormChoices,
}

/// 表单视图用例（只读）
pub struct AssetFormsUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
    selection_cache: Arc<dyn SelectionCache>,
}

impl AssetFormsUseCase {
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        node_repo: Arc<dyn NodeRepository>,
        label_repo: Arc<dyn LabelRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        selection_cache: Arc<dyn SelectionCache>,
    ) -> Self {
        Self {
            asset_repo,
            node_repo,
            label_repo,
            directory_repo,
            selection_cache,
        }
    }

    /// 新建表单：默认节点为 `node_id` 指向的节点，找不到时退回根节点
    pub async fn create_form(&self, node_id: Option<&str>) -> Result<AssetFormView, CoreError> {
        let requested = match node_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.node_repo.find(&NodeId::from(id)).await?,
            None => None,
        };
        let default_node = match requested {
            Some(node) => node,
            None => self.node_repo.ensure_root().await?,
        };

        let form = AssetSubmission {
            asset: AssetForm {
                nodes: vec![default_node.id.to_string()],
                is_active: Some(true),
                platform: Some(Platform::default().to_string()),
                ..Default::default()
            },
            protocols: vec![ProtocolForm::default_entry()],
        };
        self.render(None, form, ValidationErrors::new()).await
    }

    /// 更新表单：主表单与协议表单集合均以持久化值为初值
    pub async fn update_form(&self, id: &AssetId) -> Result<AssetFormView, CoreError> {
        let asset = self.asset_repo.get(id).await?;
        let form = AssetSubmission {
            asset: AssetForm::from_asset(&asset),
            protocols: asset.protocols.iter().map(ProtocolForm::from).collect(),
        };
        self.render(Some(asset.summary()), form, ValidationErrors::new())
            .await
    }

    /// 以提交值和错误重新渲染创建/更新表单
    pub async fn rerender(
        &self,
        asset: Option<&AssetId>,
        form: AssetSubmission,
        errors: ValidationErrors,
    ) -> Result<AssetFormView, CoreError> {
        let summary = match asset {
            Some(id) => Some(self.asset_repo.get(id).await?.summary()),
            None => None,
        };
        self.render(summary, form, errors).await
    }

    /// 批量更新表单：`spm` 命中缓存时预填资产列表，否则为空表单
    pub async fn bulk_form(&self, spm: Option<&str>) -> Result<BulkFormView, CoreError> {
        let preselected = match spm.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let token = SelectionToken::from(raw);
                match self.selection_cache.get(&token).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        tracing::warn!(spm = %token, error = %e, "selection cache read failed, ignoring");
                        None
                    }
                }
            }
            None => None,
        };

        let form = preselected
            .map(|ids| BulkUpdateForm::with_assets(&ids))
            .unwrap_or_default();
        self.render_bulk(form, ValidationErrors::new()).await
    }

    pub async fn render_bulk(
        &self,
        form: BulkUpdateForm,
        errors: ValidationErrors,
    ) -> Result<BulkFormView, CoreError> {
        let assets = self.asset_repo.list().await?;
        Ok(BulkFormView {
            form,
            errors,
            assets: assets.iter().map(Asset::summary).collect(),
            choices: self.choices().await?,
        })
    }

    /// 删除确认
    pub async fn delete_confirm(&self, id: &AssetId) -> Result<Asset, CoreError> {
        self.asset_repo.get(id).await
    }

    pub async fn choices(&self) -> Result<FormChoices, CoreError> {
        Ok(FormChoices {
            platforms: Platform::ALL.iter().map(Platform::as_str).collect(),
            protocols: ProtocolName::ALL.iter().map(ProtocolName::as_str).collect(),
            nodes: self.node_repo.list().await?,
            labels: self.label_repo.list().await?,
            system_users: self.directory_repo.list_system_users().await?,
            admin_users: self.directory_repo.list_admin_users().await?,
            domains: self.directory_repo.list_domains().await?,
        })
    }

    async fn render(
        &self,
        asset: Option<AssetSummary>,
        form: AssetSubmission,
        errors: ValidationErrors,
    ) -> Result<AssetFormView, CoreError> {
        Ok(AssetFormView {
            asset,
            form,
            errors,
            choices: self.choices().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::commands::manage_catalog::{ManageCatalogUseCase, NodeForm};
    use crate::application::use_cases::commands::CreateAssetUseCase;
    use crate::infrastructure::persistence::SqliteStore;
    use crate::infrastructure::selection::MemorySelectionCache;
    use std::time::Duration;

    fn forms(store: &Arc<SqliteStore>, cache: Arc<MemorySelectionCache>) -> AssetFormsUseCase {
        AssetFormsUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            cache,
        )
    }

    fn cache() -> Arc<MemorySelectionCache> {
        Arc::new(MemorySelectionCache::new(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_create_form_defaults() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let uc = forms(&store, cache());

        let view = uc.create_form(None).await.unwrap();
        let root = store.ensure_root().await.unwrap();
        assert_eq!(view.form.asset.nodes, vec![root.id.to_string()]);
        assert_eq!(view.form.protocols, vec![ProtocolForm::default_entry()]);
        assert!(view.asset.is_none());

        let child = ManageCatalogUseCase::new(store.clone(), store.clone(), store.clone())
            .create_node(&NodeForm {
                parent: None,
                value: "db".to_string(),
            })
            .await
            .unwrap();
        let view = uc.create_form(Some(child.id.as_str())).await.unwrap();
        assert_eq!(view.form.asset.nodes, vec![child.id.to_string()]);

        let view = uc.create_form(Some("unknown")).await.unwrap();
        assert_eq!(view.form.asset.nodes, vec![root.id.to_string()]);
    }

    #[tokio::test]
    async fn test_update_form_seeded_from_asset() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let root = store.ensure_root().await.unwrap();
        let submission = AssetSubmission {
            asset: AssetForm {
                hostname: "web01".to_string(),
                ip: "10.0.0.1".to_string(),
                nodes: vec![root.id.to_string()],
                ..Default::default()
            },
            protocols: vec![
                ProtocolForm::default_entry(),
                ProtocolForm {
                    name: "rdp".to_string(),
                    port: Some(3389_i64.into()),
                },
            ],
        };
        let asset = CreateAssetUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
            .execute(&submission, None)
            .await
            .unwrap();

        let view = forms(&store, cache()).update_form(&asset.id).await.unwrap();
        assert_eq!(view.form.asset.hostname, "web01");
        assert_eq!(view.form.protocols, submission.protocols);
        assert_eq!(view.asset.map(|a| a.id), Some(asset.id));
    }

    #[tokio::test]
    async fn test_bulk_form_prefills_from_selection() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let cache = cache();
        let uc = forms(&store, cache.clone());

        let ids = vec![AssetId::from("a-2"), AssetId::from("a-1")];
        let token = cache.put(&ids).await.unwrap();

        let view = uc.bulk_form(Some(token.as_str())).await.unwrap();
        assert_eq!(view.form.assets, vec!["a-2".to_string(), "a-1".to_string()]);

        let view = uc.bulk_form(Some("unknown")).await.unwrap();
        assert!(view.form.assets.is_empty());

        let view = uc.bulk_form(None).await.unwrap();
        assert!(view.form.assets.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_form_ignores_expired_selection() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let cache = Arc::new(MemorySelectionCache::new(Duration::from_millis(10)));
        let uc = forms(&store, cache.clone());

        let token = cache.put(&[AssetId::from("a-1")]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let view = uc.bulk_form(Some(token.as_str())).await.unwrap();
        assert!(view.form.assets.is_empty());
    }
}
