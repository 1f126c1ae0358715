use std::sync::Arc;

use atlas_core::core_types::AssetId;
use atlas_core::error::CoreError;
use serde::Serialize;

use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::{Asset, AssetSummary, Label, Node, SystemUser};
use crate::domain::permission::Caller;

/// 资产列表页数据
#[derive(Debug, Clone, Serialize)]
pub struct AssetListing {
    pub labels: Vec<Label>,
    /// 按键降序
    pub nodes: Vec<Node>,
    pub assets: Vec<AssetSummary>,
}

/// 资产详情页数据
#[derive(Debug, Clone, Serialize)]
pub struct AssetDetail {
    pub asset: Asset,
    pub protocols_display: String,
    /// 不包含该资产的节点，按键升序
    pub nodes_remain: Vec<Node>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetUsers {
    pub asset: Asset,
    pub system_users: Vec<SystemUser>,
}

/// “我的资产”页数据
#[derive(Debug, Clone, Serialize)]
pub struct UserAssets {
    pub labels: Vec<Label>,
    pub system_users: Vec<SystemUser>,
    pub assets: Vec<AssetSummary>,
}

/// 资产浏览用例（只读）
pub struct BrowseAssetsUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
}

impl BrowseAssetsUseCase {
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

    pub async fn list(&self) -> Result<AssetListing, CoreError> {
        self.node_repo.ensure_root().await?;
        let labels = self.label_repo.list().await?;
        let nodes = self.node_repo.list_by_key_desc().await?;
        let assets = self.asset_repo.list().await?;

        Ok(AssetListing {
            labels,
            nodes,
            assets: assets.iter().map(Asset::summary).collect(),
        })
    }

    pub async fn detail(&self, id: &AssetId) -> Result<AssetDetail, CoreError> {
        let asset = self.asset_repo.get(id).await?;
        let nodes_remain = self.node_repo.list_without_asset(id).await?;
        Ok(AssetDetail {
            protocols_display: asset.protocols_display(),
            asset,
            nodes_remain,
        })
    }

    pub async fn asset_users(&self, id: &AssetId) -> Result<AssetUsers, CoreError> {
        let asset = self.asset_repo.get(id).await?;
        let system_users = self.directory_repo.list_system_users_of(id).await?;
        Ok(AssetUsers {
            asset,
            system_users,
        })
    }

    /// 管理员看到全部资产，其余用户只看到被授权的资产
    pub async fn user_assets(&self, caller: &Caller) -> Result<UserAssets, CoreError> {
        let labels = self.label_repo.list().await?;
        let system_users = self.directory_repo.list_system_users().await?;
        let assets = if caller.is_admin() {
            self.asset_repo.list().await?
        } else {
            self.asset_repo.list_granted(&caller.user_id).await?
        };

        Ok(UserAssets {
            labels,
            system_users,
            assets: assets.iter().map(Asset::summary).collect(),
        })
    }
}
