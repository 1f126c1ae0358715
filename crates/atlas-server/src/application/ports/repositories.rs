use async_trait::async_trait;
use atlas_core::core_types::{
    AdminUserId, AssetId, DomainId, LabelId, NodeId, SystemUserId, UserId,
};
use atlas_core::error::CoreError;
use std::collections::HashSet;

use crate::domain::models::{
    AdminUser, Asset, AssetDraft, AssetPatch, Domain, Label, Node, ProtocolName, SystemUser,
};

/// 资产仓储接口
///
/// 所有写操作在单个事务中完成：资产行、协议集合与各类关联要么全部可见，要么全部不可见。
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// 创建资产及其协议、关联
    async fn create(&self, draft: AssetDraft, created_by: Option<String>)
        -> Result<Asset, CoreError>;

    /// 以草稿整体替换资产字段，协议集合整体替换
    async fn update(&self, id: &AssetId, draft: AssetDraft) -> Result<Asset, CoreError>;

    /// 对多个资产应用同一补丁；任一资产不存在则全部回滚
    async fn bulk_update(&self, ids: &[AssetId], patch: &AssetPatch) -> Result<usize, CoreError>;

    /// 删除资产，级联删除其协议与关联行，返回被删除的资产
    async fn delete(&self, id: &AssetId) -> Result<Asset, CoreError>;

    async fn get(&self, id: &AssetId) -> Result<Asset, CoreError>;

    /// 按主机名排序列出全部资产
    async fn list(&self) -> Result<Vec<Asset>, CoreError>;

    /// 列出授权给指定用户的资产
    async fn list_granted(&self, user_id: &UserId) -> Result<Vec<Asset>, CoreError>;

    /// 主机名是否已被（除 `exclude` 外的）资产占用
    async fn hostname_taken(
        &self,
        hostname: &str,
        exclude: Option<&AssetId>,
    ) -> Result<bool, CoreError>;

    /// 返回给定 ID 中实际存在的部分
    async fn existing_ids(&self, ids: &[AssetId]) -> Result<HashSet<AssetId>, CoreError>;

    async fn grant(&self, id: &AssetId, user_id: &UserId) -> Result<(), CoreError>;

    async fn revoke(&self, id: &AssetId, user_id: &UserId) -> Result<(), CoreError>;
}

/// 节点仓储接口
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// 确保根节点存在（不存在则创建）
    async fn ensure_root(&self) -> Result<Node, CoreError>;

    async fn find(&self, id: &NodeId) -> Result<Option<Node>, CoreError>;

    /// 按键升序列出
    async fn list(&self) -> Result<Vec<Node>, CoreError>;

    /// 按键降序列出
    async fn list_by_key_desc(&self) -> Result<Vec<Node>, CoreError>;

    /// 不包含指定资产的节点
    async fn list_without_asset(&self, asset_id: &AssetId) -> Result<Vec<Node>, CoreError>;

    /// 在父节点下创建子节点
    async fn create_child(&self, parent: &NodeId, value: &str) -> Result<Node, CoreError>;

    async fn existing_ids(&self, ids: &[NodeId]) -> Result<HashSet<NodeId>, CoreError>;
}

/// 标签仓储接口
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// 按名称排序列出
    async fn list(&self) -> Result<Vec<Label>, CoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, CoreError>;

    async fn create(&self, name: &str, value: &str) -> Result<Label, CoreError>;

    async fn existing_ids(&self, ids: &[LabelId]) -> Result<HashSet<LabelId>, CoreError>;
}

/// 目录仓储接口：系统用户、管理用户、网域
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn list_system_users(&self) -> Result<Vec<SystemUser>, CoreError>;

    /// 关联到指定资产的系统用户
    async fn list_system_users_of(&self, asset_id: &AssetId)
        -> Result<Vec<SystemUser>, CoreError>;

    async fn create_system_user(
        &self,
        name: &str,
        username: &str,
        protocol: ProtocolName,
    ) -> Result<SystemUser, CoreError>;

    async fn list_admin_users(&self) -> Result<Vec<AdminUser>, CoreError>;

    async fn list_domains(&self) -> Result<Vec<Domain>, CoreError>;

    async fn create_admin_user(&self, name: &str, username: &str)
        -> Result<AdminUser, CoreError>;

    async fn create_domain(&self, name: &str) -> Result<Domain, CoreError>;

    async fn existing_system_user_ids(
        &self,
        ids: &[SystemUserId],
    ) -> Result<HashSet<SystemUserId>, CoreError>;

    async fn admin_user_exists(&self, id: &AdminUserId) -> Result<bool, CoreError>;

    async fn domain_exists(&self, id: &DomainId) -> Result<bool, CoreError>;
}
