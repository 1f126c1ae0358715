use async_trait::async_trait;
use atlas_core::core_types::{AssetId, SelectionToken};
use atlas_core::error::CoreError;

/// 批量选择缓存：在跳转之间传递已选资产 ID 列表
///
/// 过期由后端管理；条目不存在即视为“无预选”。
#[async_trait]
pub trait SelectionCache: Send + Sync {
    /// 读取令牌对应的资产 ID 列表
    async fn get(&self, token: &SelectionToken) -> Result<Option<Vec<AssetId>>, CoreError>;

    /// 保存资产 ID 列表，返回新令牌
    async fn put(&self, asset_ids: &[AssetId]) -> Result<SelectionToken, CoreError>;
}
