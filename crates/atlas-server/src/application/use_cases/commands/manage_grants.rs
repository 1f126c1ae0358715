use std::sync::Arc;

use atlas_core::core_types::{AssetId, UserId};
use atlas_core::error::CoreError;

use crate::application::ports::repositories::AssetRepository;

/// 资产授权用例：决定非管理员在“我的资产”中看到哪些资产
pub struct ManageGrantsUseCase {
    asset_repo: Arc<dyn AssetRepository>,
}

impl ManageGrantsUseCase {
    pub fn new(asset_repo: Arc<dyn AssetRepository>) -> Self {
        Self { asset_repo }
    }

    pub async fn grant(&self, asset_id: &AssetId, user_id: &UserId) -> Result<(), CoreError> {
        Self::check_user(user_id)?;
        self.asset_repo.get(asset_id).await?;
        self.asset_repo.grant(asset_id, user_id).await?;
        tracing::info!(asset_id = %asset_id, user_id = %user_id, "asset granted");
        Ok(())
    }

    pub async fn revoke(&self, asset_id: &AssetId, user_id: &UserId) -> Result<(), CoreError> {
        Self::check_user(user_id)?;
        self.asset_repo.get(asset_id).await?;
        self.asset_repo.revoke(asset_id, user_id).await?;
        tracing::info!(asset_id = %asset_id, user_id = %user_id, "asset grant revoked");
        Ok(())
    }

    fn check_user(user_id: &UserId) -> Result<(), CoreError> {
        if user_id.as_str().trim().is_empty() {
            return Err(CoreError::invalid_field("user_id", "This field is required."));
        }
        Ok(())
    }
}
