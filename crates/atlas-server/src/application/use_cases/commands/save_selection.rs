use std::sync::Arc;

use atlas_core::core_types::{AssetId, SelectionToken};
use atlas_core::error::{CoreError, ValidationErrors};

use crate::application::ports::repositories::AssetRepository;
use crate::application::ports::selection::SelectionCache;

/// 保存批量选择，返回 spm 令牌
pub struct SaveSelectionUseCase {
    asset_repo: Arc<dyn AssetRepository>,
    selection_cache: Arc<dyn SelectionCache>,
}

impl SaveSelectionUseCase {
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        selection_cache: Arc<dyn SelectionCache>,
    ) -> Self {
        Self {
            asset_repo,
            selection_cache,
        }
    }

    pub async fn execute(&self, assets: &[String]) -> Result<SelectionToken, CoreError> {
        let mut ids: Vec<AssetId> = Vec::with_capacity(assets.len());
        for raw in assets.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            let id = AssetId::from(raw);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut errors = ValidationErrors::new();
        if ids.is_empty() {
            errors.add("assets", "This field is required.");
        } else {
            let existing = self.asset_repo.existing_ids(&ids).await?;
            for id in ids.iter().filter(|id| !existing.contains(*id)) {
                errors.add(
                    "assets",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        id
                    ),
                );
            }
        }
        errors.into_result()?;

        let token = self.selection_cache.put(&ids).await?;
        tracing::debug!(spm = %token, assets = ids.len(), "selection saved");
        Ok(token)
    }
}
