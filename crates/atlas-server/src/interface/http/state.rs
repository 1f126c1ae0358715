use crate::application::context::ApplicationContext;
use crate::application::use_cases::commands::{
    BulkUpdateAssetsUseCase, CreateAssetUseCase, DeleteAssetUseCase, ManageCatalogUseCase,
    ManageGrantsUseCase, SaveSelectionUseCase, UpdateAssetUseCase,
};
use crate::application::use_cases::queries::{AssetFormsUseCase, BrowseAssetsUseCase};
use crate::domain::permission::{authorize, Caller, Operation};
use crate::interface::http::errors::ApiError;

/// 中间件解析出的调用者，匿名时为 None
#[derive(Debug, Clone, Default)]
pub struct CallerContext(pub Option<Caller>);

impl CallerContext {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }

    /// 审计字段使用的调用者名称
    pub fn display_name(&self) -> Option<String> {
        self.0.as_ref().map(|c| c.name.clone())
    }
}

/// HTTP 层共享状态
#[derive(Clone)]
pub struct AppState {
    context: ApplicationContext,
}

impl AppState {
    pub fn new(context: ApplicationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ApplicationContext {
        &self.context
    }

    /// 在任何处理逻辑之前执行权限闸门
    pub fn authorize(&self, caller: &CallerContext, operation: Operation) -> Result<(), ApiError> {
        authorize(
            self.context.permission_gate.as_ref(),
            caller.caller(),
            operation,
        )
        .map_err(|e| {
            tracing::info!(operation = operation.as_str(), error = %e, "request denied");
            ApiError::from(e)
        })
    }

    pub fn browse_assets_use_case(&self) -> BrowseAssetsUseCase {
        let ctx = &self.context;
        BrowseAssetsUseCase::new(
            ctx.asset_repo.clone(),
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
        )
    }

    pub fn asset_forms_use_case(&self) -> AssetFormsUseCase {
        let ctx = &self.context;
        AssetFormsUseCase::new(
            ctx.asset_repo.clone(),
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
            ctx.selection_cache.clone(),
        )
    }

    pub fn create_asset_use_case(&self) -> CreateAssetUseCase {
        let ctx = &self.context;
        CreateAssetUseCase::new(
            ctx.asset_repo.clone(),
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
        )
    }

    pub fn update_asset_use_case(&self) -> UpdateAssetUseCase {
        let ctx = &self.context;
        UpdateAssetUseCase::new(
            ctx.asset_repo.clone(),
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
        )
    }

    pub fn bulk_update_use_case(&self) -> BulkUpdateAssetsUseCase {
        let ctx = &self.context;
        BulkUpdateAssetsUseCase::new(
            ctx.asset_repo.clone(),
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
        )
    }

    pub fn delete_asset_use_case(&self) -> DeleteAssetUseCase {
        DeleteAssetUseCase::new(self.context.asset_repo.clone())
    }

    pub fn save_selection_use_case(&self) -> SaveSelectionUseCase {
        SaveSelectionUseCase::new(
            self.context.asset_repo.clone(),
            self.context.selection_cache.clone(),
        )
    }

    pub fn manage_grants_use_case(&self) -> ManageGrantsUseCase {
        ManageGrantsUseCase::new(self.context.asset_repo.clone())
    }

    pub fn manage_catalog_use_case(&self) -> ManageCatalogUseCase {
        let ctx = &self.context;
        ManageCatalogUseCase::new(
            ctx.node_repo.clone(),
            ctx.label_repo.clone(),
            ctx.directory_repo.clone(),
        )
    }
}
