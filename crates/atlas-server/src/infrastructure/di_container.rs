use anyhow::Result;
use atlas_core::config::AuthConfig;
use atlas_core::DEFAULT_SELECTION_TTL_SEC;
use std::sync::Arc;
use std::time::Duration;

use crate::application::context::{ApplicationContext, ApplicationContextBuilder};
use crate::application::ports::auth::CallerResolver;
use crate::application::ports::selection::SelectionCache;
use crate::domain::permission::{PermissionGate, RolePermissionGate};
use crate::infrastructure::auth::TokenCallerResolver;
use crate::infrastructure::persistence::SqliteStore;
use crate::infrastructure::selection::MemorySelectionCache;

/// 基础设施依赖注入容器 - 负责创建具体实现
pub struct InfrastructureDiContainer {
    store: Arc<SqliteStore>,
    selection_cache: Arc<dyn SelectionCache>,
    auth: AuthConfig,
}

impl InfrastructureDiContainer {
    pub fn new(
        store: Arc<SqliteStore>,
        selection_cache: Arc<dyn SelectionCache>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            store,
            selection_cache,
            auth,
        }
    }

    /// 内存数据库 + 进程内选择缓存，适用于本地运行与测试
    pub fn in_memory(auth: AuthConfig) -> Result<Self> {
        let store = Arc::new(SqliteStore::open_in_memory()?);
        let cache = Arc::new(MemorySelectionCache::new(Duration::from_secs(
            DEFAULT_SELECTION_TTL_SEC,
        )));
        Ok(Self::new(store, cache, auth))
    }

    /// 共享的存储实例（测试与运维工具直接访问）
    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    /// 创建完整的应用程序上下文，包含所有具体实现
    pub fn create_application_context(&self) -> Result<ApplicationContext> {
        let resolver = TokenCallerResolver::from_config(&self.auth);
        if resolver.is_empty() {
            tracing::warn!("no API tokens configured, every request will be anonymous");
        }

        ApplicationContextBuilder::new()
            .with_asset_repo(self.store.clone())
            .with_node_repo(self.store.clone())
            .with_label_repo(self.store.clone())
            .with_directory_repo(self.store.clone())
            .with_selection_cache(self.selection_cache.clone())
            .with_permission_gate(Arc::new(RolePermissionGate) as Arc<dyn PermissionGate>)
            .with_caller_resolver(Arc::new(resolver) as Arc<dyn CallerResolver>)
            .build()
    }
}
