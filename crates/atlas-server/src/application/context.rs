use anyhow::Result;
use std::sync::Arc;

use crate::application::ports::auth::CallerResolver;
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::application::ports::selection::SelectionCache;
use crate::domain::permission::PermissionGate;

/// 应用程序上下文 - 管理所有依赖（仅持有抽象）
#[derive(Clone)]
pub struct ApplicationContext {
    pub asset_repo: Arc<dyn AssetRepository>,
    pub node_repo: Arc<dyn NodeRepository>,
    pub label_repo: Arc<dyn LabelRepository>,
    pub directory_repo: Arc<dyn DirectoryRepository>,
    pub selection_cache: Arc<dyn SelectionCache>,
    pub permission_gate: Arc<dyn PermissionGate>,
    pub caller_resolver: Arc<dyn CallerResolver>,
}

/// 应用程序上下文构建器（仅接受 trait 对象）
#[derive(Default)]
pub struct ApplicationContextBuilder {
    asset_repo: Option<Arc<dyn AssetRepository>>,
    node_repo: Option<Arc<dyn NodeRepository>>,
    label_repo: Option<Arc<dyn LabelRepository>>,
    directory_repo: Option<Arc<dyn DirectoryRepository>>,
    selection_cache: Option<Arc<dyn SelectionCache>>,
    permission_gate: Option<Arc<dyn PermissionGate>>,
    caller_resolver: Option<Arc<dyn CallerResolver>>,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_repo(mut self, repo: Arc<dyn AssetRepository>) -> Self {
        self.asset_repo = Some(repo);
        self
    }

    pub fn with_node_repo(mut self, repo: Arc<dyn NodeRepository>) -> Self {
        self.node_repo = Some(repo);
        self
    }

    pub fn with_label_repo(mut self, repo: Arc<dyn LabelRepository>) -> Self {
        self.label_repo = Some(repo);
        self
    }

    pub fn with_directory_repo(mut self, repo: Arc<dyn DirectoryRepository>) -> Self {
        self.directory_repo = Some(repo);
        self
    }

    pub fn with_selection_cache(mut self, cache: Arc<dyn SelectionCache>) -> Self {
        self.selection_cache = Some(cache);
        self
    }

    pub fn with_permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.permission_gate = Some(gate);
        self
    }

    pub fn with_caller_resolver(mut self, resolver: Arc<dyn CallerResolver>) -> Self {
        self.caller_resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<ApplicationContext> {
        Ok(ApplicationContext {
            asset_repo: self
                .asset_repo
                .ok_or_else(|| anyhow::anyhow!("AssetRepository is required"))?,
            node_repo: self
                .node_repo
                .ok_or_else(|| anyhow::anyhow!("NodeRepository is required"))?,
            label_repo: self
                .label_repo
                .ok_or_else(|| anyhow::anyhow!("LabelRepository is required"))?,
            directory_repo: self
                .directory_repo
                .ok_or_else(|| anyhow::anyhow!("DirectoryRepository is required"))?,
            selection_cache: self
                .selection_cache
                .ok_or_else(|| anyhow::anyhow!("SelectionCache is required"))?,
            permission_gate: self
                .permission_gate
                .ok_or_else(|| anyhow::anyhow!("PermissionGate is required"))?,
            caller_resolver: self
                .caller_resolver
                .ok_or_else(|| anyhow::anyhow!("CallerResolver is required"))?,
        })
    }
}
