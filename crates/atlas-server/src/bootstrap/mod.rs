use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::ports::selection::SelectionCache;
use crate::infrastructure::connection::NatsConnectionManager;
use crate::infrastructure::di_container::InfrastructureDiContainer;
use crate::infrastructure::persistence::SqliteStore;
use crate::infrastructure::selection::{MemorySelectionCache, NatsSelectionCache};
use crate::interface::http::{create_router, AppState};
use atlas_core::config::{AtlasConfig, SelectionBackend, StoreConfig};
use atlas_core::shutdown::GracefulShutdown;

/// 过期选择的清理周期
const SELECTION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// 服务器启动器 - 负责整个应用程序的引导过程
pub struct ServerBootstrapper {
    config: AtlasConfig,
    shutdown: GracefulShutdown,
}

/// 运行中的服务器实例
pub struct RunningServer {
    shutdown: GracefulShutdown,
    http_handle: JoinHandle<Result<()>>,
    background: Vec<JoinHandle<()>>,
}

impl ServerBootstrapper {
    /// 创建新的服务器启动器
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            shutdown: GracefulShutdown::new(),
        }
    }

    /// 启动服务器，返回运行中的实例
    pub async fn start(self) -> Result<RunningServer> {
        info!(
            listen_addr = %self.config.listen_addr,
            data_dir = %self.config.data_dir.display(),
            "Atlas Server starting"
        );

        self.setup_signal_handler();

        let store = self.open_store()?;
        let mut background = Vec::new();
        let selection_cache = self.initialize_selection_cache(&mut background).await?;

        let di_container =
            InfrastructureDiContainer::new(store, selection_cache, self.config.auth.clone());
        let context = di_container
            .create_application_context()
            .context("Failed to build application context")?;
        let router = create_router(AppState::new(context));

        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.listen_addr))?;
        info!(addr = %self.config.listen_addr, "HTTP server listening");

        let token = self.shutdown.child_token();
        let http_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .context("HTTP server terminated unexpectedly")
        });

        info!("Atlas Server started successfully");
        Ok(RunningServer {
            shutdown: self.shutdown,
            http_handle,
            background,
        })
    }

    /// 设置信号处理器
    fn setup_signal_handler(&self) {
        let shutdown_signal = self.shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal.wait_for_signal().await;
        });
    }

    /// 打开关系存储并执行迁移
    fn open_store(&self) -> Result<Arc<SqliteStore>> {
        let path = self.config.database_path();
        let store = if StoreConfig::is_memory_path(&path) {
            warn!("Using in-memory database, data will be lost on shutdown");
            SqliteStore::open_in_memory()
        } else {
            info!(path = %path.display(), "Opening asset database");
            SqliteStore::open(&path)
        }
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Ok(Arc::new(store))
    }

    /// 初始化批量选择缓存
    async fn initialize_selection_cache(
        &self,
        background: &mut Vec<JoinHandle<()>>,
    ) -> Result<Arc<dyn SelectionCache>> {
        let ttl = Duration::from_secs(self.config.selection.ttl_sec);
        match self.config.selection.backend {
            SelectionBackend::Memory => {
                let cache = Arc::new(MemorySelectionCache::new(ttl));
                background.push(spawn_purge_task(
                    cache.clone(),
                    self.shutdown.child_token(),
                ));
                info!(ttl_sec = ttl.as_secs(), "Selection cache: in-process");
                Ok(cache)
            }
            SelectionBackend::Nats => {
                let jetstream = NatsConnectionManager::create_jetstream(&self.config.nats).await?;
                let cache = NatsSelectionCache::new(&jetstream, ttl)
                    .await
                    .context("Failed to initialize NATS selection cache")?;
                info!(ttl_sec = ttl.as_secs(), "Selection cache: NATS KV");
                Ok(Arc::new(cache))
            }
        }
    }
}

fn spawn_purge_task(
    cache: Arc<MemorySelectionCache>,
    token: tokio_util::sync::CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SELECTION_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => cache.purge_expired(),
            }
        }
    })
}

impl RunningServer {
    /// 等待关闭信号并执行优雅停机
    pub async fn wait_for_shutdown(self) -> Result<()> {
        let mut http_handle = self.http_handle;
        let exited_early = tokio::select! {
            _ = self.shutdown.token.cancelled() => None,
            res = &mut http_handle => Some(res),
        };

        let result = match exited_early {
            Some(res) => {
                // 服务提前退出时同样通知后台任务
                self.shutdown.trigger();
                res
            }
            None => http_handle.await,
        };
        result.context("HTTP server task panicked")??;

        for handle in self.background {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }

        info!("Atlas Server shut down gracefully.");
        Ok(())
    }
}
