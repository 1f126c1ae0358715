use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 优雅停机管理器
#[derive(Debug, Clone, Default)]
pub struct GracefulShutdown {
    /// 取消令牌，用于通知所有任务停止
    pub token: CancellationToken,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// 等待停机信号（SIGINT, SIGTERM）
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            biased;
            _ = ctrl_c => {
                info!("Received Ctrl+C signal");
            }
            _ = terminate => {
                info!("Received SIGTERM signal");
            }
            _ = self.token.cancelled() => {
                info!("Shutdown requested internally");
            }
        }

        info!("Initiating graceful shutdown...");
        self.token.cancel();
    }

    /// 创建一个子令牌，用于特定的任务
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 主动触发停机
    pub fn trigger(&self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_children() {
        let shutdown = GracefulShutdown::new();
        let child = shutdown.child_token();
        assert!(!shutdown.is_cancelled());

        shutdown.trigger();

        assert!(shutdown.is_cancelled());
        child.cancelled().await;
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_for_signal_returns_on_trigger() {
        let shutdown = GracefulShutdown::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_signal().await });
        shutdown.trigger();
        handle.await.unwrap();
    }
}
