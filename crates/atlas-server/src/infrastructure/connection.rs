use anyhow::{Context, Result};
use async_nats::ConnectOptions;
use atlas_core::config::NatsConfig;
use tracing::info;

/// NATS 连接管理器
pub struct NatsConnectionManager;

impl NatsConnectionManager {
    /// 创建 NATS 连接；配置了 credentials 文件时一并加载
    pub async fn connect(nats_config: &NatsConfig) -> Result<async_nats::Client> {
        let nats_url = nats_config.url.as_str();
        info!("Connecting to NATS at: {}", nats_url);

        let mut connect_options = ConnectOptions::new()
            .name("atlas-server")
            .retry_on_initial_connect();

        if let Some(creds_file) = &nats_config.creds_file {
            if creds_file.exists() {
                connect_options = connect_options.credentials_file(creds_file.clone()).await?;
                info!("Added credentials file: {}", creds_file.display());
            }
        }

        let client = connect_options
            .connect(nats_url)
            .await
            .with_context(|| format!("Failed to connect to NATS at {}", nats_url))?;

        info!("Successfully connected to NATS");
        Ok(client)
    }

    /// 创建 JetStream 上下文
    pub async fn create_jetstream(
        nats_config: &NatsConfig,
    ) -> Result<async_nats::jetstream::Context> {
        let client = Self::connect(nats_config).await?;
        Ok(async_nats::jetstream::new(client))
    }
}
