use anyhow::Result;
use clap::Parser;

use atlas_core::config::AtlasConfig;
use atlas_server::bootstrap::ServerBootstrapper;

#[derive(Parser)]
#[command(name = "atlas-server")]
#[command(about = "Atlas Server - asset inventory console")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from atlas.toml plus ATLAS__ overrides.
    let cfg: AtlasConfig = AtlasConfig::load_config(args.config.as_deref())?;

    // 初始化遥测
    atlas_core::telemetry::init_tracing_with(&cfg.telemetry);

    if let Some(path) = args.config.as_deref() {
        tracing::info!("Loaded config file: {}", path);
    } else {
        tracing::info!("Config: using default search (current dir)");
    }
    tracing::info!("Effective database: {}", cfg.database_path().display());
    tracing::info!("Effective HTTP listen: {}", cfg.listen_addr);

    // 创建并启动服务器
    let bootstrapper = ServerBootstrapper::new(cfg);
    let running_server = bootstrapper.start().await?;

    // 等待关闭信号
    running_server.wait_for_shutdown().await
}
