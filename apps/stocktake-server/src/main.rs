use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stocktake_config::load_config;
use stocktake_server::run_server;

#[derive(Debug, Parser)]
#[command(name = "stocktake-server")]
struct Args {
    #[arg(long, default_value = "configs/stocktake.yaml")]
    config: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8002")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("load config from {} failed", args.config.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run_server(config, args.listen).await
}
