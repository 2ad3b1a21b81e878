//! Ferry daemon.
//!
//! Serves the indexed transport records over HTTP. The store, the merged
//! read view and the settlement chain client are wired here; everything else
//! lives in the library crates.
//!
//! ```bash
//! # Start with defaults (config auto-generated at ./ferry.yaml)
//! ferryd run
//!
//! # Custom bind address and chain endpoint
//! ferryd run --listen-addr 0.0.0.0:7878 --rpc-url https://mainnet.example
//!
//! # Write the default config and exit
//! ferryd init
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ferry_api::{router, ApiState};
use ferry_index::{HttpChainClient, IndexView, PersistentRecordStore};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{build_figment, ensure_config_exists, FerryConfig, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "ferryd", about = "Rollup data-transport node", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the daemon.
    Run(RunArgs),
    /// Write the default config file and exit.
    Init(InitArgs),
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Config YAML path (auto-generated if missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level override
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Database file override
    #[arg(long)]
    db_path: Option<String>,

    /// HTTP bind address override
    #[arg(long)]
    listen_addr: Option<String>,

    /// Settlement chain JSON-RPC endpoint override
    #[arg(long)]
    rpc_url: Option<String>,

    /// Confirmation depth override
    #[arg(long)]
    confirmations: Option<u64>,

    /// Serve confirmed records only
    #[arg(long)]
    disable_unconfirmed: bool,
}

#[derive(Debug, Clone, Args)]
struct InitArgs {
    #[command(flatten)]
    common: CommonArgs,
}

/// Resolve a FerryConfig from: defaults < YAML < env vars < CLI flags.
fn resolve_config(args: &RunArgs) -> anyhow::Result<FerryConfig> {
    ensure_config_exists(&args.common.config)?;

    let mut figment = build_figment(&args.common.config);
    if let Some(ref v) = args.common.log_level {
        figment = figment.merge(("observability.log_level", v.as_str()));
    }
    if let Some(ref v) = args.db_path {
        figment = figment.merge(("storage.path", v.as_str()));
    }
    if let Some(ref v) = args.listen_addr {
        figment = figment.merge(("api.listen_addr", v.as_str()));
    }
    if let Some(ref v) = args.rpc_url {
        figment = figment.merge(("chain.rpc_url", v.as_str()));
    }
    if let Some(v) = args.confirmations {
        figment = figment.merge(("chain.confirmations", v));
    }
    if args.disable_unconfirmed {
        figment = figment.merge(("chain.expose_unconfirmed", false));
    }

    let config: FerryConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

fn init_tracing(log_level: &str) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    init_tracing(&config.observability.log_level);

    if let Some(parent) = std::path::Path::new(&config.storage.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Arc::new(PersistentRecordStore::new(&config.storage.path)?);
    tracing::info!(path = %config.storage.path, "opened record store");

    let view = Arc::new(IndexView::new(store, config.chain.expose_unconfirmed));
    let chain = Arc::new(HttpChainClient::new(config.chain.rpc_url.clone()));

    let state = ApiState {
        view,
        chain,
        confirmations: config.chain.confirmations,
    };

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, confirmations = config.chain.confirmations, "serving transport index");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::Init(args) => {
            config::write_default_config(&args.common.config)?;
            println!("wrote {}", args.common.config.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_config_applies_cli_overrides() {
        let dir = tempdir().expect("tempdir");
        let args = RunArgs {
            common: CommonArgs {
                config: dir.path().join("ferry.yaml"),
                log_level: Some("warn".to_string()),
            },
            db_path: Some("./other/ferry.db".to_string()),
            listen_addr: Some("127.0.0.1:9000".to_string()),
            rpc_url: None,
            confirmations: Some(3),
            disable_unconfirmed: true,
        };

        let config = resolve_config(&args).expect("resolve");
        assert_eq!(config.observability.log_level, "warn");
        assert_eq!(config.storage.path, "./other/ferry.db");
        assert_eq!(config.api.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.chain.confirmations, 3);
        assert!(!config.chain.expose_unconfirmed);
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:8545");
    }
}
