//! Daemon configuration.
//!
//! Resolution order: built-in defaults < YAML file < `FERRY_` environment
//! variables < CLI flags. The file is auto-generated with defaults when
//! missing, so a bare `ferryd run` works out of the box.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default config YAML path.
pub const DEFAULT_CONFIG_PATH: &str = "./ferry.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file path.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Settlement chain JSON-RPC endpoint.
    pub rpc_url: String,
    /// Blocks behind the tip considered settled.
    pub confirmations: u64,
    /// Whether queries may serve unconfirmed records.
    pub expose_unconfirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP bind address.
    pub listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is unset.
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryConfig {
    pub storage: StorageConfig,
    pub chain: ChainConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                path: "./data/ferry.db".to_string(),
            },
            chain: ChainConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                confirmations: 12,
                expose_unconfirmed: true,
            },
            api: ApiConfig {
                listen_addr: "127.0.0.1:7878".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl FerryConfig {
    /// Check the config before any component is built.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.path.is_empty() {
            bail!("storage.path must not be empty");
        }
        if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://")
        {
            bail!("chain.rpc_url must be an http(s) URL, got {:?}", self.chain.rpc_url);
        }
        self.api
            .listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("api.listen_addr {:?} is not a socket address", self.api.listen_addr))?;
        Ok(())
    }

    /// The bind address, already validated.
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.api.listen_addr.parse()?)
    }
}

/// Write a default config file.
pub fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let yaml = serde_yaml_string(&FerryConfig::default())?;
    std::fs::write(path, yaml)?;
    Ok(())
}

fn serde_yaml_string(config: &FerryConfig) -> anyhow::Result<String> {
    let c = config;
    Ok(format!(
        "storage:\n  path: {:?}\nchain:\n  rpc_url: {:?}\n  confirmations: {}\n  expose_unconfirmed: {}\napi:\n  listen_addr: {:?}\nobservability:\n  log_level: {:?}\n",
        c.storage.path,
        c.chain.rpc_url,
        c.chain.confirmations,
        c.chain.expose_unconfirmed,
        c.api.listen_addr,
        c.observability.log_level,
    ))
}

/// Create the config file with defaults when it does not exist yet.
pub fn ensure_config_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        write_default_config(path)?;
        tracing::info!(path = %path.display(), "wrote default config");
    }
    Ok(())
}

/// Layer defaults, the YAML file and `FERRY_` env vars. CLI overrides merge
/// on top at the call site.
pub fn build_figment(config_path: &Path) -> Figment {
    Figment::from(Serialized::defaults(FerryConfig::default()))
        .merge(Yaml::file(config_path))
        .merge(Env::prefixed("FERRY_").split("__"))
}
