//! Configuration for the analyzer tooling
//!
//! Everything a command needs (network selection, keyword tables, endpoints,
//! resolver tuning) lives in one [`AnalyzerConfig`] value that is passed down
//! explicitly. Defaults mirror the production deployment; a YAML file and a
//! handful of environment variables can override them.

use crate::error::{Result, StoremanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Selected network tag, also used as the log `type` filter
    pub network: String,
    pub networks: BTreeMap<String, NetworkConfig>,
    pub log_search: LogSearchConfig,
    pub resolver: ResolverConfig,
    pub result_dir: PathBuf,
    pub log_level: String,
}

/// Endpoints and log keywords for one network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Source chain JSON-RPC endpoint (origin transactions)
    pub src_rpc_url: String,
    /// Destination chain JSON-RPC endpoint (storeman lock transactions)
    pub dst_rpc_url: String,
    pub keywords: KeywordSets,
}

/// Phrase keywords ANDed into each log query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    pub success_mpc: Vec<String>,
    pub received_mpc: Vec<String>,
    pub dst_tx_hashes: Vec<String>,
    pub metrics: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSearchConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for LogSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSearchConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Batching and pacing of block timestamp lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub tx_batch_size: usize,
    pub block_batch_size: usize,
    /// Pause between transaction batches, keeps public providers from throttling us
    pub tx_batch_delay_ms: u64,
    pub block_batch_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Attempts per RPC call; 1 disables retries
    pub max_attempts: u32,
    pub retry_initial_interval_ms: u64,
    /// Cap on a single backoff delay
    pub retry_max_interval_ms: u64,
}

/// Which side of the bridge a hash belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSide {
    Src,
    Dst,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            "main".to_string(),
            NetworkConfig {
                src_rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
                dst_rpc_url: "https://gwan-ssl.wandevs.org:56891".to_string(),
                keywords: KeywordSets::for_storeman("storeman0xb03a7416e0793e77169845ca81303781096e4c03"),
            },
        );
        networks.insert(
            "test".to_string(),
            NetworkConfig {
                src_rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
                dst_rpc_url: "http://gwan-testnet.wandevs.org:36891".to_string(),
                keywords: KeywordSets::for_storeman("storeman0x5c770cbf582d770b93ca90adad7e6bd33fabc44c"),
            },
        );

        Self {
            network: "test".to_string(),
            networks,
            log_search: LogSearchConfig::default(),
            resolver: ResolverConfig::default(),
            result_dir: PathBuf::from("result"),
            log_level: "info".to_string(),
        }
    }
}

impl KeywordSets {
    fn for_storeman(storeman: &str) -> Self {
        Self {
            success_mpc: vec!["SignMpcTransaction".to_string(), "successfully".to_string()],
            received_mpc: Vec::new(),
            dst_tx_hashes: vec!["checkTransOnline checkHash".to_string(), storeman.to_string()],
            metrics: [
                "cpu_usage", "cpu_cores", "mem_total", "mem_used", "mem_free",
                "disk_total", "disk_used", "disk_usage", "load_avg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for LogSearchConfig {
    fn default() -> Self {
        Self {
            url: "http://log.wanchain.org:9200/_search".to_string(),
            username: None,
            password: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tx_batch_size: 50,
            block_batch_size: 20,
            tx_batch_delay_ms: 1000,
            block_batch_delay_ms: 2000,
            request_timeout_secs: 10,
            max_attempts: 1,
            retry_initial_interval_ms: 1000,
            retry_max_interval_ms: 30_000,
        }
    }
}

impl ResolverConfig {
    pub fn tx_batch_delay(&self) -> Duration {
        Duration::from_millis(self.tx_batch_delay_ms)
    }

    pub fn block_batch_delay(&self) -> Duration {
        Duration::from_millis(self.block_batch_delay_ms)
    }
}

impl AnalyzerConfig {
    /// Built-in defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// YAML file with environment overrides applied.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoremanError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then force the network when one is given.
    pub fn load(path: Option<&Path>, network: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        if let Some(network) = network {
            config.network = network.to_string();
            config.validate()?;
        }
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = lookup("STOREMAN_NETWORK") {
            self.network = network;
        }
        if let Some(url) = lookup("LOG_SEARCH_URL") {
            self.log_search.url = url;
        }
        if let Some(username) = lookup("LOG_SEARCH_USERNAME") {
            self.log_search.username = Some(username);
        }
        if let Some(password) = lookup("LOG_SEARCH_PASSWORD") {
            self.log_search.password = Some(password);
        }
        if let Some(dir) = lookup("RESULT_DIR") {
            self.result_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(attempts) = lookup("RPC_MAX_ATTEMPTS") {
            self.resolver.max_attempts = attempts
                .parse()
                .map_err(|e| StoremanError::Config(format!("Invalid RPC_MAX_ATTEMPTS: {}", e)))?;
        }

        let src = lookup("SRC_RPC_URL");
        let dst = lookup("DST_RPC_URL");
        if src.is_some() || dst.is_some() {
            let network = self.networks.get_mut(&self.network).ok_or_else(|| {
                StoremanError::Config(format!("Unknown network: {}", self.network))
            })?;
            if let Some(src) = src {
                network.src_rpc_url = src;
            }
            if let Some(dst) = dst {
                network.dst_rpc_url = dst;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.networks.contains_key(&self.network) {
            return Err(StoremanError::Config(format!(
                "Unknown network '{}', expected one of: {}",
                self.network,
                self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        }
        if self.resolver.tx_batch_size == 0 || self.resolver.block_batch_size == 0 {
            return Err(StoremanError::Config("Batch sizes must be positive".to_string()));
        }
        if self.resolver.max_attempts == 0 {
            return Err(StoremanError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.resolver.retry_max_interval_ms < self.resolver.retry_initial_interval_ms {
            return Err(StoremanError::Config(
                "retry_max_interval_ms must not be below retry_initial_interval_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration of the selected network.
    pub fn selected(&self) -> Result<&NetworkConfig> {
        self.networks
            .get(&self.network)
            .ok_or_else(|| StoremanError::Config(format!("Unknown network: {}", self.network)))
    }

    pub fn rpc_url(&self, side: ChainSide) -> Result<&str> {
        let network = self.selected()?;
        Ok(match side {
            ChainSide::Src => &network.src_rpc_url,
            ChainSide::Dst => &network.dst_rpc_url,
        })
    }
}
