use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Rpc {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_rpc_url() -> String {
    "https://public-node.rsk.co".to_string()
}
fn default_rpc_timeout_ms() -> u64 {
    10_000
}

impl Default for Rpc {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Contracts {
    #[serde(default = "default_rns_registry")]
    pub rns_registry: String,
    #[serde(default = "default_staking_token")]
    pub staking_token: String,
    #[serde(default = "default_staking_token_decimals")]
    pub staking_token_decimals: u32,
    /// Contracts whose successful use counts as evidence of a name registration.
    #[serde(default = "default_registration_contracts")]
    pub registration_contracts: Vec<String>,
}

fn default_rns_registry() -> String {
    "0xcb868aeabd31e2b66f74e9a55cf064abb31a4ad5".to_string()
}
fn default_staking_token() -> String {
    "0x5db91e24bd32059584bbdb831a901f1199f3d459".to_string()
}
fn default_staking_token_decimals() -> u32 {
    18
}
fn default_registration_contracts() -> Vec<String> {
    // RNS FIFS address registrar
    vec!["0xd9c79ced86ecf49f5e4a973594634c83197c35ab".to_string()]
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            rns_registry: default_rns_registry(),
            staking_token: default_staking_token(),
            staking_token_decimals: default_staking_token_decimals(),
            registration_contracts: default_registration_contracts(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Indexers {
    /// Blockscout instance used for transaction history. Empty disables it.
    #[serde(default = "default_blockscout_url")]
    pub blockscout_url: String,
    /// Direct name lookup endpoint, `{address}` is substituted. Empty disables it.
    #[serde(default)]
    pub name_lookup_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Per-indexer request budget, 0 disables rate limiting.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_blockscout_url() -> String {
    "https://rootstock.blockscout.com".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    200
}
fn default_backoff_max_ms() -> u64 {
    5000
}
fn default_requests_per_second() -> u32 {
    5
}
fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Default for Indexers {
    fn default() -> Self {
        Self {
            blockscout_url: default_blockscout_url(),
            name_lookup_url: String::new(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            requests_per_second: default_requests_per_second(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl Indexers {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriceSettings {
    #[serde(default = "default_price_api_url")]
    pub api_url: String,
    #[serde(default = "default_price_token_id")]
    pub token_id: String,
    /// Bootstrap quote served until the first successful fetch.
    #[serde(default = "default_price_value_usd")]
    pub default_value_usd: f64,
    #[serde(default = "default_price_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_price_api_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}
fn default_price_token_id() -> String {
    "rif-token".to_string()
}
fn default_price_value_usd() -> f64 {
    0.078623
}
fn default_price_ttl_seconds() -> u64 {
    24 * 60 * 60
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            api_url: default_price_api_url(),
            token_id: default_price_token_id(),
            default_value_usd: default_price_value_usd(),
            ttl_seconds: default_price_ttl_seconds(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    #[serde(default = "default_network")]
    pub network: String,
}

fn default_network() -> String {
    "mainnet".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            network: default_network(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub rpc: Rpc,
    #[serde(default)]
    pub contracts: Contracts,
    #[serde(default)]
    pub indexers: Indexers,
    #[serde(default)]
    pub price: PriceSettings,
    #[serde(default)]
    pub service: ServiceSettings,
}

impl Settings {
    /// Load `Config.toml` from the working directory (optional) plus `SDK_*` overrides.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Config.toml")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env("SDK_RPC_URL") {
            self.rpc.url = v;
        }
        if let Some(v) = non_empty_env("SDK_BLOCKSCOUT_URL") {
            self.indexers.blockscout_url = v;
        }
        if let Some(v) = non_empty_env("SDK_NAME_LOOKUP_URL") {
            self.indexers.name_lookup_url = v;
        }
        if let Some(v) = non_empty_env("SDK_PRICE_API_URL") {
            self.price.api_url = v;
        }
        if let Some(v) = non_empty_env("SDK_NETWORK") {
            self.service.network = v;
        }
        if let Some(raw) = non_empty_env("SDK_REGISTRATION_CONTRACTS") {
            if let Some(list) = parse_string_list(&raw) {
                if !list.is_empty() {
                    self.contracts.registration_contracts = list;
                }
            }
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts either a JSON array of strings or a plain comma separated list.
fn parse_string_list(input: &str) -> Option<Vec<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(vec![]);
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).ok();
    }

    Some(
        trimmed
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}
