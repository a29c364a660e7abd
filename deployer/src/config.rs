// deployer/src/config.rs

use dotenv::dotenv;
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
/// Account #0 of the Hardhat / Anvil development mnemonic. Public test key, never funded on a real chain.
pub const DEFAULT_DEPLOYER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_CONTRACT_NAME: &str = "FimboToken";
pub const DEFAULT_UNLOCK_DELAY_SECS: i64 = 60;
pub const DEFAULT_LOCKED_AMOUNT_ETH: &str = "0.001";
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("CONFIRMATIONS must be at least 1")]
    ZeroConfirmations,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Network & Keys
    pub rpc_url: String,
    pub deployer_private_key: String,
    pub poll_interval: Duration,

    // Contract
    pub artifacts_dir: PathBuf,
    pub contract_name: String,

    // Lock parameters
    pub unlock_delay_secs: i64,
    pub locked_amount_eth: String,

    // Confirmation
    pub confirmations: usize,
    pub confirmation_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            deployer_private_key: DEFAULT_DEPLOYER_KEY.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            unlock_delay_secs: DEFAULT_UNLOCK_DELAY_SECS,
            locked_amount_eth: DEFAULT_LOCKED_AMOUNT_ETH.to_string(),
            confirmations: DEFAULT_CONFIRMATIONS,
            confirmation_timeout: None,
        }
    }
}

impl Config {
    /// Builds a config from an arbitrary variable source. Unset or blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse_num = |name: &'static str, expected: &'static str| -> Result<Option<u64>, ConfigError> {
            match var(name) {
                Some(value) => value.parse::<u64>().map(Some).map_err(|_| ConfigError::Invalid {
                    var: name,
                    expected,
                    value,
                }),
                None => Ok(None),
            }
        };

        let mut config = Config::default();

        if let Some(url) = var("RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(key) = var("DEPLOYER_PRIVATE_KEY") {
            config.deployer_private_key = key;
        }
        if let Some(ms) = parse_num("POLL_INTERVAL_MS", "number of milliseconds")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(dir) = var("ARTIFACTS_DIR") {
            config.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(name) = var("CONTRACT_NAME") {
            config.contract_name = name;
        }
        if let Some(delay) = var("UNLOCK_DELAY_SECS") {
            config.unlock_delay_secs = delay.parse::<i64>().map_err(|_| ConfigError::Invalid {
                var: "UNLOCK_DELAY_SECS",
                expected: "number of seconds",
                value: delay,
            })?;
        }
        if let Some(amount) = var("LOCKED_AMOUNT_ETH") {
            config.locked_amount_eth = amount;
        }
        if let Some(confs) = parse_num("CONFIRMATIONS", "confirmation count")? {
            if confs == 0 {
                return Err(ConfigError::ZeroConfirmations);
            }
            config.confirmations = confs as usize;
        }
        config.confirmation_timeout =
            parse_num("CONFIRMATION_TIMEOUT_SECS", "number of seconds")?.map(Duration::from_secs);

        Ok(config)
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    info!("Loading configuration from environment (.env optional)...");
    dotenv().ok();

    let config = Config::from_lookup(|name| env::var(name).ok())?;

    info!(
        rpc_url = %config.rpc_url,
        contract = %config.contract_name,
        artifacts = %config.artifacts_dir.display(),
        "Configuration loaded."
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_reproduces_script_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.contract_name, "FimboToken");
        assert_eq!(config.unlock_delay_secs, 60);
        assert_eq!(config.locked_amount_eth, "0.001");
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.confirmations, 1);
        assert!(config.confirmation_timeout.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("CONTRACT_NAME", "contracts/Lock.sol:Lock"),
            ("UNLOCK_DELAY_SECS", "3600"),
            ("LOCKED_AMOUNT_ETH", "1.5"),
            ("CONFIRMATIONS", "3"),
            ("CONFIRMATION_TIMEOUT_SECS", "120"),
            ("POLL_INTERVAL_MS", "10"),
        ])
        .unwrap();
        assert_eq!(config.contract_name, "contracts/Lock.sol:Lock");
        assert_eq!(config.unlock_delay_secs, 3600);
        assert_eq!(config.locked_amount_eth, "1.5");
        assert_eq!(config.confirmations, 3);
        assert_eq!(config.confirmation_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = from_pairs(&[("CONTRACT_NAME", "   "), ("RPC_URL", "")]).unwrap();
        assert_eq!(config.contract_name, DEFAULT_CONTRACT_NAME);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = from_pairs(&[("UNLOCK_DELAY_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "UNLOCK_DELAY_SECS", .. }));

        let err = from_pairs(&[("CONFIRMATIONS", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CONFIRMATIONS", .. }));
    }

    #[test]
    fn zero_confirmations_is_rejected() {
        let err = from_pairs(&[("CONFIRMATIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroConfirmations));
    }
}
