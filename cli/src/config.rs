//! CLI Configuration
//!
//! Handles loading and saving `shade.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shade_cfmm::{MarketConfig, TokenConfig};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadeConfig {
    #[serde(default)]
    pub market: MarketSettings,

    #[serde(default)]
    pub accounts: AccountSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ShadeConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            chain_id: self.market.chain_id,
            token_a: TokenConfig {
                name: self.market.token_a_name.clone(),
                symbol: self.market.token_a_symbol.clone(),
            },
            token_b: TokenConfig {
                name: self.market.token_b_name.clone(),
                symbol: self.market.token_b_symbol.clone(),
            },
            pool_name: self.market.pool_name.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.signers.is_empty() {
            return Err(ConfigError::Invalid("At least one signer is required".to_string()));
        }

        if self.accounts.signers.iter().any(|s| *s == self.accounts.deployer) {
            return Err(ConfigError::Invalid("Deployer cannot also be a trading signer".to_string()));
        }

        let funded = self.accounts.initial_mint.checked_mul(self.accounts.signers.len() as u64);
        if funded.map_or(true, |total| total > u32::MAX as u64) {
            return Err(ConfigError::Invalid("Initial mint exceeds the 32-bit supply".to_string()));
        }

        if self.market.token_a_symbol == self.market.token_b_symbol {
            return Err(ConfigError::Invalid("Token symbols must differ".to_string()));
        }

        Ok(())
    }
}

/// Deployment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSettings {
    pub chain_id: u64,
    pub token_a_name: String,
    pub token_a_symbol: String,
    pub token_b_name: String,
    pub token_b_symbol: String,
    pub pool_name: String,
}

impl Default for MarketSettings {
    fn default() -> Self {
        let market = MarketConfig::default();
        Self {
            chain_id: market.chain_id,
            token_a_name: market.token_a.name,
            token_a_symbol: market.token_a.symbol,
            token_b_name: market.token_b.name,
            token_b_symbol: market.token_b.symbol,
            pool_name: market.pool_name,
        }
    }
}

/// Development signers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Label of the signer that deploys and owns both ledgers
    pub deployer: String,

    /// Labels of the trading signers
    pub signers: Vec<String>,

    /// Amount of each token given to every signer at init
    pub initial_mint: u64,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            deployer: "deployer".to_string(),
            signers: ["alice", "bob", "carol", "dave"].iter().map(|s| s.to_string()).collect(),
            initial_mint: 1_000_000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,

    /// Output format (text, json)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("network", "shade", "shade")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".shade"))
}

/// Get default config file path
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("shade.toml")
}
