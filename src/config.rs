use crate::errors::AppError;
use crate::helper::get_env_value_by_key;
use crate::storage::remote::is_valid_url;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_CACHE_PATH: &str = "./.instance/paybook.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_TRANSFER_DELAY_MS: u64 = 1_500;
pub const DEFAULT_NETWORK: &str = "sepolia";
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub cache_path: String,
    pub timeout: Duration,
    pub transfer_delay: Duration,
    pub validate_addresses: bool,
    pub wallet_address: String,
    pub user_email: Option<String>,
    pub network: String,
    pub token_address: String,
    pub token_decimals: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_path: DEFAULT_CACHE_PATH.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            transfer_delay: Duration::from_millis(DEFAULT_TRANSFER_DELAY_MS),
            validate_addresses: true,
            wallet_address: String::new(),
            user_email: None,
            network: DEFAULT_NETWORK.to_string(),
            token_address: String::new(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl Config {
    /// Reads `PAYBOOK_*` variables (a `.env` file is honoured) on top of
    /// the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Config::default();

        if let Ok(url) = get_env_value_by_key("PAYBOOK_API_URL") {
            config.api_url = url;
        }
        if let Ok(path) = get_env_value_by_key("PAYBOOK_CACHE_PATH") {
            config.cache_path = path;
        }
        if let Ok(ms) = get_env_value_by_key("PAYBOOK_TIMEOUT_MS") {
            config.timeout = Duration::from_millis(parse_number("PAYBOOK_TIMEOUT_MS", &ms)?);
        }
        if let Ok(ms) = get_env_value_by_key("PAYBOOK_TRANSFER_DELAY_MS") {
            config.transfer_delay =
                Duration::from_millis(parse_number("PAYBOOK_TRANSFER_DELAY_MS", &ms)?);
        }
        if let Ok(flag) = get_env_value_by_key("PAYBOOK_VALIDATE_ADDRESSES") {
            config.validate_addresses = parse_flag("PAYBOOK_VALIDATE_ADDRESSES", &flag)?;
        }
        if let Ok(address) = get_env_value_by_key("PAYBOOK_WALLET_ADDRESS") {
            config.wallet_address = address;
        }
        config.user_email = get_env_value_by_key("PAYBOOK_USER_EMAIL")
            .ok()
            .filter(|e| !e.trim().is_empty());
        if let Ok(network) = get_env_value_by_key("PAYBOOK_NETWORK") {
            config.network = network;
        }
        if let Ok(token) = get_env_value_by_key("PAYBOOK_TOKEN_ADDRESS") {
            config.token_address = token;
        }
        if let Ok(decimals) = get_env_value_by_key("PAYBOOK_TOKEN_DECIMALS") {
            config.token_decimals = parse_number("PAYBOOK_TOKEN_DECIMALS", &decimals)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_url(&self.api_url) {
            return Err(AppError::Config(format!("invalid api url: {}", self.api_url)));
        }
        if self.timeout.is_zero() {
            return Err(AppError::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("{} must be a whole number: {}", key, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("{} is not a flag: {}", key, other))),
    }
}
