use std::{env, fmt::Display, str::FromStr};

use log::*;
use settlement_engine::{EngineConfig, PolicyMode};

const DEFAULT_RSE_HOST: &str = "127.0.0.1";
const DEFAULT_RSE_PORT: u16 = 8370;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Settings handed to the settlement engine
    pub engine: EngineConfig,
    /// The storefront's base URL, e.g. `https://shop.example.com`. Notification links are relative to it.
    pub storefront_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RSE_HOST.to_string(),
            port: DEFAULT_RSE_PORT,
            database_url: String::default(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            engine: EngineConfig::default(),
            storefront_url: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = EngineConfig::default();
        let host = env::var("RSE_HOST").ok().unwrap_or_else(|| DEFAULT_RSE_HOST.into());
        let port = parse_env("RSE_PORT", DEFAULT_RSE_PORT);
        let database_url = env::var("RSE_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ RSE_DATABASE_URL is not set. Please set it to the URL for the settlement database.");
            String::default()
        });
        let max_connections = parse_env("RSE_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let engine = EngineConfig::default()
            .with_online_policy_mode(parse_env("RSE_ONLINE_POLICY_MODE", defaults.online_policy_mode))
            .with_pos_policy_mode(parse_env("RSE_POS_POLICY_MODE", defaults.pos_policy_mode))
            .with_max_transaction_attempts(parse_env("RSE_MAX_TX_ATTEMPTS", defaults.max_transaction_attempts));
        let storefront_url = env::var("RSE_STOREFRONT_URL").ok().filter(|s| !s.trim().is_empty());
        if storefront_url.is_none() {
            info!("🪛️ RSE_STOREFRONT_URL is not set. Notification links will be relative paths.");
        }
        if engine.online_policy_mode == PolicyMode::Lenient {
            warn!("🪛️ Online orders will settle with the built-in loyalty policy if none has been configured.");
        }
        Self { host, port, database_url, max_connections, engine, storefront_url }
    }
}

/// Reads and parses an environment variable, falling back to `default` if it is missing or malformed.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => parse_value(name, &s, default),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

fn parse_value<T>(name: &str, value: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    value.trim().parse::<T>().unwrap_or_else(|e| {
        error!("🪛️ {value} is not a valid value for {name}. {e} Using the default, {default}, instead.");
        default
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        assert_eq!(parse_value("RSE_PORT", "8080", DEFAULT_RSE_PORT), 8080);
        assert_eq!(parse_value("RSE_PORT", "eighty", DEFAULT_RSE_PORT), DEFAULT_RSE_PORT);
        assert_eq!(parse_value("RSE_POS_POLICY_MODE", " Strict ", PolicyMode::Lenient), PolicyMode::Strict);
        assert_eq!(parse_value("RSE_POS_POLICY_MODE", "loose", PolicyMode::Lenient), PolicyMode::Lenient);
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.engine.online_policy_mode, PolicyMode::Strict);
        assert_eq!(config.engine.pos_policy_mode, PolicyMode::Lenient);
        assert!(config.storefront_url.is_none());
    }
}
