use std::env;
use std::net::SocketAddr;

use crate::models::CurrencyCode;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/convention_crasher";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Currency used when previewing prices not yet tied to a convention.
    pub default_currency: CurrencyCode,
    pub cors_allowed_origins: Option<String>,
    /// Enables HSTS; set when `RUST_ENV=production`.
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            default_currency: CurrencyCode::usd(),
            cors_allowed_origins: None,
            production: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unparseable values fall back
    /// to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|e| {
                tracing::warn!("Config: invalid BIND_ADDR ({}), using {}", e, DEFAULT_BIND_ADDR);
                defaults.bind_addr
            });

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Config: invalid DATABASE_MAX_CONNECTIONS '{}', using {}",
                    raw,
                    DEFAULT_MAX_CONNECTIONS
                );
                DEFAULT_MAX_CONNECTIONS
            }),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let default_currency = match lookup("DEFAULT_CURRENCY") {
            Some(raw) => CurrencyCode::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!("Config: {}, using USD", e);
                CurrencyCode::usd()
            }),
            None => defaults.default_currency,
        };

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr,
            max_connections,
            default_currency,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
            production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.default_currency, CurrencyCode::usd());
        assert!(!config.production);
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/cc"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DEFAULT_CURRENCY", "cad"),
            ("RUST_ENV", "Production"),
        ]));
        assert_eq!(config.database_url, "postgres://db/cc");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.default_currency.as_str(), "CAD");
        assert!(config.production);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIND_ADDR", "nowhere"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("DEFAULT_CURRENCY", "dollars"),
        ]));
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.default_currency, CurrencyCode::usd());
    }
}
