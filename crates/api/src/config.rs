//! Process configuration, read once at startup.

use std::net::SocketAddr;

use coffeeshop_auth::{AuthConfig, ConfigError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Token settings (see [`AuthConfig::from_env`]) plus `BIND_ADDR`,
    /// `DATABASE_URL` and `DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let auth = AuthConfig::from_lookup(&lookup)?;

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e| ConfigError::Invalid {
            var: "BIND_ADDR",
            reason: format!("{e}"),
        })?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            auth,
            bind_addr,
            database_url: get("DATABASE_URL"),
            db_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    const AUTH: [(&str, &str); 2] = [("AUTH0_DOMAIN", "coffee.auth0.com"), ("API_AUDIENCE", "drinks")];

    #[test]
    fn defaults_to_in_memory_on_port_8080() {
        let config = AppConfig::from_lookup(lookup(&AUTH)).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.auth.audience, "drinks");
    }

    #[test]
    fn reads_bind_addr_and_database_url() {
        let vars = [
            AUTH[0],
            AUTH[1],
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("DATABASE_URL", "postgres://localhost/coffee"),
            ("DB_MAX_CONNECTIONS", "12"),
        ];
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/coffee"));
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let vars = [AUTH[0], AUTH[1], ("BIND_ADDR", "localhost")];
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BIND_ADDR", .. }));
    }

    #[test]
    fn auth_settings_are_still_required() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AUTH0_DOMAIN"));
    }
}
