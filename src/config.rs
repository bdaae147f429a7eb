use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads the service configuration from the process environment.
/// Call [`crate::bootstrap::init_env`] first so `.env` values are visible.
pub fn load() -> Result<AppConfig> {
    Ok(AppConfig {
        server: ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or("0.0.0.0".to_string()),
            port: parse_or("SERVER_PORT", 3000)?,
        },
        database: DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
        },
        auth: AuthConfig {
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 168)?,
        },
    })
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(server.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        let port: u16 = parse_or("MAIZE_MILL_TEST_UNSET_PORT", 3000).unwrap();
        assert_eq!(port, 3000);
    }
}
