//! Application configuration.
//!
//! All connection parameters are loaded once per process from the environment
//! and passed explicitly to the components that need them.

use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Process-wide application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    pub host: String,

    /// Listen port for the HTTP server.
    pub port: u16,

    /// Connect timeout for database operations, in seconds.
    pub connect_timeout_secs: u64,

    /// Target database connection parameters.
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Loads the configuration from the environment, falling back to
    /// development defaults for anything unset.
    pub fn load() -> Self {
        Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_parse_or("SERVER_PORT", 8080),
            connect_timeout_secs: env_parse_or("CONNECT_TIMEOUT_SECS", 30),
            database: DatabaseConfig::load(),
        }
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Connection parameters for the target PostgreSQL database.
///
/// Immutable after construction; held by the data access component for its
/// lifetime.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl DatabaseConfig {
    /// Loads the database parameters from the environment.
    pub fn load() -> Self {
        Self {
            host: env_or("DB_HOST", "localhost"),
            port: env_parse_or("DB_PORT", 5432),
            username: env_or("DB_USER", "postgres"),
            password: env_or("DB_PASSWORD", ""),
            database: env_or("DB_NAME", "postgres"),
        }
    }

    /// Returns a copy of these parameters pointing at a different database
    /// on the same server.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    /// Builds sqlx connect options from these parameters.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_overrides_only_the_name() {
        let base = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 5433,
            username: "svc".to_string(),
            password: "secret".to_string(),
            database: "main".to_string(),
        };

        let other = base.with_database("reporting");
        assert_eq!(other.database, "reporting");
        assert_eq!(other.host, base.host);
        assert_eq!(other.port, base.port);
        assert_eq!(other.username, base.username);
        assert_eq!(other.password, base.password);
    }
}
