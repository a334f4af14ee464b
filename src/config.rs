use crate::tls::TlsConfig;
use sqlx::postgres::PgConnectOptions;
use std::{fmt, net::IpAddr, time::Duration};

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "testdb";
pub const DEFAULT_DB_USER: &str = "testuser";
pub const DEFAULT_DB_PASS: &str = "testpass";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Database target used by the health probe
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub tls: TlsConfig,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            name: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASS.to_string(),
            tls: TlsConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// password stays out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"********")
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build the sqlx connect options for a single probe connection
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name);

        self.tls.apply(options)
    }

    /// `user@host/name`, the form printed at startup
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}/{}", self.user, self.host, self.name)
    }
}

/// Process-wide configuration, built once at startup and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub listen: Option<IpAddr>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DatabaseConfig::default())
    }
}

impl Config {
    #[must_use]
    pub fn new(database: DatabaseConfig) -> Self {
        Self {
            database,
            listen: None,
            port: DEFAULT_PORT,
        }
    }
}
