use crate::config::DatabaseConfig;
use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{ConnectOptions, Connection, postgres::PgConnection};
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use tracing::{debug, warn};

/// Side-effect free statement used to confirm the session answers
pub const VERIFICATION_QUERY: &str = "SELECT version()";

/// Overall service health
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Fixed mapping to the HTTP status of `/health`
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Healthy => StatusCode::OK,
            Self::Degraded => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// What the probe observed about the database
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    Connected,
    Error,
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("verification query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl ProbeError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::Query(_) => "query",
        }
    }
}

/// Outcome of one probe evaluation, built and discarded per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResult {
    pub status: HealthStatus,
    pub database: DatabaseState,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// JSON body of `/health`
#[derive(Serialize, Debug)]
pub struct HealthBody<'a> {
    status: HealthStatus,
    database: DatabaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_version: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    timestamp: String,
}

impl HealthResult {
    /// Map the raw probe outcome into the tri-state result.
    ///
    /// Connection faults never carry detail; query faults carry the driver
    /// message; a successful query carries the truncated version.
    #[must_use]
    pub fn from_outcome(outcome: Result<String, ProbeError>, timestamp: DateTime<Utc>) -> Self {
        let (status, database, detail) = match outcome {
            Ok(version) => (
                HealthStatus::Healthy,
                DatabaseState::Connected,
                Some(truncate_version(&version)),
            ),
            Err(ProbeError::Query(e)) => (
                HealthStatus::Degraded,
                DatabaseState::Error,
                Some(query_error_message(&e)),
            ),
            Err(ProbeError::Connect(_) | ProbeError::Timeout(_)) => {
                (HealthStatus::Unhealthy, DatabaseState::Disconnected, None)
            }
        };

        Self {
            status,
            database,
            detail,
            timestamp,
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status.status_code()
    }

    #[must_use]
    pub fn body(&self) -> HealthBody<'_> {
        let detail = self.detail.as_deref();
        HealthBody {
            status: self.status,
            database: self.database,
            db_version: detail
                .filter(|_| self.database == DatabaseState::Connected)
                .map(|v| v.split_whitespace().collect()),
            error: detail.filter(|_| self.database == DatabaseState::Error),
            timestamp: iso8601(self.timestamp),
        }
    }
}

/// Server message for database errors, the full sqlx text otherwise
#[must_use]
pub fn query_error_message(error: &sqlx::Error) -> String {
    error
        .as_database_error()
        .map_or_else(|| error.to_string(), |db| db.message().to_string())
}

/// Keep the first two whitespace-delimited tokens, e.g. `PostgreSQL 16.3`
#[must_use]
pub fn truncate_version(version: &str) -> String {
    version.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

#[must_use]
pub fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// On-demand check of the configured database.
///
/// Every call opens and closes its own connection; nothing is cached and no
/// state is shared between evaluations.
#[derive(Debug, Clone, Copy)]
pub struct HealthProbe<'a> {
    database: &'a DatabaseConfig,
}

impl<'a> HealthProbe<'a> {
    #[must_use]
    pub const fn new(database: &'a DatabaseConfig) -> Self {
        Self { database }
    }

    /// Evaluate database health. Never fails: every fault becomes a result.
    pub async fn evaluate(&self) -> HealthResult {
        let outcome = self.check().await;

        match &outcome {
            Ok(version) => debug!(
                host = %self.database.host,
                version = %version,
                "database probe succeeded"
            ),
            Err(e) => warn!(
                host = %self.database.host,
                kind = e.kind(),
                error = %e,
                "database probe failed"
            ),
        }

        HealthResult::from_outcome(outcome, Utc::now())
    }

    async fn check(&self) -> Result<String, ProbeError> {
        let mut conn = self.connect().await?;

        let version = sqlx::query_scalar::<_, String>(VERIFICATION_QUERY)
            .fetch_one(&mut conn)
            .await
            .map_err(ProbeError::Query);

        // released on both query outcomes
        if let Err(e) = conn.close().await {
            debug!(error = %e, "failed to close probe connection");
        }

        version
    }

    async fn connect(&self) -> Result<PgConnection, ProbeError> {
        let options = self.database.connect_options();
        let timeout = self.database.connect_timeout;

        match time::timeout(timeout, options.connect()).await {
            Ok(conn) => conn.map_err(ProbeError::Connect),
            Err(_) => Err(ProbeError::Timeout(timeout)),
        }
    }
}
