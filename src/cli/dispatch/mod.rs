use crate::{
    cli::actions::Action,
    config::{Config, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DB_PORT, DEFAULT_PORT, DatabaseConfig},
    tls::{TlsConfig, TlsMode},
};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use std::{net::IpAddr, path::PathBuf, time::Duration};

fn string_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("{id} is required"))
}

/// Extract TLS configuration for the probe connection
fn extract_tls_config(matches: &ArgMatches) -> Result<TlsConfig> {
    let mode = matches
        .get_one::<String>("tls-mode")
        .map(|m| m.parse::<TlsMode>().map_err(|e| anyhow!(e)))
        .transpose()?
        .unwrap_or_default();

    let ca = matches.get_one::<String>("tls-ca").map(PathBuf::from);

    Ok(TlsConfig { mode, ca })
}

/// Convert `ArgMatches` into typed Action enum with validation
///
/// # Errors
///
/// Returns an error if the listen address or TLS mode is invalid
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let database = DatabaseConfig {
        host: string_arg(matches, "db-host")?,
        port: matches
            .get_one::<u16>("db-port")
            .copied()
            .unwrap_or(DEFAULT_DB_PORT),
        name: string_arg(matches, "db-name")?,
        user: string_arg(matches, "db-user")?,
        password: string_arg(matches, "db-pass")?,
        tls: extract_tls_config(matches)?,
        connect_timeout: matches
            .get_one::<u64>("connect-timeout")
            .copied()
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs),
    };

    // Extract and validate listen address
    let listen = matches
        .get_one::<String>("listen")
        .map(|addr| {
            addr.parse::<IpAddr>()
                .with_context(|| format!("Invalid IP address: {addr}"))
        })
        .transpose()?;

    let port = matches.get_one::<u16>("port").copied().unwrap_or(DEFAULT_PORT);

    Ok(Action::Serve {
        config: Config {
            database,
            listen,
            port,
        },
    })
}
