use crate::config::{DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PASS, DEFAULT_DB_USER};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Pure clap command definitions with zero business logic
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("db-host")
                .default_value(DEFAULT_DB_HOST)
                .env("DB_HOST")
                .help("database host")
                .long("db-host")
                .value_name("HOST"),
        )
        .arg(
            Arg::new("db-port")
                .default_value("5432")
                .env("DB_PORT")
                .help("database port")
                .long("db-port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("db-name")
                .default_value(DEFAULT_DB_NAME)
                .env("DB_NAME")
                .help("database name")
                .long("db-name")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("db-user")
                .default_value(DEFAULT_DB_USER)
                .env("DB_USER")
                .help("database user")
                .long("db-user")
                .value_name("USER"),
        )
        .arg(
            Arg::new("db-pass")
                .default_value(DEFAULT_DB_PASS)
                .env("DB_PASS")
                .help("database password")
                .hide_env_values(true)
                .hide_default_value(true)
                .long("db-pass")
                .value_name("PASSWORD"),
        )
        .arg(
            Arg::new("listen")
                .env("PGPROBE_LISTEN")
                .help("IP address to bind to (default: [::]:port, accepts both IPv6 and IPv4)")
                .long("listen")
                .long_help(
                    "IP address to bind to:\n\
                    Not specified (default) binds to [::]:port which accepts both IPv6 and IPv4 connections.\n\
                    Falls back to 0.0.0.0:port if IPv6 is unavailable.\n\n\
                    Specific IPv4 examples: '0.0.0.0', '127.0.0.1'\n\
                    Specific IPv6: '::', '::1'",
                )
                .short('l')
                .value_name("IP"),
        )
        .arg(
            Arg::new("port")
                .default_value("5000")
                .env("PGPROBE_PORT")
                .help("listening port for /, /health and /info")
                .long("port")
                .short('p')
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("connect-timeout")
                .default_value("5")
                .env("PGPROBE_CONNECT_TIMEOUT")
                .help("seconds to wait for the database connection before reporting unhealthy")
                .long("connect-timeout")
                .short('t')
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("tls-mode")
                .default_value("disable")
                .env("PGPROBE_TLS_MODE")
                .help("TLS/SSL mode: disable, require, verify-ca, verify-full")
                .long("tls-mode")
                .long_help(
                    "TLS/SSL connection mode for the probe connection:\n\n\
                    - disable: No TLS (default)\n\
                    - require: TLS required, no certificate verification\n\
                    - verify-ca: Verify server certificate against CA\n\
                    - verify-full: Verify certificate and hostname",
                )
                .value_name("MODE")
                .value_parser(["disable", "require", "verify-ca", "verify-full"])
                .ignore_case(true),
        )
        .arg(
            Arg::new("tls-ca")
                .env("PGPROBE_TLS_CA")
                .help("Path to CA certificate file for TLS verification")
                .long("tls-ca")
                .long_help(
                    "Path to Certificate Authority (CA) certificate file.\n\
                    Used by verify-ca and verify-full modes.\n\n\
                    Example: /etc/ssl/certs/ca-certificates.crt",
                )
                .value_name("PATH"),
        )
        .arg(
            Arg::new("verbose")
                .help("increase log verbosity, -v debug, -vv trace (RUST_LOG takes precedence)")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
}
