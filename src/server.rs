use crate::{
    config::Config,
    probe::{HealthProbe, iso8601},
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use std::{
    future,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

pub const ENDPOINTS: [&str; 3] = [
    "/ - Homepage",
    "/health - Health check",
    "/info - This page",
];

#[derive(Serialize, Debug)]
struct Home {
    service: &'static str,
    message: String,
    timestamp: String,
    status: &'static str,
}

#[derive(Serialize, Debug)]
struct Info {
    python_version: &'static str,
    flask_version: &'static str,
    service_version: &'static str,
    database_host: String,
    database_name: String,
    endpoints: [&'static str; 3],
}

/// Build the application router. The configuration is shared read-only.
#[must_use]
pub fn router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/info", get(info))
        .with_state(config)
}

/// Start the web service
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails
pub async fn start(config: Config) -> anyhow::Result<()> {
    let (listener, bind_addr) = bind(config.listen, config.port).await?;

    println!("Database: {}", config.database.target());
    info!(
        %bind_addr,
        database = %config.database.target(),
        connect_timeout = ?config.database.connect_timeout,
        tls = ?config.database.tls.mode,
        "listening"
    );

    let app = router(Arc::new(config));

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down gracefully");

    Ok(())
}

/// Bind the listener
///
/// Without an explicit address `[::]` is tried first, then `0.0.0.0`.
///
/// # Errors
///
/// Returns an error if no address could be bound
pub async fn bind(listen: Option<IpAddr>, port: u16) -> anyhow::Result<(TcpListener, SocketAddr)> {
    if let Some(addr) = listen {
        let socket_addr = SocketAddr::new(addr, port);
        let listener = TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind {socket_addr}"))?;
        return Ok((listener, socket_addr));
    }

    let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);
    match TcpListener::bind(v6).await {
        Ok(listener) => Ok((listener, v6)),
        Err(e) => {
            warn!(error = %e, "IPv6 bind failed, falling back to IPv4");
            let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
            let listener = TcpListener::bind(v4)
                .await
                .with_context(|| format!("failed to bind {v4}"))?;
            Ok((listener, v4))
        }
    }
}

async fn home() -> impl IntoResponse {
    Json(Home {
        service: env!("CARGO_PKG_NAME"),
        message: format!("Hello from {}!", env!("CARGO_PKG_NAME")),
        timestamp: iso8601(Utc::now()),
        status: "running",
    })
}

async fn health(State(config): State<Arc<Config>>) -> Response {
    let result = HealthProbe::new(&config.database).evaluate().await;
    (result.status_code(), Json(result.body())).into_response()
}

async fn info(State(config): State<Arc<Config>>) -> impl IntoResponse {
    Json(Info {
        python_version: "n/a",
        flask_version: "n/a",
        service_version: env!("CARGO_PKG_VERSION"),
        database_host: config.database.host.clone(),
        database_name: config.database.name.clone(),
        endpoints: ENDPOINTS,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        () = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
