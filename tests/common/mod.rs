#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use pgprobe::config::DatabaseConfig;
use sqlx::{ConnectOptions, Connection, postgres::PgConnection};
use std::{env, path::PathBuf, process::Stdio};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    process::{Child, Command},
    time::{Duration, timeout},
};

pub const POSTGRES_HOST: &str = "localhost";
pub const POSTGRES_USER: &str = "postgres";
pub const POSTGRES_PASS: &str = "secret";
pub const POSTGRES_DB: &str = "testdb";

pub fn skip_if_no_postgres() -> bool {
    env::var("SKIP_POSTGRES_TESTS").is_ok()
}

pub fn postgres_config() -> DatabaseConfig {
    DatabaseConfig {
        host: POSTGRES_HOST.to_string(),
        user: POSTGRES_USER.to_string(),
        password: POSTGRES_PASS.to_string(),
        name: POSTGRES_DB.to_string(),
        ..DatabaseConfig::default()
    }
}

/// Superuser connection used to prepare roles and inspect the server
pub async fn admin_connection() -> PgConnection {
    postgres_config()
        .connect_options()
        .connect()
        .await
        .expect("failed to connect as superuser")
}

/// Create a login role with no extra privileges, if it does not exist yet
pub async fn ensure_login_role(conn: &mut PgConnection, role: &str, password: &str) {
    let statement = format!(
        "DO $$ BEGIN \
         IF NOT EXISTS (SELECT FROM pg_roles WHERE rolname = '{role}') THEN \
         CREATE ROLE {role} LOGIN PASSWORD '{password}'; \
         END IF; \
         END $$"
    );
    sqlx::raw_sql(&statement)
        .execute(&mut *conn)
        .await
        .expect("failed to create role");
}

/// Config pointing at the test database with a non-superuser role
pub fn role_config(role: &str, password: &str) -> DatabaseConfig {
    DatabaseConfig {
        user: role.to_string(),
        password: password.to_string(),
        ..postgres_config()
    }
}

/// Number of server backends currently owned by `role`
pub async fn backends_for_role(conn: &mut PgConnection, role: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM pg_stat_activity WHERE usename = $1")
        .bind(role)
        .fetch_one(&mut *conn)
        .await
        .expect("failed to read pg_stat_activity")
}

pub async fn close(conn: PgConnection) {
    let _ = conn.close().await;
}

pub fn pick_free_port() -> u16 {
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .expect("failed to bind random local port")
        .local_addr()
        .expect("failed to read local addr")
        .port()
}

pub fn pgprobe_binary_path() -> PathBuf {
    env::var_os("CARGO_BIN_EXE_pgprobe")
        .map_or_else(|| PathBuf::from("target/debug/pgprobe"), PathBuf::from)
}

/// A running pgprobe process, killed when dropped
pub struct Service {
    pub port: u16,
    pub banner: String,
    child: Child,
}

impl Service {
    /// Spawn the binary on 127.0.0.1 with the given environment.
    ///
    /// Waits for the `Database:` banner, printed once the listener is bound.
    pub async fn spawn(envs: &[(&str, &str)], removed: &[&str]) -> Self {
        let port = pick_free_port();
        let mut cmd = Command::new(pgprobe_binary_path());
        cmd.env("PGPROBE_LISTEN", "127.0.0.1")
            .env("PGPROBE_PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        for key in removed {
            cmd.env_remove(key);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().expect("failed to spawn pgprobe");
        let stdout = child.stdout.take().expect("stdout is piped");
        let mut lines = BufReader::new(stdout).lines();

        let banner = timeout(Duration::from_secs(10), async {
            while let Some(line) = lines.next_line().await.unwrap() {
                if line.starts_with("Database:") {
                    return line;
                }
            }
            panic!("pgprobe exited before printing its banner");
        })
        .await
        .expect("pgprobe did not start in time");

        // keep draining so the child never blocks on a full pipe
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

        Self {
            port,
            banner,
            child,
        }
    }

    pub async fn get(&self, path: &str) -> (u16, String) {
        http_get(self.port, path).await
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Minimal HTTP/1.1 GET returning status code and body
pub async fn http_get(port: u16, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8(response).unwrap();

    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap();

    (status, body.to_string())
}
