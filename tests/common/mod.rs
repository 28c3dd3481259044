//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary upload
//! directory, a config with a seeded admin account, and a full
//! [`AppContext`]. The [`TestHarness::with_server`] constructor starts Axum on
//! a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use rh_core::config::Config;
use rh_db::models::Video;
use rh_db::pool::{init_memory_pool, DbPool};
use rh_server::context::AppContext;
use rh_server::router::build_router;
use tempfile::TempDir;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery";
pub const API_KEY: &str = "test-api-key";

/// Deterministic, non-repeating-per-256 test payload.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub upload_dir: TempDir,
}

impl TestHarness {
    /// Auth enabled with a seeded admin and an API key.
    pub fn default_config() -> Config {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.auth.username = Some(ADMIN_USER.into());
        config.auth.password_hash =
            Some(bcrypt::hash(ADMIN_PASSWORD, 4).expect("failed to hash test password"));
        config.auth.api_key = Some(API_KEY.into());
        config
    }

    pub fn new() -> Self {
        Self::with_config(Self::default_config())
    }

    /// Build a harness around `config`. The upload directory is always
    /// replaced with a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        rh_server::prepare_database(&db, &config.auth).expect("failed to seed database");

        let ctx = AppContext::new(db.clone(), config);
        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Self::default_config()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> rh_db::pool::PooledConnection {
        rh_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Write `data` into the upload directory under `filename`.
    pub fn write_upload(&self, filename: &str, data: &[u8]) -> PathBuf {
        let path = self.upload_dir.path().join(filename);
        std::fs::write(&path, data).expect("failed to write upload");
        path
    }

    /// Store `data` and register it in the catalog under `name`.
    pub fn create_video(&self, name: &str, data: &[u8]) -> Video {
        let filename = format!("{}_{name}.mp4", uuid_hex());
        self.write_upload(&filename, data);
        let conn = self.conn();
        rh_db::queries::videos::create_video(&conn, name, &format!("{name} title"), "", &filename)
            .expect("failed to create video")
    }

    /// Create a user directly in the database.
    pub fn create_user(&self, username: &str, password: &str, role: &str) {
        let hash = bcrypt::hash(password, 4).expect("failed to hash password");
        let conn = self.conn();
        rh_db::queries::users::create_user(&conn, username, &hash, role)
            .expect("failed to create user");
    }
}

fn uuid_hex() -> String {
    rh_core::VideoId::new().as_uuid().simple().to_string()
}

/// Log in over HTTP and return the session token.
pub async fn login(addr: SocketAddr, username: &str, password: &str) -> String {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), 200, "login should succeed");
    let body: serde_json::Value = resp.json().await.expect("login body");
    body["token"].as_str().expect("token in body").to_string()
}
