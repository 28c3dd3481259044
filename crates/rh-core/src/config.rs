//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for server, storage, streaming and auth. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub streaming: StreamingConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.streaming.chunk_size == 0 {
            warnings.push(format!(
                "streaming.chunk_size is 0; falling back to {DEFAULT_CHUNK_SIZE}"
            ));
        }

        if self.storage.allowed_extensions.is_empty() {
            warnings.push("storage.allowed_extensions is empty; uploads will be rejected".into());
        }

        if self.auth.enabled {
            if self.auth.api_key.is_none() && self.auth.username.is_none() {
                warnings.push(
                    "auth is enabled but neither api_key nor username is set; the catalog is read-only"
                        .into(),
                );
            }
            if self.auth.username.is_some() && self.auth.password_hash.is_none() {
                warnings.push("auth username is set but password_hash is missing".into());
            }
            if let Some(ref hash) = self.auth.password_hash {
                if !hash.starts_with("$2") {
                    warnings.push("auth.password_hash does not look like a bcrypt hash".into());
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/reelhouse.db"),
        }
    }
}

/// Where uploaded videos live and which ones are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            allowed_extensions: ["mp4", "avi", "mov", "webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    /// Whether `ext` (without the dot) is an accepted upload extension.
    pub fn extension_allowed(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Default read size for playback streams.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Playback streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Bytes read from disk per chunk.
    pub chunk_size: usize,
    /// When set, playback responses carry `Cache-Control: max-age=N`.
    pub cache_max_age_secs: Option<u64>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_max_age_secs: None,
        }
    }
}

impl StreamingConfig {
    /// Chunk size with the zero case mapped to the default.
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub session_timeout_hours: u64,
    pub login_attempts_per_minute: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            username: None,
            password_hash: None,
            session_timeout_hours: 24,
            login_attempts_per_minute: 10,
        }
    }
}
