//! Error type shared by the catalog, storage and HTTP layers.
//!
//! Handlers never pick status codes themselves: they bubble an [`Error`] up
//! and the server maps it through [`Error::http_status`]. Playback responses
//! are the exception and are built directly by the streamer.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown video, user or stored file.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Missing, unknown or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid session without the admin role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad upload or metadata: empty title, disallowed extension, oversize body.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint hit, e.g. a video name that is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Login throttle tripped.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Database error: {source}")]
    Database {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem failure in the upload directory.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status for JSON API responses.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound { .. } => 404,
            Error::Conflict(_) => 409,
            Error::RateLimited(_) => 429,
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => 500,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Wrap a storage-layer failure. Accepts rusqlite/r2d2 errors or a message.
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
