//! Shared application context.
//!
//! [`AppContext`] is handed to every route handler via Axum state. It is
//! cheaply cloneable because it only holds `Arc`s and the r2d2 pool handle.

use std::sync::Arc;

use rh_core::config::Config;
use rh_db::pool::DbPool;

use crate::catalog::Catalog;
use crate::gate::AccessGate;
use crate::middleware::rate_limit::{create_limiter, SharedLimiter};

#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    /// Throttles `POST /api/auth/login`.
    pub login_limiter: SharedLimiter,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config) -> Self {
        let login_limiter = create_limiter(config.auth.login_attempts_per_minute);
        Self {
            db,
            config: Arc::new(config),
            login_limiter,
        }
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.db, &self.config.storage)
    }

    pub fn gate(&self) -> AccessGate<'_> {
        AccessGate::new(&self.config.auth, &self.db)
    }
}
