//! Admin access checks.
//!
//! [`AccessGate`] answers one question: may this caller mutate the catalog?
//! A positive answer is an [`AdminGrant`], a capability value that every
//! mutating catalog operation takes as a parameter. Grants can only be minted
//! inside this crate, so holding one is proof that the check ran.
//!
//! Playback never consults the gate.

use rh_core::config::AuthConfig;
use rh_core::{Error, Result, UserId};
use rh_db::pool::DbPool;

/// Who was granted admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Auth is disabled; everyone is admin.
    Anonymous,
    /// The configured API key was presented.
    ApiKey,
    /// A session token belonging to an admin user.
    User(UserId),
}

/// Proof that the caller passed the admin check.
#[derive(Debug, Clone)]
pub struct AdminGrant {
    principal: Principal,
}

impl AdminGrant {
    pub(crate) fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }
}

/// Authorization check backed by the auth config and the session table.
pub struct AccessGate<'a> {
    auth: &'a AuthConfig,
    db: &'a DbPool,
}

impl<'a> AccessGate<'a> {
    pub fn new(auth: &'a AuthConfig, db: &'a DbPool) -> Self {
        Self { auth, db }
    }

    /// Check a bearer/session token and mint a grant on success.
    ///
    /// Errors are `Unauthorized` for missing, unknown or expired tokens and
    /// `Forbidden` for valid sessions of non-admin users.
    pub fn authorize(&self, token: Option<&str>) -> Result<AdminGrant> {
        if !self.auth.enabled {
            return Ok(AdminGrant::new(Principal::Anonymous));
        }

        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("Authentication required".into()))?;

        if let Some(ref api_key) = self.auth.api_key {
            if !api_key.is_empty() && token == api_key {
                return Ok(AdminGrant::new(Principal::ApiKey));
            }
        }

        let conn = rh_db::pool::get_conn(self.db)?;
        let now = rh_db::queries::now_timestamp();
        let session = rh_db::queries::auth::get_valid_token(&conn, token, &now)?
            .ok_or_else(|| Error::Unauthorized("Invalid or expired session".into()))?;

        let user = rh_db::queries::users::get_user_by_id(&conn, session.user_id)?
            .ok_or_else(|| Error::Unauthorized("Session user no longer exists".into()))?;

        if !user.is_admin() {
            tracing::debug!(user = %user.username, "Non-admin attempted a mutating operation");
            return Err(Error::Forbidden("Admin role required".into()));
        }

        Ok(AdminGrant::new(Principal::User(user.id)))
    }

    /// Boolean form of [`authorize`](Self::authorize). Storage failures count
    /// as "not authorized".
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        match self.authorize(token) {
            Ok(_) => true,
            Err(e) => {
                if e.http_status() >= 500 {
                    tracing::warn!(error = %e, "Authorization check failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_db::pool::init_memory_pool;
    use rh_db::queries::{auth, users};

    fn enabled() -> AuthConfig {
        AuthConfig {
            api_key: Some("secret-key".into()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn disabled_auth_grants_everyone() {
        let db = init_memory_pool().unwrap();
        let config = AuthConfig {
            enabled: false,
            ..AuthConfig::default()
        };
        let gate = AccessGate::new(&config, &db);

        let grant = gate.authorize(None).unwrap();
        assert_eq!(grant.principal(), Principal::Anonymous);
        assert!(gate.is_authorized(Some("anything")));
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let db = init_memory_pool().unwrap();
        let config = enabled();
        let gate = AccessGate::new(&config, &db);

        assert!(matches!(gate.authorize(None), Err(Error::Unauthorized(_))));
        assert!(matches!(gate.authorize(Some("")), Err(Error::Unauthorized(_))));
        assert!(!gate.is_authorized(None));
    }

    #[test]
    fn api_key_grants_admin() {
        let db = init_memory_pool().unwrap();
        let config = enabled();
        let gate = AccessGate::new(&config, &db);

        let grant = gate.authorize(Some("secret-key")).unwrap();
        assert_eq!(grant.principal(), Principal::ApiKey);
        assert!(!gate.is_authorized(Some("wrong-key")));
    }

    #[test]
    fn admin_session_grants_admin() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let admin = users::create_user(&conn, "root", "hash", "admin").unwrap();
        auth::create_token(&conn, admin.id, "tok-admin", "2099-01-01T00:00:00Z").unwrap();
        drop(conn);

        let config = enabled();
        let gate = AccessGate::new(&config, &db);
        let grant = gate.authorize(Some("tok-admin")).unwrap();
        assert_eq!(grant.principal(), Principal::User(admin.id));
    }

    #[test]
    fn non_admin_session_is_forbidden() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let viewer = users::create_user(&conn, "viewer", "hash", "user").unwrap();
        auth::create_token(&conn, viewer.id, "tok-user", "2099-01-01T00:00:00Z").unwrap();
        drop(conn);

        let config = enabled();
        let gate = AccessGate::new(&config, &db);
        assert!(matches!(
            gate.authorize(Some("tok-user")),
            Err(Error::Forbidden(_))
        ));
        assert!(!gate.is_authorized(Some("tok-user")));
    }

    #[test]
    fn expired_session_is_unauthorized() {
        let db = init_memory_pool().unwrap();
        let conn = db.get().unwrap();
        let admin = users::create_user(&conn, "old_admin", "hash", "admin").unwrap();
        auth::create_token(&conn, admin.id, "tok-old", "2000-01-01T00:00:00Z").unwrap();
        drop(conn);

        let config = enabled();
        let gate = AccessGate::new(&config, &db);
        assert!(matches!(
            gate.authorize(Some("tok-old")),
            Err(Error::Unauthorized(_))
        ));
    }
}
