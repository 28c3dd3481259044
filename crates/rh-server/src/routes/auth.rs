//! Authentication route handlers: login, logout, status.

use std::sync::OnceLock;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use rh_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::gate::Principal;
use crate::middleware::auth::{extract_token, SESSION_COOKIE};

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/logout response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    /// Whether the caller may add, edit or delete videos.
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn session_cookie(token: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Hash checked for unknown usernames so both failure paths pay the bcrypt
/// cost.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| bcrypt::hash("reelhouse-unknown-user", bcrypt::DEFAULT_COST).ok())
        .as_deref()
}

/// Blocking bcrypt check. `None` means the user does not exist; the password
/// is still verified against a dummy hash and the result is always `false`.
fn verify_password(stored_hash: Option<String>, password: &str) -> bool {
    match stored_hash {
        Some(hash) => bcrypt::verify(password, &hash).unwrap_or(false),
        None => {
            if let Some(hash) = dummy_hash() {
                let _ = bcrypt::verify(password, hash);
            }
            false
        }
    }
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Ok((
            jar,
            Json(AuthResponse {
                success: true,
                message: "Auth disabled".into(),
                token: None,
            }),
        ));
    }

    let user = {
        let conn = rh_db::pool::get_conn(&ctx.db)?;
        rh_db::queries::users::get_user_by_username(&conn, &payload.username)?
    };

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = payload.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(stored_hash, &password))
        .await
        .map_err(|e| Error::Internal(format!("password check failed: {e}")))?;

    let Some(user) = user else {
        tracing::info!(username = %payload.username, "Login for unknown user");
        return Err(Error::Unauthorized("Invalid credentials".into()).into());
    };

    if !valid {
        tracing::info!(username = %user.username, "Login with wrong password");
        return Err(Error::Unauthorized("Invalid credentials".into()).into());
    }

    let token = generate_token();
    // Capped at ten years so the chrono arithmetic cannot overflow.
    let lifetime = Duration::hours(auth_config.session_timeout_hours.min(87_600) as i64);
    let expires = rh_db::queries::timestamp(Utc::now() + lifetime);

    {
        let conn = rh_db::pool::get_conn(&ctx.db)?;
        rh_db::queries::auth::create_token(&conn, user.id, &token, &expires)?;
    }

    tracing::info!(username = %user.username, role = %user.role, "Login successful");

    let cookie = session_cookie(
        token.clone(),
        time::Duration::seconds(lifetime.num_seconds()),
    );

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
        }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = AuthResponse)
    )
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = extract_token(&headers) {
        let conn = rh_db::pool::get_conn(&ctx.db)?;
        if rh_db::queries::auth::delete_token(&conn, &token)? {
            tracing::info!("Session ended");
        }
    }

    // Always expire the cookie, even for bearer-only callers.
    let expired = session_cookie(String::new(), time::Duration::ZERO);

    Ok((
        jar.add(expired),
        Json(AuthResponse {
            success: true,
            message: "Logged out".into(),
            token: None,
        }),
    ))
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let auth_enabled = ctx.config.auth.enabled;
    let token = extract_token(&headers);

    let (authenticated, is_admin, username) = match ctx.gate().authorize(token.as_deref()) {
        Ok(grant) => {
            let username = match grant.principal() {
                Principal::User(id) => rh_db::pool::get_conn(&ctx.db)
                    .ok()
                    .and_then(|conn| rh_db::queries::users::get_user_by_id(&conn, id).ok())
                    .flatten()
                    .map(|u| u.username),
                Principal::ApiKey | Principal::Anonymous => None,
            };
            (true, true, username)
        }
        Err(Error::Forbidden(_)) => (true, false, None),
        Err(_) => (false, false, None),
    };

    Json(AuthStatusResponse {
        auth_enabled,
        authenticated,
        is_admin,
        username,
    })
}
