//! Axum router construction.
//!
//! Builds the full application router with all route groups and middleware
//! layers.

use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::require_admin;
use crate::middleware::rate_limit::login_rate_limit;
use crate::middleware::request_id::{request_id_middleware, X_REQUEST_ID};
use crate::routes;

/// Room for multipart boundaries and the text fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "reelhouse API",
        description = "Video catalog with HTTP range playback",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::videos::list_videos,
        routes::videos::get_video,
        routes::playback::stream_video,
        routes::playback::stream_upload,
        routes::admin::upload_video,
        routes::admin::update_video,
        routes::admin::delete_video,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::videos::VideoResponse,
        routes::admin::UploadVideoForm,
        routes::admin::UpdateVideoRequest,
    )),
    tags(
        (name = "reelhouse", description = "Catalog, playback and admin endpoints")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            header::ACCEPT_RANGES,
            header::CONTENT_RANGE,
            header::CONTENT_LENGTH,
            X_REQUEST_ID.clone(),
        ]);

    let upload_limit = usize::try_from(ctx.config.storage.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Auth routes: always reachable; login is throttled.
    let auth_routes = Router::new()
        .route(
            "/auth/login",
            post(routes::auth::login).layer(middleware::from_fn_with_state(
                ctx.clone(),
                login_rate_limit,
            )),
        )
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status));

    // Public catalog reads and playback.
    let public_routes = Router::new()
        .route("/videos", get(routes::videos::list_videos))
        .route("/videos/{id}", get(routes::videos::get_video))
        .route("/videos/{id}/stream", get(routes::playback::stream_video));

    // Catalog mutations. `route_layer` keeps unknown paths at 404 instead of
    // running the admin check first.
    let admin_routes = Router::new()
        .route(
            "/admin/videos",
            post(routes::admin::upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/admin/videos/{id}",
            put(routes::admin::update_video).delete(routes::admin::delete_video),
        )
        .route_layer(middleware::from_fn_with_state(ctx.clone(), require_admin));

    let api = auth_routes.merge(public_routes).merge(admin_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/uploads/{filename}", get(routes::playback::stream_upload))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
