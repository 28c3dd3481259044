//! Catalog mutation handlers. Mounted behind
//! [`require_admin`](crate::middleware::auth::require_admin), so each handler
//! receives the caller's [`AdminGrant`].

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::catalog::NewVideo;
use crate::context::AppContext;
use crate::error::AppError;
use crate::gate::AdminGrant;
use crate::routes::videos::{parse_video_id, VideoResponse};
use crate::upload;

/// Multipart form accepted by the upload endpoint.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct UploadVideoForm {
    /// Unique catalog name.
    name: String,
    title: String,
    description: Option<String>,
    /// The video file (mp4, avi, mov or webm by default).
    #[schema(value_type = String, format = Binary)]
    video: Vec<u8>,
}

/// Request body for updating a video.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// POST /api/admin/videos
#[utoipa::path(
    post,
    path = "/api/admin/videos",
    request_body(content = UploadVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded", body = VideoResponse),
        (status = 400, description = "Missing fields or file type not allowed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn upload_video(
    State(ctx): State<AppContext>,
    Extension(grant): Extension<AdminGrant>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = upload::receive(multipart, &ctx.config.storage).await?;

    let new = NewVideo {
        name: form.name,
        title: form.title,
        description: form.description,
        filename: form.file.filename.clone(),
    };

    match ctx.catalog().create(&grant, new) {
        Ok(video) => Ok((StatusCode::CREATED, Json(VideoResponse::from_model(&video)))),
        Err(e) => {
            form.file.discard().await;
            Err(e.into())
        }
    }
}

/// PUT /api/admin/videos/{id}
#[utoipa::path(
    put,
    path = "/api/admin/videos/{id}",
    params(("id" = String, Path, description = "Video ID")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Video updated", body = VideoResponse),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn update_video(
    State(ctx): State<AppContext>,
    Extension(grant): Extension<AdminGrant>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    let id = parse_video_id(&id)?;
    let video = ctx
        .catalog()
        .update(&grant, id, &payload.title, &payload.description)?;
    Ok(Json(VideoResponse::from_model(&video)))
}

/// DELETE /api/admin/videos/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/videos/{id}",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video and stored file removed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn delete_video(
    State(ctx): State<AppContext>,
    Extension(grant): Extension<AdminGrant>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_video_id(&id)?;
    ctx.catalog().delete(&grant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
