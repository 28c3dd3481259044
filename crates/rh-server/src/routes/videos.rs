//! Public catalog read handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use rh_core::{Error, VideoId};
use rh_db::models::Video;

use crate::context::AppContext;
use crate::error::AppError;

/// A catalog entry as returned by the API.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub filename: String,
    /// Range-capable playback URL by catalog id.
    pub stream_url: String,
    /// Range-capable playback URL by stored file name.
    pub file_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoResponse {
    pub fn from_model(video: &Video) -> Self {
        Self {
            id: video.id.to_string(),
            name: video.name.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            filename: video.filename.clone(),
            stream_url: format!("/api/videos/{}/stream", video.id),
            file_url: format!("/uploads/{}", video.filename),
            created_at: video.created_at.clone(),
            updated_at: video.updated_at.clone(),
        }
    }
}

/// Parse a path segment as a [`VideoId`]; garbage is simply "not found".
pub(crate) fn parse_video_id(raw: &str) -> Result<VideoId, Error> {
    raw.parse().map_err(|_| Error::not_found("video", raw))
}

/// GET /api/videos
#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "All catalog entries, newest first", body = Vec<VideoResponse>)
    )
)]
pub async fn list_videos(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let videos = ctx.catalog().list()?;
    Ok(Json(videos.iter().map(VideoResponse::from_model).collect()))
}

/// GET /api/videos/{id}
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video details", body = VideoResponse),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let id = parse_video_id(&id)?;
    let video = ctx.catalog().get(id)?;
    Ok(Json(VideoResponse::from_model(&video)))
}
