//! Playback handlers.
//!
//! Both routes end in [`streamer::serve_file`]; they differ only in how the
//! stored file is located. Every outcome here is a bare status plus headers,
//! never a JSON error body.

use std::borrow::Cow;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::context::AppContext;
use crate::routes::videos::parse_video_id;
use crate::streamer;
use crate::upload::is_safe_stored_name;

/// Raw `Range` value. Bytes that are not valid UTF-8 are replaced, which makes
/// the value malformed rather than absent.
fn range_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get(header::RANGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

/// GET /api/videos/{id}/stream
#[utoipa::path(
    get,
    path = "/api/videos/{id}/stream",
    params(
        ("id" = String, Path, description = "Video ID"),
        ("Range" = Option<String>, Header, description = "Single range, `bytes=<start>-[<end>]`")
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte window"),
        (status = 404, description = "Unknown video or missing file"),
        (status = 416, description = "Malformed or unsatisfiable range")
    )
)]
pub async fn stream_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let path = match parse_video_id(&id).and_then(|id| ctx.catalog().resolve(id)) {
        Ok(path) => path,
        Err(e) if e.http_status() == 404 => {
            tracing::info!(video_id = %id, "Playback for unknown video");
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            tracing::error!(video_id = %id, error = %e, "Catalog lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let range = range_header(&headers);
    streamer::serve_file(&path, range.as_deref(), &ctx.config.streaming).await
}

/// GET /uploads/{filename}
#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    params(
        ("filename" = String, Path, description = "Stored file name"),
        ("Range" = Option<String>, Header, description = "Single range, `bytes=<start>-[<end>]`")
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte window"),
        (status = 404, description = "No such stored file"),
        (status = 416, description = "Malformed or unsatisfiable range")
    )
)]
pub async fn stream_upload(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_safe_stored_name(&filename) {
        tracing::info!(filename = %filename, "Rejected unsafe stored file name");
        return StatusCode::NOT_FOUND.into_response();
    }

    let catalog = ctx.catalog();
    match catalog.find_by_filename(&filename) {
        Ok(Some(video)) => {
            tracing::debug!(video_id = %video.id, filename = %filename, "Serving catalogued upload")
        }
        Ok(None) => tracing::debug!(filename = %filename, "Serving upload with no catalog entry"),
        Err(e) => tracing::warn!(filename = %filename, error = %e, "Catalog lookup failed"),
    }

    let path = catalog.stored_path(&filename);
    let range = range_header(&headers);
    streamer::serve_file(&path, range.as_deref(), &ctx.config.streaming).await
}
