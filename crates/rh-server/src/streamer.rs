//! Bounded file streaming for playback responses.
//!
//! Every request opens the stored file, stats the open handle, resolves the
//! `Range` header against that size and streams exactly the resolved window
//! in fixed-size chunks. The file handle lives inside the body stream, so it
//! is released when the body finishes, fails, or is dropped because the
//! client went away.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use rh_core::config::StreamingConfig;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::range::{self, StreamResponse, StreamStatus};

/// An opened file together with the size observed on this request.
#[derive(Debug)]
pub struct StoredFile {
    file: File,
    size: u64,
    path: PathBuf,
}

impl StoredFile {
    /// Open `path` read-only and stat the handle.
    ///
    /// Directories are reported as `NotFound`.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            file,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn the file into a byte stream covering `window`.
    ///
    /// Consumes the handle; see [`byte_stream`].
    pub fn into_stream(
        self,
        window: StreamResponse,
        chunk_size: usize,
    ) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        byte_stream(self.file, self.path, window.offset, window.length, chunk_size)
    }
}

/// Yield exactly `length` bytes of `file` starting at `offset`.
///
/// Reads at most `chunk_size` bytes at a time. If the file ends early the
/// stream ends with an `UnexpectedEof` error instead of a short body, so the
/// transport aborts the response rather than violating `Content-Length`.
pub fn byte_stream(
    mut file: File,
    path: PathBuf,
    offset: u64,
    length: u64,
    chunk_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    async_stream::try_stream! {
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        let mut chunks = ReaderStream::with_capacity(file.take(length), chunk_size.max(1));
        let mut sent: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(path = %path.display(), sent, error = %e, "Read failed mid-stream");
                    Err::<Bytes, _>(e)?
                }
            };
            sent += chunk.len() as u64;
            yield chunk;
        }

        if sent < length {
            tracing::warn!(
                path = %path.display(),
                sent,
                expected = length,
                "File shrank during streaming"
            );
            Err::<(), _>(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("file ended after {sent} of {length} bytes"),
            ))?;
        }
    }
}

/// Guess the MIME type from the file extension.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}

/// Bodiless 416 response carrying `Content-Range: bytes */{size}`.
pub fn range_not_satisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, range::unsatisfied_content_range(size))],
    )
        .into_response()
}

/// Build the 200/206 response for an already-resolved window.
pub fn build_response(
    stored: StoredFile,
    window: StreamResponse,
    config: &StreamingConfig,
) -> Response {
    let content_type = guess_content_type(&stored.path.to_string_lossy());

    let status = match window.status {
        StreamStatus::Full => StatusCode::OK,
        StreamStatus::Partial => StatusCode::PARTIAL_CONTENT,
    };

    let body = if window.length == 0 {
        Body::empty()
    } else {
        Body::from_stream(stored.into_stream(window, config.effective_chunk_size()))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(window.length));
    if let Some(content_range) = window.content_range() {
        if let Ok(value) = HeaderValue::from_str(&content_range) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }
    if let Some(max_age) = config.cache_max_age_secs {
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={max_age}")) {
            headers.insert(header::CACHE_CONTROL, value);
        }
    }

    response
}

/// Serve the file at `path`, honouring an optional raw `Range` header.
///
/// Outcomes: 200 full body, 206 window, 416 for malformed or out-of-bounds
/// ranges, 404 when the file is missing, 500 for other storage errors. The
/// existence check runs before the range is looked at. Error responses have
/// no body.
pub async fn serve_file(
    path: &Path,
    range_header: Option<&str>,
    config: &StreamingConfig,
) -> Response {
    let stored = match StoredFile::open(path).await {
        Ok(stored) => stored,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "Stored file not found");
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to open stored file");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let size = stored.size();
    match range::resolve(range_header, size) {
        Ok(window) => {
            tracing::debug!(
                path = %path.display(),
                offset = window.offset,
                length = window.length,
                size,
                partial = window.status == StreamStatus::Partial,
                "Streaming stored file"
            );
            build_response(stored, window, config)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Rejecting range request");
            range_not_satisfiable(size)
        }
    }
}
