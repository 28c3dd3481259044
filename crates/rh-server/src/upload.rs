//! Multipart upload handling for new catalog entries.
//!
//! The `video` part is streamed to the upload directory chunk by chunk under a
//! collision-free stored name. Any failure after the file was created removes
//! it again, so an aborted upload never leaves a partial file behind.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart};
use rh_core::config::StorageConfig;
use rh_core::{Error, Result};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Multipart field carrying the video bytes.
pub const FILE_FIELD: &str = "video";

/// Reduce a client-supplied file name to a safe basename.
///
/// Keeps ASCII letters, digits, `.`, `_` and `-`; whitespace becomes `_`;
/// everything else is dropped. Leading and trailing dots and underscores are
/// stripped so the result can never be `..` or a hidden file.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<uuid-hex>_<sanitized>` stored name for an upload.
pub fn stored_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(original))
}

/// Extension of `name` without the dot, if any.
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Whether `filename` is a plain stored name that may be joined onto the
/// upload directory.
pub fn is_safe_stored_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
}

/// A file written into the upload directory.
#[derive(Debug)]
pub struct SavedUpload {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: u64,
}

impl SavedUpload {
    /// Remove the stored file. Failures are logged, not returned.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove upload");
        }
    }
}

/// The parsed admin upload form.
#[derive(Debug)]
pub struct UploadForm {
    pub name: String,
    pub title: String,
    pub description: String,
    pub file: SavedUpload,
}

/// Read the whole multipart body, saving the file part as it arrives.
pub async fn receive(mut multipart: Multipart, storage: &StorageConfig) -> Result<UploadForm> {
    let mut name = None;
    let mut title = None;
    let mut description = None;
    let mut file: Option<SavedUpload> = None;

    let outcome: Result<()> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or_default().to_owned();
            match field_name.as_str() {
                "name" => name = Some(field.text().await.map_err(multipart_error)?),
                "title" => title = Some(field.text().await.map_err(multipart_error)?),
                "description" => {
                    description = Some(field.text().await.map_err(multipart_error)?)
                }
                FILE_FIELD => {
                    if file.is_some() {
                        return Err(Error::Validation("only one video file is accepted".into()));
                    }
                    file = Some(save_field(field, storage).await?);
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown multipart field");
                }
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        if let Some(saved) = file {
            saved.discard().await;
        }
        return Err(e);
    }

    let Some(file) = file else {
        return Err(Error::Validation(format!("missing '{FILE_FIELD}' file field")));
    };

    Ok(UploadForm {
        name: name.unwrap_or_default(),
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        file,
    })
}

/// Stream one multipart file field to disk.
pub async fn save_field(mut field: Field<'_>, storage: &StorageConfig) -> Result<SavedUpload> {
    let original = field
        .file_name()
        .map(str::to_owned)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::Validation("no file selected".into()))?;

    let filename = stored_name(&original);
    let ext = extension(&filename).unwrap_or_default();
    if !storage.extension_allowed(ext) {
        return Err(Error::Validation(format!(
            "file type not allowed; expected one of: {}",
            storage.allowed_extensions.join(", ")
        )));
    }

    let path = storage.upload_dir.join(&filename);
    let mut out = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;

    let written: Result<u64> = async {
        let mut bytes: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            bytes += chunk.len() as u64;
            if bytes > storage.max_upload_bytes {
                return Err(Error::Validation(format!(
                    "upload exceeds {} bytes",
                    storage.max_upload_bytes
                )));
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        Ok(bytes)
    }
    .await;
    drop(out);

    match written {
        Ok(bytes) => {
            tracing::info!(original = %original, stored = %filename, bytes, "Upload saved");
            Ok(SavedUpload {
                filename,
                path,
                bytes,
            })
        }
        Err(e) => {
            remove_partial(&path).await;
            Err(e)
        }
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
    Error::Validation(format!("invalid multipart body: {}", e.body_text()))
}
