//! Video catalog service.
//!
//! Wraps the `videos` table with the rules the HTTP layer relies on: lookups
//! resolve to stored-file paths inside the upload directory, and every
//! mutation requires an [`AdminGrant`].

use std::path::PathBuf;

use rh_core::config::StorageConfig;
use rh_core::{Error, Result, VideoId};
use rh_db::models::Video;
use rh_db::pool::DbPool;
use rh_db::queries::videos;

use crate::gate::AdminGrant;

const MAX_NAME_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 200;

/// Fields for a new catalog entry. `filename` must already exist in the
/// upload directory.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub filename: String,
}

pub struct Catalog<'a> {
    db: &'a DbPool,
    storage: &'a StorageConfig,
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a DbPool, storage: &'a StorageConfig) -> Self {
        Self { db, storage }
    }

    /// Absolute-or-relative path of a stored file name.
    pub fn stored_path(&self, filename: &str) -> PathBuf {
        self.storage.upload_dir.join(filename)
    }

    /// Map a video id to the path of its stored file.
    pub fn resolve(&self, id: VideoId) -> Result<PathBuf> {
        let video = self.get(id)?;
        Ok(self.stored_path(&video.filename))
    }

    pub fn get(&self, id: VideoId) -> Result<Video> {
        let conn = rh_db::pool::get_conn(self.db)?;
        videos::get_video(&conn, id)?.ok_or_else(|| Error::not_found("video", id))
    }

    /// Catalog entry that owns a stored file name, if any.
    pub fn find_by_filename(&self, filename: &str) -> Result<Option<Video>> {
        let conn = rh_db::pool::get_conn(self.db)?;
        videos::get_video_by_filename(&conn, filename)
    }

    pub fn list(&self) -> Result<Vec<Video>> {
        let conn = rh_db::pool::get_conn(self.db)?;
        videos::list_videos(&conn)
    }

    pub fn create(&self, grant: &AdminGrant, new: NewVideo) -> Result<Video> {
        validate_name(&new.name)?;
        validate_title(&new.title)?;
        if new.filename.is_empty() {
            return Err(Error::Validation("filename is required".into()));
        }

        let conn = rh_db::pool::get_conn(self.db)?;
        let video = videos::create_video(
            &conn,
            new.name.trim(),
            new.title.trim(),
            &new.description,
            &new.filename,
        )?;

        tracing::info!(
            video_id = %video.id,
            name = %video.name,
            filename = %video.filename,
            by = ?grant.principal(),
            "Video added"
        );
        Ok(video)
    }

    /// Replace title and description. Name and stored file never change.
    pub fn update(
        &self,
        grant: &AdminGrant,
        id: VideoId,
        title: &str,
        description: &str,
    ) -> Result<Video> {
        validate_title(title)?;

        let conn = rh_db::pool::get_conn(self.db)?;
        if !videos::update_video(&conn, id, title.trim(), description)? {
            return Err(Error::not_found("video", id));
        }

        tracing::info!(video_id = %id, by = ?grant.principal(), "Video updated");
        videos::get_video(&conn, id)?.ok_or_else(|| Error::not_found("video", id))
    }

    /// Remove the stored file, then the catalog row.
    ///
    /// A file that is already gone is not an error. Streams still reading the
    /// file see a read failure and abort.
    pub async fn delete(&self, grant: &AdminGrant, id: VideoId) -> Result<()> {
        let video = self.get(id)?;
        let path = self.stored_path(&video.filename);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Stored file already missing");
            }
            Err(e) => return Err(e.into()),
        }

        let conn = rh_db::pool::get_conn(self.db)?;
        if !videos::delete_video(&conn, id)? {
            return Err(Error::not_found("video", id));
        }

        tracing::info!(video_id = %id, by = ?grant.principal(), "Video deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
