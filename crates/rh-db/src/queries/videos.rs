//! Video catalog operations.
//!
//! A catalog row maps a [`VideoId`] to its descriptive metadata and to the
//! stored file name the playback path resolves to bytes.

use rusqlite::{Connection, OptionalExtension};
use rh_core::{Error, Result, VideoId};

use super::now_timestamp;
use crate::models::Video;

const COLS: &str = "id, name, title, description, filename, created_at, updated_at";

/// Insert a new catalog entry.
pub fn create_video(
    conn: &Connection,
    name: &str,
    title: &str,
    description: &str,
    filename: &str,
) -> Result<Video> {
    let id = VideoId::new();
    let now = now_timestamp();

    conn.execute(
        "INSERT INTO videos (id, name, title, description, filename, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        rusqlite::params![id.to_string(), name, title, description, filename, now],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Video name '{name}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(Video {
        id,
        name: name.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        filename: filename.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a video by ID.
pub fn get_video(conn: &Connection, id: VideoId) -> Result<Option<Video>> {
    let q = format!("SELECT {COLS} FROM videos WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], Video::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Get the video whose stored file is `filename`.
pub fn get_video_by_filename(conn: &Connection, filename: &str) -> Result<Option<Video>> {
    let q = format!("SELECT {COLS} FROM videos WHERE filename = ?1 LIMIT 1");
    conn.query_row(&q, [filename], Video::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List all videos, newest first.
pub fn list_videos(conn: &Connection) -> Result<Vec<Video>> {
    let q = format!("SELECT {COLS} FROM videos ORDER BY created_at DESC, name ASC");
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Video::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update a video's title and description. Returns `false` if no row matched.
pub fn update_video(
    conn: &Connection,
    id: VideoId,
    title: &str,
    description: &str,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE videos SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![title, description, now_timestamp(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a video row. Returns `false` if no row matched.
pub fn delete_video(conn: &Connection, id: VideoId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM videos WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
