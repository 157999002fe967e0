//! Loading the track catalog from disk.
//!
//! Two formats are accepted:
//! - `.json`: an array of `{"id", "name", "artist"}` objects
//! - anything else: a SQLite database with a `tracks(id, name, artist)` table

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

use crate::models::Track;
use crate::progress::{create_progress_bar, create_spinner};

/// Load every catalog track, in storage order.
///
/// Order matters: ranking ties are broken by catalog position.
pub fn load_catalog(path: &Path) -> Result<Vec<Track>> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let tracks = if is_json {
        read_json_catalog(path)?
    } else {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database {:?}", path))?;
        read_tracks(&conn)?
    };

    info!(path = %path.display(), tracks = tracks.len(), "loaded catalog");
    Ok(tracks)
}

fn read_json_catalog(path: &Path) -> Result<Vec<Track>> {
    let spinner = create_spinner("Reading catalog");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {:?}", path))?;
    let tracks: Vec<Track> = serde_json::from_str(&text)
        .with_context(|| format!("Catalog {:?} is not a JSON array of tracks", path))?;
    spinner.finish_with_message(format!("Read {} catalog tracks", tracks.len()));
    Ok(tracks)
}

/// Read `tracks(id, name, artist)` ordered by rowid.
/// Rows without a name can't be matched and are skipped. A NULL artist reads as "".
pub fn read_tracks(conn: &Connection) -> Result<Vec<Track>> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))
        .context("Catalog database has no readable tracks table")?;

    let pb = create_progress_bar(count as u64, "Reading catalog");

    let mut stmt = conn.prepare("SELECT id, name, artist FROM tracks ORDER BY rowid")?;
    let mut rows = stmt.query([])?;

    let mut tracks = Vec::with_capacity(count as usize);
    while let Some(row) = rows.next()? {
        let name: Option<String> = row.get(1)?;
        let artist: Option<String> = row.get(2)?;
        if let Some(name) = name {
            tracks.push(Track {
                id: row.get(0)?,
                name,
                artist: artist.unwrap_or_default(),
            });
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("Read {} catalog tracks", tracks.len()));
    Ok(tracks)
}
