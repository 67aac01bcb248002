//! Local store: SQLite persistence for the mirrored library.
//!
//! Uses SQLx with SQLite. [`Store::open`] creates the database file if
//! needed, refuses to open a file written by a newer build, and applies
//! pending migrations.
//!
//! Three conflict-resolution primitives cover every write the sync engine
//! performs:
//! - plain insert ([`insert_listening`]) - a conflicting row writes nothing;
//! - insert-or-update ([`upsert_playlist`]) - overwrites every field, since
//!   playlist metadata legitimately changes;
//! - insert-or-leave ([`insert_song_if_absent`] and friends) - a silent no-op
//!   on conflict, reporting whether a row was actually written so the caller
//!   can decide whether to cascade into dependent inserts.
//!
//! Write functions take `&mut SqliteConnection` so they compose inside an
//! explicit transaction (`store.begin()`); commit granularity is the
//! caller's decision.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::open(&path).await?;
//! let mut tx = store.begin().await?;
//! store::upsert_playlist(&mut tx, &playlist).await?;
//! tx.commit().await?;
//! ```

mod migrations;

pub use migrations::SCHEMA_VERSION;

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::model::{
    Album, Artist, Listening, PlayContext, Playlist, SONG_BY_ARTIST_TABLE,
    SONG_IN_PLAYLIST_TABLE, Song,
};

/// Default database filename inside the data directory.
pub const DEFAULT_DB_NAME: &str = "spinlog.sqlite";

/// Store-level errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database was written by a newer build. Surfaced before any other
    /// store operation; downgrades are unsupported.
    #[error("database schema is v{found} but this build supports up to v{supported}")]
    Downgrade { found: i64, supported: i64 },

    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle to the open database.
///
/// Cloning is cheap (the pool is shared). All access goes through an explicit
/// handle - there is no ambient global connection state.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) and migrate the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Downgrade`] if the file's schema version is
    /// newer than this build, before any other operation touches it.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}", path.display());
        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            // Listening context ids may reference rows we never mirrored
            .foreign_keys(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        migrations::run(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying connection pool, for read-only queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin an explicit transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }
}

/// Insert or update a playlist on its identifier.
///
/// Always overwrites the mutable fields: playlist metadata (name, cover,
/// visibility) can change remotely between pulls.
pub async fn upsert_playlist(
    conn: &mut SqliteConnection,
    playlist: &Playlist,
) -> sqlx::Result<()> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (spotify_id, api_url, web_url, cover_url, name, is_public, owner_name)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(spotify_id) DO UPDATE SET
            api_url = excluded.api_url,
            web_url = excluded.web_url,
            cover_url = excluded.cover_url,
            name = excluded.name,
            is_public = excluded.is_public,
            owner_name = excluded.owner_name
        "#,
        Playlist::TABLE
    ))
    .bind(&playlist.spotify_id)
    .bind(&playlist.api_url)
    .bind(&playlist.web_url)
    .bind(&playlist.cover_url)
    .bind(&playlist.name)
    .bind(playlist.is_public)
    .bind(&playlist.owner_name)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a song unless its identifier already exists.
///
/// Returns whether a row was newly written. An existing row is left
/// untouched - songs are immutable once first observed.
pub async fn insert_song_if_absent(conn: &mut SqliteConnection, song: &Song) -> sqlx::Result<bool> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (spotify_id, api_url, web_url, name, cover_url, duration, explicit,
                        isrc, is_local, popularity, preview_url, track_number,
                        album_id, album_name, artists_names)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(spotify_id) DO NOTHING
        "#,
        Song::TABLE
    ))
    .bind(&song.spotify_id)
    .bind(&song.api_url)
    .bind(&song.web_url)
    .bind(&song.name)
    .bind(&song.cover_url)
    .bind(song.duration)
    .bind(song.explicit)
    .bind(&song.isrc)
    .bind(song.is_local)
    .bind(song.popularity)
    .bind(&song.preview_url)
    .bind(song.track_number)
    .bind(&song.album_id)
    .bind(&song.album_name)
    .bind(&song.artists_names)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert an album unless its identifier already exists. Returns whether a
/// row was newly written.
pub async fn insert_album_if_absent(
    conn: &mut SqliteConnection,
    album: &Album,
) -> sqlx::Result<bool> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (spotify_id, api_url, web_url, cover_url, name,
                        release_date, release_date_precision, album_type)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(spotify_id) DO NOTHING
        "#,
        Album::TABLE
    ))
    .bind(&album.spotify_id)
    .bind(&album.api_url)
    .bind(&album.web_url)
    .bind(&album.cover_url)
    .bind(&album.name)
    .bind(&album.release_date)
    .bind(&album.release_date_precision)
    .bind(&album.album_type)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert an artist unless its identifier already exists. Returns whether a
/// row was newly written.
pub async fn insert_artist_if_absent(
    conn: &mut SqliteConnection,
    artist: &Artist,
) -> sqlx::Result<bool> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (spotify_id, api_url, web_url, name)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(spotify_id) DO NOTHING
        "#,
        Artist::TABLE
    ))
    .bind(&artist.spotify_id)
    .bind(&artist.api_url)
    .bind(&artist.web_url)
    .bind(&artist.name)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Create a Song↔Artist association.
pub async fn link_song_artist(
    conn: &mut SqliteConnection,
    song_id: &str,
    artist_id: &str,
) -> sqlx::Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {SONG_BY_ARTIST_TABLE} (song_id, artist_id) VALUES (?, ?)"
    ))
    .bind(song_id)
    .bind(artist_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Add a song's membership in a playlist, with the remote-reported added-at.
pub async fn add_playlist_entry(
    conn: &mut SqliteConnection,
    song_id: &str,
    playlist_id: &str,
    added_at: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {SONG_IN_PLAYLIST_TABLE} (song_id, playlist_id, added_at) VALUES (?, ?, ?)"
    ))
    .bind(song_id)
    .bind(playlist_id)
    .bind(added_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Remove a song's membership in a playlist. Returns the number of rows
/// deleted.
pub async fn remove_playlist_entry(
    conn: &mut SqliteConnection,
    song_id: &str,
    playlist_id: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM {SONG_IN_PLAYLIST_TABLE} WHERE song_id = ? AND playlist_id = ?"
    ))
    .bind(song_id)
    .bind(playlist_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// All song ids currently stored as members of a playlist.
pub async fn playlist_song_ids(
    conn: &mut SqliteConnection,
    playlist_id: &str,
) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(&format!(
        "SELECT song_id FROM {SONG_IN_PLAYLIST_TABLE} WHERE playlist_id = ?"
    ))
    .bind(playlist_id)
    .fetch_all(&mut *conn)
    .await
}

/// Record one listening event. Returns whether a row was written.
pub async fn insert_listening(
    conn: &mut SqliteConnection,
    listening: &Listening,
) -> sqlx::Result<bool> {
    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {} (song_id, played_at, context, album_id, playlist_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
        Listening::TABLE
    ))
    .bind(&listening.song_id)
    .bind(&listening.played_at)
    .bind(listening.context.map(PlayContext::as_str))
    .bind(&listening.album_id)
    .bind(&listening.playlist_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The most recent played-at string on record (the listening watermark), or
/// `None` for an empty store.
///
/// Returned in the exact form it was stored so it compares bytewise against
/// future fetches.
pub async fn latest_played_at(conn: &mut SqliteConnection) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar(&format!(
        "SELECT played_at FROM {} ORDER BY played_at DESC LIMIT 1",
        Listening::TABLE
    ))
    .fetch_optional(&mut *conn)
    .await
}
