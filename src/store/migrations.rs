//! Versioned schema migrations.
//!
//! The schema version marker is SQLite's `PRAGMA user_version`: the number of
//! migration batches applied to the file. On open, a marker ahead of what
//! this build knows is a hard error (downgrades are unsupported); a marker
//! behind it gets every missing batch applied in order, each batch and its
//! marker bump committed in one transaction.
//!
//! Migrations are forward-only. Never edit a released batch - append a new
//! one.

use sqlx::SqlitePool;

use super::StoreError;

/// Schema version this build expects (= number of migration batches).
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

/// Migration batches; index `i` brings the schema to version `i + 1`.
const MIGRATIONS: &[&[&str]] = &[V1_STATEMENTS];

/// Check the version marker and apply any pending migrations.
pub(super) async fn run(pool: &SqlitePool) -> Result<(), StoreError> {
    let found: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if found > SCHEMA_VERSION {
        return Err(StoreError::Downgrade {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    for (index, statements) in MIGRATIONS.iter().enumerate() {
        let version = (index + 1) as i64;
        if version <= found {
            continue;
        }
        let mut tx = pool.begin().await?;
        for statement in *statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        // PRAGMA does not support bind parameters; version is a trusted const
        sqlx::query(&format!("PRAGMA user_version = {version}"))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!("Applied database migration v{}", version);
    }

    Ok(())
}

// The FOREIGN KEY clauses document relationships only: enforcement is off on
// the connection, since Listening context ids may name playlists or albums
// that were never mirrored locally.
const V1_STATEMENTS: &[&str] = &[
    "CREATE TABLE Artist (
        spotify_id TEXT PRIMARY KEY,
        api_url    TEXT,
        web_url    TEXT,
        name       TEXT
    )",
    "CREATE TABLE Album (
        spotify_id             TEXT PRIMARY KEY,
        api_url                TEXT,
        web_url                TEXT,
        cover_url              TEXT,
        name                   TEXT,
        release_date           TEXT,
        release_date_precision TEXT,
        album_type             TEXT
    )",
    "CREATE TABLE Playlist (
        spotify_id TEXT PRIMARY KEY,
        api_url    TEXT,
        web_url    TEXT,
        cover_url  TEXT,
        name       TEXT,
        is_public  INTEGER,
        owner_name TEXT
    )",
    "CREATE TABLE Song (
        spotify_id    TEXT PRIMARY KEY,
        api_url       TEXT,
        web_url       TEXT,
        name          TEXT,
        cover_url     TEXT,
        duration      INTEGER,
        explicit      INTEGER,
        isrc          TEXT,
        is_local      INTEGER,
        popularity    INTEGER,
        preview_url   TEXT,
        track_number  INTEGER,
        album_id      TEXT,
        album_name    TEXT,
        artists_names TEXT,

        FOREIGN KEY(album_id) REFERENCES Album(spotify_id)
    )",
    "CREATE TABLE SongByArtist (
        song_id   TEXT,
        artist_id TEXT,

        FOREIGN KEY(song_id) REFERENCES Song(spotify_id),
        FOREIGN KEY(artist_id) REFERENCES Artist(spotify_id)
    )",
    "CREATE INDEX ArtistFromSongIx ON SongByArtist (song_id, artist_id)",
    "CREATE INDEX SongFromArtistIx ON SongByArtist (artist_id, song_id)",
    "CREATE TABLE SongInPlaylist (
        song_id     TEXT,
        playlist_id TEXT,
        added_at    TEXT,

        FOREIGN KEY(song_id) REFERENCES Song(spotify_id),
        FOREIGN KEY(playlist_id) REFERENCES Playlist(spotify_id)
    )",
    "CREATE INDEX PlaylistFromSongIx ON SongInPlaylist (song_id, playlist_id)",
    "CREATE INDEX SongFromPlaylistIx ON SongInPlaylist (playlist_id, song_id)",
    "CREATE TABLE Listening (
        listening_id INTEGER PRIMARY KEY AUTOINCREMENT,
        song_id      TEXT,
        played_at    TEXT,
        context      TEXT,
        album_id     TEXT,
        playlist_id  TEXT,

        FOREIGN KEY(album_id) REFERENCES Album(spotify_id),
        FOREIGN KEY(playlist_id) REFERENCES Playlist(spotify_id)
    )",
    "CREATE INDEX SongListeningIx ON Listening (song_id)",
    "CREATE INDEX PlayedAtIx ON Listening (played_at)",
];
