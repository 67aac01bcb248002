//! Synchronization engine: reconcile the remote library against the store.
//!
//! Two independent, separately invokable passes:
//! - [`pull_playlists`]: full reconciliation of the playlist set and every
//!   playlist's membership rows (additions, updates and deletions);
//! - [`pull_listenings`]: append-only history sync that walks the
//!   recently-played feed newest-to-oldest and stops at the watermark (the
//!   most recent played-at already stored).
//!
//! Songs, albums and artists are created lazily on first encounter and never
//! deleted. Both passes share the [`ensure_song`] cascade for that.

pub mod listenings;
pub mod playlists;

pub use listenings::{ListeningSyncReport, pull_listenings};
pub use playlists::{PlaylistSyncReport, pull_playlists};

use sqlx::SqliteConnection;

use crate::remote::{RemoteError, dto};
use crate::store::StoreError;
use crate::{normalize, store};

/// Errors aborting a sync pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Remote fetch failed; the pull is abandoned (no retry layer)
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Local write or read failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store-level failure (open/transaction)
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Idempotently make sure a track's Song row exists, cascading into its
/// album, artists and Song↔Artist links only when the song is new.
///
/// The album is ensured first so the song's `album_id` reference lands on an
/// existing row. Local tracks have no remote album or artist ids, so only
/// their Song row is written.
pub(crate) async fn ensure_song(
    conn: &mut SqliteConnection,
    track: &dto::TrackResource,
) -> Result<(), SyncError> {
    if !track.is_local {
        if let Some(album) = track.album.as_ref().and_then(normalize::album_from_resource) {
            store::insert_album_if_absent(conn, &album).await?;
        }
    }

    let song = normalize::song_from_track(track);
    let added_song = store::insert_song_if_absent(conn, &song).await?;

    // Artist links are written once, on the song's first insert, and never
    // revisited
    if added_song && !track.is_local {
        for artist_resource in &track.artists {
            if let Some(artist) = normalize::artist_from_resource(artist_resource) {
                store::insert_artist_if_absent(conn, &artist).await?;
                store::link_song_artist(conn, &song.spotify_id, &artist.spotify_id).await?;
            }
        }
    }

    Ok(())
}
