//! Core data models for the mirrored library.
//!
//! Defines the canonical entities synced from Spotify: [`Song`], [`Artist`],
//! [`Album`], [`Playlist`] and [`Listening`]. These are derived from SQLx for
//! database mapping.
//!
//! Every entity is keyed by a `spotify_id` string: either the remote-assigned
//! identifier or, for locally-sourced tracks, a deterministic `local:`-prefixed
//! hash synthesized by [`crate::normalize`].
//!
//! Each type carries a `TABLE` constant naming its SQL table, so the store
//! never has to infer table names from type names.

use sqlx::FromRow;

/// A song (track) mirrored from the remote library.
///
/// Treated as immutable once first observed: re-encountering the same
/// identifier never overwrites the stored row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Song {
    /// Stable identifier (remote id or synthesized `local:` hash)
    pub spotify_id: String,
    /// Web API reference URL
    pub api_url: Option<String>,
    /// Public web page URL
    pub web_url: Option<String>,
    /// Display name
    pub name: String,
    /// Album cover image URL (first image of the owning album)
    pub cover_url: Option<String>,
    /// Duration in milliseconds
    pub duration: i64,
    /// Explicit lyrics flag
    pub explicit: bool,
    /// External recording code (ISRC), absent for local tracks
    pub isrc: Option<String>,
    /// Locally-sourced track (no remote identifier)
    pub is_local: bool,
    /// Remote popularity score
    pub popularity: i64,
    /// Audio preview URL
    pub preview_url: Option<String>,
    /// Position on the owning album
    pub track_number: i64,
    /// Owning album identifier
    pub album_id: Option<String>,
    /// Denormalized album name
    pub album_name: Option<String>,
    /// Denormalized artist names, sorted and joined with ", "
    pub artists_names: String,
}

impl Song {
    pub const TABLE: &'static str = "Song";
}

/// An artist. Append-only.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Artist {
    pub spotify_id: String,
    pub api_url: Option<String>,
    pub web_url: Option<String>,
    pub name: String,
}

impl Artist {
    pub const TABLE: &'static str = "Artist";
}

/// An album. Append-only: inserted on first encounter, never updated.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Album {
    pub spotify_id: String,
    pub api_url: Option<String>,
    pub web_url: Option<String>,
    pub cover_url: Option<String>,
    pub name: String,
    /// Release date string (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
    pub release_date: Option<String>,
    /// Precision qualifier for `release_date` ("year", "month", "day")
    pub release_date_precision: Option<String>,
    /// Album type ("album", "single", "compilation")
    pub album_type: Option<String>,
}

impl Album {
    pub const TABLE: &'static str = "Album";
}

/// A playlist. Mutable: metadata is re-synced (upserted) on every pull.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Playlist {
    pub spotify_id: String,
    pub api_url: Option<String>,
    pub web_url: Option<String>,
    pub cover_url: Option<String>,
    pub name: String,
    pub is_public: Option<bool>,
    /// Owner's display name
    pub owner_name: Option<String>,
}

impl Playlist {
    pub const TABLE: &'static str = "Playlist";
}

/// The playback context a listening happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayContext {
    Album,
    Playlist,
}

impl PlayContext {
    /// Stored TEXT representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Playlist => "playlist",
        }
    }

    /// Classify a context by its remote-declared type. Unknown types map to
    /// no context at all.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "album" => Some(Self::Album),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

/// One play of a song. Append-only, never mutated or deleted.
///
/// `played_at` is kept in the exact string form the remote reported
/// (ISO-8601, lexicographically sortable); it is the watermark the listening
/// sync compares against, so it must never be re-parsed and re-formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Listening {
    pub song_id: String,
    pub played_at: String,
    pub context: Option<PlayContext>,
    /// Context album id, when `context` is `Album`
    pub album_id: Option<String>,
    /// Context playlist id, when `context` is `Playlist`
    pub playlist_id: Option<String>,
}

impl Listening {
    pub const TABLE: &'static str = "Listening";
}

/// Song↔Artist association table name.
pub const SONG_BY_ARTIST_TABLE: &str = "SongByArtist";

/// Song∈Playlist membership table name.
pub const SONG_IN_PLAYLIST_TABLE: &str = "SongInPlaylist";
