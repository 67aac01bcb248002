//! Spotify Web API Data Transfer Objects
//!
//! These types match EXACTLY what the Spotify Web API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the remote module and the normalizer -
//! convert to the canonical models in [`crate::model`].
//!
//! API Reference: https://developer.spotify.com/documentation/web-api
//!
//! Only the fields this crate consumes are declared; serde ignores the rest
//! of each payload.

use serde::Deserialize;

/// One offset-paginated page of items.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u32,
}

/// One cursor-paginated page of items (recently-played).
#[derive(Debug, Clone, Deserialize)]
pub struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Absent on the final page
    pub cursors: Option<Cursors>,
}

/// Backward/forward cursors of a cursor-paginated page.
#[derive(Debug, Clone, Deserialize)]
pub struct Cursors {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Links to a resource's public web page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// External identification codes of a track.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    pub isrc: Option<String>,
}

/// A cover image entry. Spotify lists these largest-first.
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: Option<String>,
}

/// Playlist owner reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    pub display_name: Option<String>,
}

/// A playlist as returned by `GET /me/playlists`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistResource {
    pub id: String,
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: String,
    pub owner: Option<Owner>,
    pub public: Option<bool>,
}

/// An artist reference as embedded in track objects.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistResource {
    /// Absent for artists of locally-sourced tracks
    pub id: Option<String>,
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub name: String,
}

/// An album reference as embedded in track objects.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumResource {
    /// Absent for albums of locally-sourced tracks
    pub id: Option<String>,
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub images: Vec<Image>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
    pub album_type: Option<String>,
}

/// A full track object.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackResource {
    /// `null` for locally-sourced tracks
    pub id: Option<String>,
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub name: String,
    pub duration_ms: i64,
    pub explicit: bool,
    #[serde(default)]
    pub external_ids: ExternalIds,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub popularity: i64,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub track_number: i64,
    pub album: Option<AlbumResource>,
    #[serde(default)]
    pub artists: Vec<ArtistResource>,
}

/// A track's membership in a playlist, from `GET /playlists/{id}/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackResource {
    pub added_at: Option<String>,
    pub track: TrackResource,
}

/// The playback context of a play-history item.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextResource {
    /// Declared context type ("album", "playlist", "artist", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// URI of the form `spotify:<type>:<id>`
    pub uri: Option<String>,
}

/// One play-history item, from `GET /me/player/recently-played`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistoryItem {
    pub track: TrackResource,
    pub played_at: String,
    pub context: Option<ContextResource>,
}

/// Error payload returned by the Web API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub status: Option<i64>,
    pub message: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
