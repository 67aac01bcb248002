//! Shared test fixtures: wire-resource factories and a temp-file store.
//!
//! Factory defaults mirror a realistic Spotify payload so individual tests
//! only spell out the fields they care about.

use crate::model::{Album, Artist, Listening, PlayContext, Playlist, Song};
use crate::remote::dto;
use crate::store::Store;

/// A fresh store backed by a temp file. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("test.sqlite"))
        .await
        .expect("Failed to open test store");
    (dir, store)
}

// ============================================================================
// Wire resource factories
// ============================================================================

pub fn artist_resource(id: Option<&str>, name: &str) -> dto::ArtistResource {
    dto::ArtistResource {
        id: id.map(String::from),
        href: Some("https://api.spotify.com/v1/artists/test_artist_id".to_string()),
        external_urls: dto::ExternalUrls {
            spotify: Some("https://open.spotify.com/artist/test_artist_id".to_string()),
        },
        name: name.to_string(),
    }
}

pub fn album_resource(id: Option<&str>, name: &str) -> dto::AlbumResource {
    dto::AlbumResource {
        id: id.map(String::from),
        href: Some("https://api.spotify.com/v1/albums/test_album_id".to_string()),
        external_urls: dto::ExternalUrls {
            spotify: Some("https://open.spotify.com/album/test_album_id".to_string()),
        },
        images: vec![dto::Image {
            url: Some("https://i.scdn.co/image/cover640".to_string()),
        }],
        name: Some(name.to_string()),
        release_date: Some("1969-01-18".to_string()),
        release_date_precision: Some("day".to_string()),
        album_type: Some("album".to_string()),
    }
}

/// A track resource; `id: None` makes it locally-sourced.
pub fn track_resource(id: Option<&str>, name: &str, artists: &[&str]) -> dto::TrackResource {
    dto::TrackResource {
        id: id.map(String::from),
        href: Some("https://api.spotify.com/v1/tracks/test_track_id".to_string()),
        external_urls: dto::ExternalUrls {
            spotify: Some("https://open.spotify.com/track/test_track_id".to_string()),
        },
        name: name.to_string(),
        duration_ms: 314159,
        explicit: false,
        external_ids: dto::ExternalIds {
            isrc: Some("test_isrc".to_string()),
        },
        is_local: id.is_none(),
        popularity: 74,
        preview_url: Some("https://p.scdn.co/mp3-preview/test_url_token1".to_string()),
        track_number: 15,
        album: Some(album_resource(
            if id.is_none() { None } else { Some("test_album_id") },
            "Test Album",
        )),
        artists: artists
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let artist_id = format!("test_artist_id_{i}");
                artist_resource(
                    if id.is_none() { None } else { Some(artist_id.as_str()) },
                    name,
                )
            })
            .collect(),
    }
}

pub fn playlist_resource(id: &str, name: &str) -> dto::PlaylistResource {
    dto::PlaylistResource {
        id: id.to_string(),
        href: Some(format!("https://api.spotify.com/v1/playlists/{id}")),
        external_urls: dto::ExternalUrls {
            spotify: Some(format!("https://open.spotify.com/playlist/{id}")),
        },
        images: vec![dto::Image {
            url: Some("https://mosaic.scdn.co/640/test_url_token640".to_string()),
        }],
        name: name.to_string(),
        owner: Some(dto::Owner {
            display_name: Some("Valentin".to_string()),
        }),
        public: Some(false),
    }
}

pub fn playlist_track(added_at: &str, track: dto::TrackResource) -> dto::PlaylistTrackResource {
    dto::PlaylistTrackResource {
        added_at: Some(added_at.to_string()),
        track,
    }
}

/// A play-history item with a playlist context.
pub fn play_history_item(played_at: &str, track: dto::TrackResource) -> dto::PlayHistoryItem {
    dto::PlayHistoryItem {
        track,
        played_at: played_at.to_string(),
        context: Some(dto::ContextResource {
            kind: "playlist".to_string(),
            uri: Some("spotify:playlist:test_playlist_id".to_string()),
        }),
    }
}

// ============================================================================
// Model factories (for direct store seeding)
// ============================================================================

pub fn song(spotify_id: &str, name: &str) -> Song {
    Song {
        spotify_id: spotify_id.to_string(),
        api_url: Some("https://api.spotify.com/v1/tracks/test_track_id".to_string()),
        web_url: Some("https://open.spotify.com/track/test_track_id".to_string()),
        name: name.to_string(),
        cover_url: Some("https://i.scdn.co/image/cover640".to_string()),
        duration: 314159,
        explicit: false,
        isrc: Some("test_isrc".to_string()),
        is_local: false,
        popularity: 74,
        preview_url: Some("https://p.scdn.co/mp3-preview/test_url_token1".to_string()),
        track_number: 15,
        album_id: Some("test_album_id".to_string()),
        album_name: Some("Test Album".to_string()),
        artists_names: "Test Artist".to_string(),
    }
}

pub fn artist(spotify_id: &str, name: &str) -> Artist {
    Artist {
        spotify_id: spotify_id.to_string(),
        api_url: Some("https://api.spotify.com/v1/artists/test_artist_id".to_string()),
        web_url: Some("https://open.spotify.com/artist/test_artist_id".to_string()),
        name: name.to_string(),
    }
}

pub fn album(spotify_id: &str, name: &str) -> Album {
    Album {
        spotify_id: spotify_id.to_string(),
        api_url: Some("https://api.spotify.com/v1/albums/test_album_id".to_string()),
        web_url: Some("https://open.spotify.com/album/test_album_id".to_string()),
        cover_url: Some("https://i.scdn.co/image/cover640".to_string()),
        name: name.to_string(),
        release_date: Some("1969-01-18".to_string()),
        release_date_precision: Some("day".to_string()),
        album_type: Some("album".to_string()),
    }
}

pub fn playlist(spotify_id: &str, name: &str) -> Playlist {
    Playlist {
        spotify_id: spotify_id.to_string(),
        api_url: Some(format!("https://api.spotify.com/v1/playlists/{spotify_id}")),
        web_url: Some(format!("https://open.spotify.com/playlist/{spotify_id}")),
        cover_url: Some("https://mosaic.scdn.co/640/test_url_token640".to_string()),
        name: name.to_string(),
        is_public: Some(false),
        owner_name: Some("Valentin".to_string()),
    }
}

pub fn listening(song_id: &str, played_at: &str) -> Listening {
    Listening {
        song_id: song_id.to_string(),
        played_at: played_at.to_string(),
        context: Some(PlayContext::Playlist),
        album_id: None,
        playlist_id: Some("test_playlist_id".to_string()),
    }
}
