//! Entity normalizer: raw Spotify resources to canonical models.
//!
//! Pure transformation only - nothing in this module touches the store.
//! Each function maps one wire resource from [`crate::remote::dto`] into the
//! corresponding [`crate::model`] entity, extracting the stable identifier
//! and reference URLs uniformly across entity kinds.
//!
//! Locally-sourced tracks carry no remote identifier, so one is synthesized:
//! a SHA-256 over the track's name, its sorted artist names and its duration,
//! rendered as `local:<hex>`. The prefix keeps synthesized ids out of the
//! remote id space, and the sort makes the hash independent of the order the
//! remote happens to list artists in.

use sha2::{Digest, Sha256};

use crate::model::{Album, Artist, Listening, PlayContext, Playlist, Song};
use crate::remote::dto;

/// Namespace prefix of synthesized local-track identifiers.
pub const LOCAL_ID_PREFIX: &str = "local:";

/// Stable identifier of a track: the remote id when present, otherwise the
/// synthesized local id.
pub fn track_id(track: &dto::TrackResource) -> String {
    match &track.id {
        Some(id) => id.clone(),
        None => local_track_id(track),
    }
}

/// Deterministic identifier for a track without a remote id.
///
/// Two plays of "the same" local file always resolve to the same id, whatever
/// order their artists arrive in.
pub fn local_track_id(track: &dto::TrackResource) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}:{}:{}",
            track.name,
            denormalize_artists(&track.artists),
            track.duration_ms
        )
        .as_bytes(),
    );
    format!("{}{:x}", LOCAL_ID_PREFIX, hasher.finalize())
}

/// Artist names sorted and joined with ", " (the denormalized form stored on
/// each song and hashed into local ids).
pub fn denormalize_artists(artists: &[dto::ArtistResource]) -> String {
    let mut names: Vec<&str> = artists.iter().map(|a| a.name.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}

/// First image's URL, if any. No size-based selection: Spotify lists covers
/// largest-first.
fn cover_url(images: &[dto::Image]) -> Option<String> {
    images.first().and_then(|image| image.url.clone())
}

pub fn song_from_track(track: &dto::TrackResource) -> Song {
    let album = track.album.as_ref();
    Song {
        spotify_id: track_id(track),
        api_url: track.href.clone(),
        web_url: track.external_urls.spotify.clone(),
        name: track.name.clone(),
        cover_url: album.map(|a| cover_url(&a.images)).unwrap_or(None),
        duration: track.duration_ms,
        explicit: track.explicit,
        isrc: track.external_ids.isrc.clone(),
        is_local: track.is_local,
        popularity: track.popularity,
        preview_url: track.preview_url.clone(),
        track_number: track.track_number,
        album_id: album.and_then(|a| a.id.clone()),
        album_name: album.and_then(|a| a.name.clone()),
        artists_names: denormalize_artists(&track.artists),
    }
}

/// `None` when the album carries no remote id (local tracks' albums are not
/// mirrored as rows).
pub fn album_from_resource(album: &dto::AlbumResource) -> Option<Album> {
    let id = album.id.clone()?;
    Some(Album {
        spotify_id: id,
        api_url: album.href.clone(),
        web_url: album.external_urls.spotify.clone(),
        cover_url: cover_url(&album.images),
        name: album.name.clone().unwrap_or_default(),
        release_date: album.release_date.clone(),
        release_date_precision: album.release_date_precision.clone(),
        album_type: album.album_type.clone(),
    })
}

/// `None` when the artist carries no remote id.
pub fn artist_from_resource(artist: &dto::ArtistResource) -> Option<Artist> {
    let id = artist.id.clone()?;
    Some(Artist {
        spotify_id: id,
        api_url: artist.href.clone(),
        web_url: artist.external_urls.spotify.clone(),
        name: artist.name.clone(),
    })
}

pub fn playlist_from_resource(playlist: &dto::PlaylistResource) -> Playlist {
    Playlist {
        spotify_id: playlist.id.clone(),
        api_url: playlist.href.clone(),
        web_url: playlist.external_urls.spotify.clone(),
        cover_url: cover_url(&playlist.images),
        name: playlist.name.clone(),
        is_public: playlist.public,
        owner_name: playlist
            .owner
            .as_ref()
            .and_then(|o| o.display_name.clone()),
    }
}

/// Normalize one play-history item, classifying its playback context.
///
/// `played_at` is carried through verbatim; the listening sync relies on it
/// staying byte-identical to what the remote reported.
pub fn listening_from_resource(item: &dto::PlayHistoryItem) -> Listening {
    let mut context = None;
    let mut album_id = None;
    let mut playlist_id = None;

    if let Some(resource) = &item.context {
        context = PlayContext::from_kind(&resource.kind);
        let context_id = parse_id_from_context(resource);
        match context {
            Some(PlayContext::Album) => album_id = context_id,
            Some(PlayContext::Playlist) => playlist_id = context_id,
            None => {}
        }
    }

    Listening {
        song_id: track_id(&item.track),
        played_at: item.played_at.clone(),
        context,
        album_id,
        playlist_id,
    }
}

/// Extract the id from a `spotify:<type>:<id>` context URI.
///
/// A missing or malformed URI is logged and yields `None`; the listening is
/// still recorded, just without a context id.
fn parse_id_from_context(resource: &dto::ContextResource) -> Option<String> {
    let Some(uri) = &resource.uri else {
        tracing::error!("Missing URI in {} context", resource.kind);
        return None;
    };
    match uri.split(':').nth(2) {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => {
            tracing::error!("Unparsable context URI: {}", uri);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{artist_resource, play_history_item, track_resource};
    use proptest::prelude::*;

    #[test]
    fn test_track_id_prefers_remote_id() {
        let track = track_resource(Some("t1"), "S.O.B.", &["Nathaniel Rateliff"]);
        assert_eq!(track_id(&track), "t1");
    }

    #[test]
    fn test_local_track_id_is_namespaced() {
        let track = track_resource(None, "Jungle Boogie", &["Kool & The Gang"]);
        let id = track_id(&track);
        assert!(id.starts_with(LOCAL_ID_PREFIX));
        // SHA-256 hex digest after the prefix
        assert_eq!(id.len(), LOCAL_ID_PREFIX.len() + 64);
    }

    #[test]
    fn test_local_track_id_ignores_artist_order() {
        let mut forward = track_resource(None, "Under Pressure", &["Queen", "David Bowie"]);
        let mut reversed = track_resource(None, "Under Pressure", &["David Bowie", "Queen"]);
        forward.is_local = true;
        reversed.is_local = true;

        assert_eq!(track_id(&forward), track_id(&reversed));
    }

    #[test]
    fn test_local_track_id_distinguishes_durations() {
        let mut short = track_resource(None, "Jam", &["Band"]);
        let mut long = track_resource(None, "Jam", &["Band"]);
        short.duration_ms = 180_000;
        long.duration_ms = 181_000;

        assert_ne!(track_id(&short), track_id(&long));
    }

    proptest! {
        #[test]
        fn prop_local_id_deterministic_under_artist_order(
            name in ".{0,40}",
            mut artists in proptest::collection::vec("[a-zA-Z ]{1,20}", 1..5),
            duration in 0i64..10_000_000,
        ) {
            let make = |names: &[String]| {
                let mut track = track_resource(
                    None,
                    &name,
                    &names.iter().map(String::as_str).collect::<Vec<_>>(),
                );
                track.duration_ms = duration;
                track
            };
            let forward = make(&artists);
            artists.reverse();
            let reversed = make(&artists);

            prop_assert_eq!(track_id(&forward), track_id(&reversed));
        }
    }

    #[test]
    fn test_denormalize_artists_sorts() {
        let artists = vec![
            artist_resource(Some("a2"), "Taylor Swift"),
            artist_resource(Some("a1"), "Bon Iver"),
        ];
        assert_eq!(denormalize_artists(&artists), "Bon Iver, Taylor Swift");
    }

    #[test]
    fn test_song_from_track_maps_album_fields() {
        let track = track_resource(Some("t1"), "Son of a Preacher Man", &["Dusty Springfield"]);
        let song = song_from_track(&track);

        assert_eq!(song.spotify_id, "t1");
        assert_eq!(song.album_id.as_deref(), Some("test_album_id"));
        assert_eq!(song.album_name.as_deref(), Some("Test Album"));
        assert_eq!(song.artists_names, "Dusty Springfield");
        assert_eq!(song.cover_url.as_deref(), Some("https://i.scdn.co/image/cover640"));
        assert!(!song.is_local);
    }

    #[test]
    fn test_cover_url_takes_first_image() {
        let mut track = track_resource(Some("t1"), "Song", &["Artist"]);
        let album = track.album.as_mut().unwrap();
        album.images = vec![
            dto::Image { url: Some("https://i.scdn.co/first".into()) },
            dto::Image { url: Some("https://i.scdn.co/second".into()) },
        ];

        assert_eq!(
            song_from_track(&track).cover_url.as_deref(),
            Some("https://i.scdn.co/first")
        );
    }

    #[test]
    fn test_listening_playlist_context() {
        let item = play_history_item(
            "2020-07-07T16:53:23",
            track_resource(Some("t2"), "California Dreamin'", &["Bobby Womack"]),
        );
        let listening = listening_from_resource(&item);

        assert_eq!(listening.song_id, "t2");
        assert_eq!(listening.played_at, "2020-07-07T16:53:23");
        assert_eq!(listening.context, Some(PlayContext::Playlist));
        assert_eq!(listening.playlist_id.as_deref(), Some("test_playlist_id"));
        assert!(listening.album_id.is_none());
    }

    #[test]
    fn test_listening_album_context() {
        let mut item = play_history_item(
            "2020-07-07T16:53:23",
            track_resource(Some("t2"), "Time", &["Pink Floyd"]),
        );
        item.context = Some(dto::ContextResource {
            kind: "album".into(),
            uri: Some("spotify:album:dark_side_id".into()),
        });
        let listening = listening_from_resource(&item);

        assert_eq!(listening.context, Some(PlayContext::Album));
        assert_eq!(listening.album_id.as_deref(), Some("dark_side_id"));
        assert!(listening.playlist_id.is_none());
    }

    #[test]
    fn test_listening_malformed_uri_leaves_id_absent() {
        let mut item = play_history_item(
            "2020-07-07T16:53:23",
            track_resource(Some("t2"), "Time", &["Pink Floyd"]),
        );
        item.context = Some(dto::ContextResource {
            kind: "playlist".into(),
            uri: Some("not-a-uri".into()),
        });
        let listening = listening_from_resource(&item);

        assert_eq!(listening.context, Some(PlayContext::Playlist));
        assert!(listening.playlist_id.is_none());
    }

    #[test]
    fn test_listening_missing_uri_leaves_id_absent() {
        let mut item = play_history_item(
            "2020-07-07T16:53:23",
            track_resource(Some("t2"), "Time", &["Pink Floyd"]),
        );
        item.context = Some(dto::ContextResource { kind: "playlist".into(), uri: None });

        assert!(listening_from_resource(&item).playlist_id.is_none());
    }

    #[test]
    fn test_listening_unknown_context_kind() {
        let mut item = play_history_item(
            "2020-07-07T16:53:23",
            track_resource(Some("t2"), "Time", &["Pink Floyd"]),
        );
        item.context = Some(dto::ContextResource {
            kind: "artist".into(),
            uri: Some("spotify:artist:xyz".into()),
        });
        let listening = listening_from_resource(&item);

        assert!(listening.context.is_none());
        assert!(listening.album_id.is_none());
        assert!(listening.playlist_id.is_none());
    }
}
