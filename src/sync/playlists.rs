//! Playlist-set reconciliation.
//!
//! Brings the store's playlists and membership rows to match the remote
//! state: playlist metadata is upserted, then the membership set is diffed
//! against the remote track listing - stored-but-gone memberships are
//! deleted, remote-but-missing ones are added (ensuring their Song first).
//!
//! Each playlist is committed independently, so a crash loses at most the
//! in-flight playlist; already-committed ones are not re-processed by the
//! next run (re-reconciling them is a no-op anyway).

use std::collections::HashSet;

use futures::TryStreamExt;
use tracing::info;

use super::{SyncError, ensure_song};
use crate::remote::RemoteSource;
use crate::store::Store;
use crate::{normalize, store};

/// What a playlist pass did, for the CLI summary and for tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaylistSyncReport {
    /// Playlists reconciled
    pub playlists: usize,
    /// Membership rows added across all playlists
    pub songs_added: usize,
    /// Membership rows deleted across all playlists
    pub songs_removed: usize,
}

/// Reconcile every playlist of the current user.
pub async fn pull_playlists<R: RemoteSource>(
    remote: &R,
    store: &Store,
) -> Result<PlaylistSyncReport, SyncError> {
    let mut report = PlaylistSyncReport::default();

    let mut playlists = remote.playlists();
    while let Some(resource) = playlists.try_next().await? {
        let playlist = normalize::playlist_from_resource(&resource);

        // The whole listing is needed for the set diff; pages arrive lazily
        // but the ids must all be known before deletions can be computed.
        let mut remote_tracks = Vec::new();
        {
            let mut tracks = remote.playlist_tracks(&playlist.spotify_id);
            while let Some(track) = tracks.try_next().await? {
                remote_tracks.push(track);
            }
        }
        let remote_ids: HashSet<String> = remote_tracks
            .iter()
            .map(|entry| normalize::track_id(&entry.track))
            .collect();

        let mut tx = store.begin().await?;

        store::upsert_playlist(&mut tx, &playlist).await?;

        let saved_ids: HashSet<String> =
            store::playlist_song_ids(&mut tx, &playlist.spotify_id)
                .await?
                .into_iter()
                .collect();

        // Removing songs in the store but no longer in the remote playlist.
        // Set iteration order is arbitrary; nothing may depend on it.
        for song_id in saved_ids.difference(&remote_ids) {
            store::remove_playlist_entry(&mut tx, song_id, &playlist.spotify_id).await?;
            info!(
                "Deleted song: {} in playlist {} ({})",
                song_id, playlist.spotify_id, playlist.name
            );
            report.songs_removed += 1;
        }

        // Adding songs in the remote playlist but not yet stored, in remote
        // listing order
        for entry in &remote_tracks {
            let song_id = normalize::track_id(&entry.track);
            if saved_ids.contains(&song_id) {
                continue;
            }
            ensure_song(&mut tx, &entry.track).await?;
            store::add_playlist_entry(
                &mut tx,
                &song_id,
                &playlist.spotify_id,
                entry.added_at.as_deref(),
            )
            .await?;
            info!(
                "Added song: {} ({}) in playlist {} ({})",
                song_id, entry.track.name, playlist.spotify_id, playlist.name
            );
            report.songs_added += 1;
        }

        tx.commit().await?;
        report.playlists += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::LOCAL_ID_PREFIX;
    use crate::remote::traits::mocks::MockRemote;
    use crate::test_utils::{
        playlist, playlist_resource, playlist_track, song, temp_store, track_resource,
    };

    async fn membership_set(store: &Store, playlist_id: &str) -> HashSet<String> {
        let mut conn = store.pool().acquire().await.unwrap();
        store::playlist_song_ids(&mut conn, playlist_id)
            .await
            .unwrap()
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_add_playlist_with_remote_and_local_track() {
        let (_dir, store) = temp_store().await;

        let mut remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Tarantino")],
            ..Default::default()
        };
        remote.playlist_tracks.insert(
            "test_playlist_id".to_string(),
            vec![
                playlist_track(
                    "2020-01-16T08:00:00Z",
                    track_resource(Some("t1"), "Son of a Preacher Man", &["Dusty Springfield"]),
                ),
                playlist_track(
                    "2020-01-16T08:05:00Z",
                    track_resource(None, "Jungle Boogie", &["Kool & The Gang"]),
                ),
            ],
        );

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(
            report,
            PlaylistSyncReport {
                playlists: 1,
                songs_added: 2,
                songs_removed: 0
            }
        );

        // Playlist metadata landed
        let (name, owner): (String, Option<String>) =
            sqlx::query_as("SELECT name, owner_name FROM Playlist WHERE spotify_id = 'test_playlist_id'")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(name, "Tarantino");
        assert_eq!(owner.as_deref(), Some("Valentin"));

        // Both songs exist, the local one under its synthesized id
        let ids: Vec<String> = sqlx::query_scalar("SELECT spotify_id FROM Song ORDER BY name")
            .fetch_all(store.pool())
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0].starts_with(LOCAL_ID_PREFIX)); // Jungle Boogie
        assert_eq!(ids[1], "t1");

        // Memberships carry the remote-reported added-at
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT song_id, added_at FROM SongInPlaylist WHERE playlist_id = 'test_playlist_id' ORDER BY added_at",
        )
        .fetch_all(store.pool())
        .await
        .unwrap();
        assert_eq!(rows[0], ("t1".to_string(), "2020-01-16T08:00:00Z".to_string()));
        assert_eq!(rows[1].1, "2020-01-16T08:05:00Z");
        assert!(rows[1].0.starts_with(LOCAL_ID_PREFIX));
    }

    #[tokio::test]
    async fn test_playlist_metadata_is_updated() {
        let (_dir, store) = temp_store().await;
        {
            let mut conn = store.pool().acquire().await.unwrap();
            store::upsert_playlist(&mut conn, &playlist("test_playlist_id", "Tarantino"))
                .await
                .unwrap();
        }

        let remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Tarantino Tunes")],
            ..Default::default()
        };

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(report.songs_added, 0);
        assert_eq!(report.songs_removed, 0);
        let name: String =
            sqlx::query_scalar("SELECT name FROM Playlist WHERE spotify_id = 'test_playlist_id'")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(name, "Tarantino Tunes");
    }

    #[tokio::test]
    async fn test_new_remote_track_is_added() {
        let (_dir, store) = temp_store().await;
        {
            let mut conn = store.pool().acquire().await.unwrap();
            store::upsert_playlist(&mut conn, &playlist("test_playlist_id", "Tarantino"))
                .await
                .unwrap();
            store::insert_song_if_absent(&mut conn, &song("t1", "Son of a Preacher Man"))
                .await
                .unwrap();
            store::add_playlist_entry(&mut conn, "t1", "test_playlist_id", Some("2020-01-16T08:00:00Z"))
                .await
                .unwrap();
        }

        let mut remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Tarantino")],
            ..Default::default()
        };
        remote.playlist_tracks.insert(
            "test_playlist_id".to_string(),
            vec![
                playlist_track(
                    "2020-01-16T08:00:00Z",
                    track_resource(Some("t1"), "Son of a Preacher Man", &["Dusty Springfield"]),
                ),
                playlist_track(
                    "2020-01-16T08:05:00Z",
                    track_resource(Some("t2"), "Jungle Boogie", &["Kool & The Gang"]),
                ),
            ],
        );

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(report.songs_added, 1);
        assert_eq!(report.songs_removed, 0);
        assert_eq!(
            membership_set(&store, "test_playlist_id").await,
            HashSet::from(["t1".to_string(), "t2".to_string()])
        );
    }

    #[tokio::test]
    async fn test_gone_remote_track_is_removed() {
        let (_dir, store) = temp_store().await;
        {
            let mut conn = store.pool().acquire().await.unwrap();
            store::upsert_playlist(&mut conn, &playlist("test_playlist_id", "Tarantino"))
                .await
                .unwrap();
            for (id, name) in [("t1", "Son of a Preacher Man"), ("t2", "Jungle Boogie")] {
                store::insert_song_if_absent(&mut conn, &song(id, name)).await.unwrap();
                store::add_playlist_entry(&mut conn, id, "test_playlist_id", None)
                    .await
                    .unwrap();
            }
        }

        let mut remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Tarantino")],
            ..Default::default()
        };
        remote.playlist_tracks.insert(
            "test_playlist_id".to_string(),
            vec![playlist_track(
                "2020-01-16T08:00:00Z",
                track_resource(Some("t1"), "Son of a Preacher Man", &["Dusty Springfield"]),
            )],
        );

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(report.songs_added, 0);
        assert_eq!(report.songs_removed, 1);
        assert_eq!(
            membership_set(&store, "test_playlist_id").await,
            HashSet::from(["t1".to_string()])
        );

        // The song row itself is never deleted
        let songs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Song")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(songs, 2);
    }

    #[tokio::test]
    async fn test_mixed_start_state_converges() {
        let (_dir, store) = temp_store().await;
        {
            let mut conn = store.pool().acquire().await.unwrap();
            store::upsert_playlist(&mut conn, &playlist("test_playlist_id", "Mix"))
                .await
                .unwrap();
            for id in ["t2", "t3"] {
                store::insert_song_if_absent(&mut conn, &song(id, id)).await.unwrap();
                store::add_playlist_entry(&mut conn, id, "test_playlist_id", None)
                    .await
                    .unwrap();
            }
        }

        let mut remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Mix")],
            ..Default::default()
        };
        remote.playlist_tracks.insert(
            "test_playlist_id".to_string(),
            vec![
                playlist_track("2020-01-16T08:00:00Z", track_resource(Some("t1"), "One", &["A"])),
                playlist_track("2020-01-16T08:05:00Z", track_resource(Some("t3"), "Three", &["C"])),
            ],
        );

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(report.songs_added, 1);
        assert_eq!(report.songs_removed, 1);
        assert_eq!(
            membership_set(&store, "test_playlist_id").await,
            HashSet::from(["t1".to_string(), "t3".to_string()])
        );
    }

    #[tokio::test]
    async fn test_empty_playlist_reconciles_to_empty() {
        let (_dir, store) = temp_store().await;

        let remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Empty")],
            ..Default::default()
        };

        let report = pull_playlists(&remote, &store).await.unwrap();

        assert_eq!(report.playlists, 1);
        assert!(membership_set(&store, "test_playlist_id").await.is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let (_dir, store) = temp_store().await;

        let mut remote = MockRemote {
            playlists: vec![playlist_resource("test_playlist_id", "Tarantino")],
            ..Default::default()
        };
        remote.playlist_tracks.insert(
            "test_playlist_id".to_string(),
            vec![
                playlist_track(
                    "2020-01-16T08:00:00Z",
                    track_resource(Some("t1"), "Son of a Preacher Man", &["Dusty Springfield"]),
                ),
                playlist_track(
                    "2020-01-16T08:05:00Z",
                    track_resource(None, "Jungle Boogie", &["Kool & The Gang"]),
                ),
            ],
        );

        let first = pull_playlists(&remote, &store).await.unwrap();
        let before = membership_set(&store, "test_playlist_id").await;

        let second = pull_playlists(&remote, &store).await.unwrap();
        let after = membership_set(&store, "test_playlist_id").await;

        assert_eq!(first.songs_added, 2);
        assert_eq!(second.songs_added, 0);
        assert_eq!(second.songs_removed, 0);
        assert_eq!(before, after);
    }
}
