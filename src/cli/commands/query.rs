//! Read-only query commands over the mirrored store.

use tokio::runtime::Runtime;

use crate::query;

/// Search songs by name and artist names, best matches first.
pub fn cmd_search(rt: &Runtime, query_text: &str, limit: usize) -> anyhow::Result<i32> {
    rt.block_on(async {
        let Some(store) = super::open_store().await? else {
            return Ok(1);
        };

        let results = query::search_songs(store.pool(), query_text, limit).await?;
        if results.is_empty() {
            println!("No songs match '{query_text}'");
            return Ok(0);
        }

        for result in results {
            println!(
                "{:>3}  {}  {} - {}",
                result.score, result.song.spotify_id, result.song.name, result.song.artists_names
            );
        }
        Ok(0)
    })
}

/// Print every recorded listening of a song, oldest first.
pub fn cmd_listenings(rt: &Runtime, song_id: &str) -> anyhow::Result<i32> {
    rt.block_on(async {
        let Some(store) = super::open_store().await? else {
            return Ok(1);
        };

        let Some(song) = query::song_by_id(store.pool(), song_id).await? else {
            println!("No song with id {song_id}");
            return Ok(1);
        };

        let listenings = query::listenings_for_song(store.pool(), song_id).await?;
        println!(
            "{} - {}: {} listenings",
            song.name,
            song.artists_names,
            listenings.len()
        );
        for listening in listenings {
            let epoch = listening
                .played_at_epoch
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| "?".to_string());
            let context_id = listening.playlist_id.or(listening.album_id);
            let context = match (listening.context, context_id) {
                (Some(kind), Some(id)) => format!("  [{kind} {id}]"),
                (Some(kind), None) => format!("  [{kind}]"),
                _ => String::new(),
            };
            println!(
                "#{:<6} {}  (epoch {}){}",
                listening.listening_id, listening.played_at, epoch, context
            );
        }
        Ok(0)
    })
}
