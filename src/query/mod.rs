//! Read-only query surface over the mirrored store.
//!
//! Consumed by the presentation layer; nothing here writes. Played-at
//! strings are stored verbatim and only converted to epoch seconds at this
//! boundary.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::model::{Listening, Song};

const SONG_COLUMNS: &str = "spotify_id, api_url, web_url, name, cover_url, duration, explicit, \
     isrc, is_local, popularity, preview_url, track_number, album_id, album_name, artists_names";

/// Fetch one song by its identifier.
pub async fn song_by_id(pool: &SqlitePool, spotify_id: &str) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "SELECT {SONG_COLUMNS} FROM {} WHERE spotify_id = ?",
        Song::TABLE
    ))
    .bind(spotify_id)
    .fetch_optional(pool)
    .await
}

/// One recorded play of a song, as served to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SongListening {
    pub listening_id: i64,
    /// Exact stored form
    pub played_at: String,
    /// Epoch seconds derived from `played_at` (second precision); `None` if
    /// the stored string doesn't parse
    pub played_at_epoch: Option<i64>,
    pub context: Option<String>,
    pub album_id: Option<String>,
    pub playlist_id: Option<String>,
}

/// All listenings of a song, ordered by played-at ascending.
pub async fn listenings_for_song(
    pool: &SqlitePool,
    song_id: &str,
) -> sqlx::Result<Vec<SongListening>> {
    type Row = (i64, String, Option<String>, Option<String>, Option<String>);
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "SELECT listening_id, played_at, context, album_id, playlist_id \
         FROM {} WHERE song_id = ? ORDER BY played_at ASC",
        Listening::TABLE
    ))
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(listening_id, played_at, context, album_id, playlist_id)| SongListening {
                listening_id,
                played_at_epoch: played_at_epoch(&played_at),
                played_at,
                context,
                album_id,
                playlist_id,
            },
        )
        .collect())
}

/// Epoch seconds from a stored played-at string, at second precision: the
/// first 19 characters are `YYYY-MM-DDTHH:MM:SS`, anything after (fractional
/// seconds, zone suffix) is ignored.
fn played_at_epoch(played_at: &str) -> Option<i64> {
    let prefix = played_at.get(..19)?;
    NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|datetime| datetime.and_utc().timestamp())
}

/// One search hit with its ranking score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub song: Song,
    pub score: u32,
}

/// Free-text search over songs by name and artist names.
///
/// The query is lowercased and whitespace-tokenized; every word is scored
/// against both fields and the per-word, per-field scores add up. Ties break
/// on song name so results are stable.
pub async fn search_songs(
    pool: &SqlitePool,
    query: &str,
    limit: usize,
) -> sqlx::Result<Vec<SearchResult>> {
    let words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let songs: Vec<Song> =
        sqlx::query_as(&format!("SELECT {SONG_COLUMNS} FROM {}", Song::TABLE))
            .fetch_all(pool)
            .await?;

    let mut results: Vec<SearchResult> = songs
        .into_iter()
        .filter_map(|song| {
            let score = score_song(&words, &song);
            (score > 0).then_some(SearchResult { song, score })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.song.name.cmp(&b.song.name))
    });
    results.truncate(limit);
    Ok(results)
}

fn score_song(words: &[String], song: &Song) -> u32 {
    words
        .iter()
        .map(|word| field_score(word, &song.name) + field_score(word, &song.artists_names))
        .sum()
}

/// Score one query word against one field. The strongest matching class
/// counts: exact field 5, first token 4, whole token 3, token prefix 2, bare
/// substring 1.
fn field_score(word: &str, field: &str) -> u32 {
    let field = field.to_lowercase();
    if field == word {
        return 5;
    }
    if field.split_whitespace().next() == Some(word) {
        return 4;
    }
    if field.split_whitespace().any(|token| token == word) {
        return 3;
    }
    if field.split_whitespace().any(|token| token.starts_with(word)) {
        return 2;
    }
    if field.contains(word) {
        return 1;
    }
    0
}
