//! Listening-history reconciliation.
//!
//! The remote feed has no stable event identifier, so overlap with the
//! previous pull is detected by a high-water mark instead of deduplication:
//! the most recent played-at already stored. The feed is walked newest to
//! oldest and cut the moment an event's played-at equals the watermark
//! exactly - everything older is already on record.
//!
//! Watermark strings are compared bytewise. They are stored in the exact
//! form the remote reported (ISO-8601 sorts lexicographically), which is why
//! the normalizer never reformats played-at.
//!
//! The whole walk commits once at the end: a crash mid-walk loses the pass,
//! and re-running from the unchanged watermark re-inserts the same events.

use futures::TryStreamExt;
use tracing::info;

use super::{SyncError, ensure_song};
use crate::remote::RemoteSource;
use crate::store::Store;
use crate::{normalize, store};

/// What a listening pass did, for the CLI summary and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListeningSyncReport {
    /// Events inserted this pass
    pub inserted: usize,
    /// Whether the walk hit the watermark (false means a possible gap: the
    /// remote window was shorter than the time since the last pull, or the
    /// store was empty)
    pub matched_previous: bool,
    /// Played-at of the newest event seen, inserted or not
    pub newest_played_at: Option<String>,
    /// Played-at of the oldest event actually inserted
    pub oldest_inserted: Option<String>,
}

/// Append the listening events not yet recorded.
pub async fn pull_listenings<R: RemoteSource>(
    remote: &R,
    store: &Store,
) -> Result<ListeningSyncReport, SyncError> {
    let mut tx = store.begin().await?;
    let last_known_played_at = store::latest_played_at(&mut tx).await?;

    let mut report = ListeningSyncReport::default();
    {
        let mut feed = remote.recently_played();
        while let Some(item) = feed.try_next().await? {
            let listening = normalize::listening_from_resource(&item);

            if report.newest_played_at.is_none() {
                report.newest_played_at = Some(listening.played_at.clone());
            }

            if Some(&listening.played_at) == last_known_played_at.as_ref() {
                info!("Match previous listenings fetch at {}", listening.played_at);
                report.matched_previous = true;
                break;
            }

            ensure_song(&mut tx, &item.track).await?;
            store::insert_listening(&mut tx, &listening).await?;
            report.inserted += 1;
            report.oldest_inserted = Some(listening.played_at);
        }
    }

    if !report.matched_previous {
        info!(
            "No match for previous listenings fetch. Hole between {} and {}",
            last_known_played_at.as_deref().unwrap_or("<none>"),
            report.oldest_inserted.as_deref().unwrap_or("<none>"),
        );
    }

    tx.commit().await?;
    info!(
        "Added {} listenings. Newest played_at is now {}",
        report.inserted,
        report.newest_played_at.as_deref().unwrap_or("<none>"),
    );

    Ok(report)
}
