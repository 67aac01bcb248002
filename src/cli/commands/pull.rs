//! Incremental sync command.

use tokio::runtime::Runtime;

use super::PullTarget;
use crate::config;
use crate::remote::{SpotifyClient, auth};
use crate::sync;

/// Pull playlists and/or listening history into the local database.
pub fn cmd_pull(rt: &Runtime, what: PullTarget) -> anyhow::Result<i32> {
    rt.block_on(async {
        let conf = config::load();
        let Some((client_id, client_secret)) = conf.credentials() else {
            println!("{}", config::missing_credentials_message());
            return Ok(1);
        };

        let Some(store) = super::open_store().await? else {
            return Ok(1);
        };

        let data_dir = config::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let tokens_path = auth::tokens_path(&data_dir);
        let Some(mut session) = auth::load_session(&tokens_path)? else {
            println!("User not authenticated. Authenticate with `spinlog auth`");
            return Ok(0);
        };

        if session.is_expired() {
            let http = reqwest::Client::new();
            session = auth::refresh_session(&http, client_id, client_secret, &session).await?;
            auth::save_session(&tokens_path, &session)?;
        }

        let client = SpotifyClient::new(session.access_token, conf.throttle_interval());

        if what.includes_playlists() {
            let report = sync::pull_playlists(&client, &store).await?;
            println!(
                "Playlists: {} synced, {} songs added, {} removed",
                report.playlists, report.songs_added, report.songs_removed
            );
        }
        if what.includes_listenings() {
            let report = sync::pull_listenings(&client, &store).await?;
            println!("Listenings: {} added", report.inserted);
        }

        Ok(0)
    })
}
