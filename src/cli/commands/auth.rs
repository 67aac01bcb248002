//! One-time OAuth authentication command.

use std::io::{self, Write};

use tokio::runtime::Runtime;

use crate::config;
use crate::remote::auth;

/// Walk the user through the authorization-code flow and cache the session.
pub fn cmd_auth(rt: &Runtime) -> anyhow::Result<i32> {
    rt.block_on(async {
        let conf = config::load();
        let Some((client_id, client_secret)) = conf.credentials() else {
            println!("{}", config::missing_credentials_message());
            return Ok(1);
        };
        let data_dir = config::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        let state = auth::random_state();
        println!("Open this URL in your browser and approve access:");
        println!();
        println!("  {}", auth::authorize_url(client_id, &state));
        println!();
        print!("Paste the redirect URL (or just the code): ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let code = auth::code_from_redirect(&line);
        if code.is_empty() {
            println!("No authorization code provided.");
            return Ok(1);
        }

        let http = reqwest::Client::new();
        let session = auth::exchange_code(&http, client_id, client_secret, &code).await?;

        let tokens_path = auth::tokens_path(&data_dir);
        auth::save_session(&tokens_path, &session)?;
        println!("Authenticated. Session cached in {}", tokens_path.display());

        Ok(0)
    })
}
