use agentcord::config::Config;
use agentcord::http::{self, AppState};
use agentcord::router::InteractionRouter;
use agentcord_discord::Ed25519Verifier;
use anyhow::{Context, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    agentcord::logging::init(&config.logging);

    let verifier = Ed25519Verifier::from_hex(&config.discord.public_key)
        .context("DISCORD_PUBLIC_KEY is not a valid ed25519 public key")?;
    let router = InteractionRouter::from_config(&config)?;

    tracing::info!(
        api_base_url = %config.cursor.api_base_url,
        "agentcord starting"
    );

    let state = AppState {
        verifier: Arc::new(verifier),
        router,
    };
    http::serve(&config.bind_address(), state).await?;

    tracing::info!("agentcord stopped");
    Ok(())
}
