use agentcord::config::Config;
use agentcord::register::register_commands;
use agentcord_discord::all_commands;
use anyhow::Result;
use reqwest::Client;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_for_registration()?;
    agentcord::logging::init(&config.logging);

    let commands = all_commands();
    tracing::info!(
        application_id = %config.discord.application_id,
        count = commands.len(),
        "Registering commands"
    );

    let registered = register_commands(
        &Client::new(),
        &config.discord.api_base_url,
        &config.discord.application_id,
        &config.discord.bot_token,
        &commands,
    )
    .await?;

    for command in &registered {
        tracing::info!("Registered /{} (ID: {})", command.name, command.id);
    }
    tracing::info!("Done. Commands are now available in Discord.");
    Ok(())
}
