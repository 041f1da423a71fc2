use agentcord_discord::CommandSchema;
use anyhow::{anyhow, Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
}

pub fn commands_url(api_base_url: &str, application_id: &str) -> String {
    format!(
        "{}/applications/{}/commands",
        api_base_url.trim_end_matches('/'),
        application_id
    )
}

pub async fn register_commands(
    http: &Client,
    api_base_url: &str,
    application_id: &str,
    bot_token: &str,
    commands: &[CommandSchema],
) -> Result<Vec<RegisteredCommand>> {
    let url = commands_url(api_base_url, application_id);

    let response = http
        .put(&url)
        .header(AUTHORIZATION, format!("Bot {bot_token}"))
        .json(commands)
        .send()
        .await
        .context("failed to reach the Discord API")?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let detail = serde_json::to_string_pretty(&body).unwrap_or_default();
        return Err(anyhow!("Discord API error ({status}): {detail}"));
    }

    serde_json::from_value(body).context("unexpected command registration response")
}
