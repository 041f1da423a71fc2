use agentcord_agent::{
    Agent, AgentStatus, ApiKeyInfo, AppError, ConversationMessage, ConversationRole, Repository,
};
use agentcord_discord::{Embed, EmbedField, EmbedFooter};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const MAX_EMBED_DESCRIPTION_LENGTH: usize = 4096;
const MAX_ERROR_LENGTH: usize = 1900;
const TRUNCATION_SUFFIX: &str = "... (truncated)";

const COLOR_FINISHED: u32 = 0x00ff00;
const COLOR_FAILED: u32 = 0xff0000;
const COLOR_DEFAULT: u32 = 0x0099ff;

/// Cuts on character boundaries; the result never exceeds `max_length`.
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(TRUNCATION_SUFFIX.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_SUFFIX);
    out
}

pub fn status_emoji(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Running => "🔄",
        AgentStatus::Finished => "✅",
        AgentStatus::Stopped => "⏸️",
        AgentStatus::Failed => "❌",
        AgentStatus::Unknown => "❓",
    }
}

fn status_color(status: AgentStatus) -> u32 {
    match status {
        AgentStatus::Finished => COLOR_FINISHED,
        AgentStatus::Failed => COLOR_FAILED,
        _ => COLOR_DEFAULT,
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_agent_list(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return "📋 No agents found.".to_string();
    }

    let mut message = format!("📋 **Your Agents** ({})\n\n", agents.len());
    for agent in agents {
        let _ = write!(
            message,
            "{} **{}**\n   ID: `{}` | Status: {}\n   Created: {}\n\n",
            status_emoji(agent.status),
            agent.display_name(),
            agent.id,
            agent.status.as_str(),
            format_time(&agent.created_at),
        );
    }

    truncate(&message, MAX_MESSAGE_LENGTH)
}

pub fn format_agent_status(agent: &Agent) -> Embed {
    let emoji = status_emoji(agent.status);

    let mut fields = vec![
        inline_field("Status", format!("{emoji} {}", agent.status.as_str())),
        inline_field("Repository", agent.source.repository.clone()),
    ];
    if let Some(git_ref) = non_empty(agent.source.git_ref.as_deref()) {
        fields.push(inline_field("Branch/Ref", git_ref.to_string()));
    }
    if let Some(branch) = non_empty(agent.target.branch_name.as_deref()) {
        fields.push(inline_field("Target Branch", branch.to_string()));
    }
    if let Some(pr_url) = non_empty(agent.target.pr_url.as_deref()) {
        fields.push(inline_field("Pull Request", format!("[View PR]({pr_url})")));
    }

    let description = match non_empty(agent.summary.as_deref()) {
        Some(summary) => truncate(summary, MAX_EMBED_DESCRIPTION_LENGTH),
        None => "No summary available yet.".to_string(),
    };

    Embed {
        title: Some(format!("{emoji} {}", agent.display_name())),
        description: Some(description),
        url: non_empty(Some(agent.target.url.as_str())).map(str::to_string),
        color: Some(status_color(agent.status)),
        fields,
        footer: Some(EmbedFooter {
            text: format!("Agent ID: {}", agent.id),
        }),
        timestamp: Some(agent.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

fn inline_field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn format_conversation(messages: &[ConversationMessage]) -> String {
    if messages.is_empty() {
        return "💬 No conversation history yet.".to_string();
    }

    let mut out = String::from("💬 **Conversation History**\n\n");
    for message in messages {
        let (icon, role) = match message.role {
            ConversationRole::UserMessage => ("👤", "You"),
            ConversationRole::AssistantMessage => ("🤖", "Agent"),
        };
        let _ = write!(out, "{icon} **{role}:**\n{}\n\n", message.text);
    }

    truncate(&out, MAX_MESSAGE_LENGTH)
}

pub fn format_models(models: &[String]) -> String {
    if models.is_empty() {
        return "🤖 No models available.".to_string();
    }

    let mut out = String::from("🤖 **Available Models**\n\n");
    for model in models {
        let _ = writeln!(out, "• {model}");
    }
    out.push_str("\n💡 *Tip: Use model name in `/agent create` or leave empty for auto-selection*");

    truncate(&out, MAX_MESSAGE_LENGTH)
}

pub fn format_repositories(repos: &[Repository]) -> String {
    if repos.is_empty() {
        return "📦 No repositories found.".to_string();
    }

    let mut out = String::from("📦 **Accessible Repositories**\n\n");
    out.push_str("⚠️ *This endpoint is rate-limited: 1 request/minute, 30/hour*\n\n");
    for repo in repos {
        let _ = write!(out, "• **{}/{}**\n  {}\n\n", repo.owner, repo.name, repo.repository);
    }

    truncate(&out, MAX_MESSAGE_LENGTH)
}

pub fn format_api_key_info(info: &ApiKeyInfo) -> String {
    format!(
        "🔑 **API Key Information**\n\n**Name:** {}\n**Email:** {}\n**Created:** {}\n\n✅ Your API key is valid and working!",
        info.api_key_name,
        info.user_email,
        format_time(&info.created_at),
    )
}

/// Only the user-safe message is rendered; diagnostics stay in the logs.
pub fn format_error(error: &AppError) -> String {
    format!(
        "❌ **Error**\n\n```\n{}\n```",
        truncate(error.user_message(), MAX_ERROR_LENGTH)
    )
}

pub fn format_success(message: &str) -> String {
    format!("✅ {message}")
}
