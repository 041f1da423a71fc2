use crate::types::{Attachment, Interaction, Message, User};
use std::borrow::Cow;

pub const CHANNEL_CONTEXT_HEADER: &str = "=== CHANNEL CONTEXT ===";
pub const MESSAGE_CONTEXT_HEADER: &str = "=== DISCORD MESSAGE CONTEXT ===";
pub const USER_TASK_HEADER: &str = "=== USER TASK ===";

pub const MODAL_EXCERPT_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedMessage {
    pub id: String,
    pub content: String,
    pub author: User,
    pub timestamp: String,
    pub attachments: Vec<Attachment>,
    pub embed_count: usize,
}

impl From<&Message> for ReferencedMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            content: message.content.clone(),
            author: message.author.clone(),
            timestamp: message.timestamp.clone(),
            attachments: message.attachments.clone(),
            embed_count: message.embeds.len(),
        }
    }
}

pub fn extract_referenced_message(interaction: &Interaction) -> Option<ReferencedMessage> {
    interaction
        .message
        .as_ref()?
        .referenced_message
        .as_deref()
        .map(ReferencedMessage::from)
}

pub fn extract_target_message(interaction: &Interaction) -> Option<ReferencedMessage> {
    let data = interaction.data.as_ref()?;
    let target_id = data.target_id.as_deref()?;
    data.resolved
        .as_ref()?
        .messages
        .get(target_id)
        .map(ReferencedMessage::from)
}

/// Returns `user_prompt` untouched when there is nothing to add.
pub fn build_prompt_with_context<'a>(
    user_prompt: &'a str,
    referenced: Option<&ReferencedMessage>,
) -> Cow<'a, str> {
    let Some(message) = referenced else {
        return Cow::Borrowed(user_prompt);
    };

    let mut lines: Vec<String> = vec![CHANNEL_CONTEXT_HEADER.to_string(), String::new()];

    let bot_marker = if message.author.bot { " [BOT]" } else { "" };
    lines.push(format!(
        "Message from @{}{}:",
        message.author.display_name(),
        bot_marker
    ));

    if !message.content.is_empty() {
        lines.push(message.content.clone());
    }

    if !message.attachments.is_empty() {
        lines.push(String::new());
        lines.push("Attachments:".to_string());
        for attachment in &message.attachments {
            lines.push(format!(
                "- {} ({}): {}",
                attachment.filename,
                attachment.content_type.as_deref().unwrap_or("unknown"),
                attachment.url
            ));
        }
    }

    if message.embed_count > 0 {
        lines.push(String::new());
        lines.push(format!(
            "[Message contains {} embed(s)]",
            message.embed_count
        ));
    }

    lines.push(String::new());
    lines.push(USER_TASK_HEADER.to_string());
    lines.push(String::new());
    lines.push(user_prompt.to_string());

    Cow::Owned(lines.join("\n"))
}

/// Prompt for a launch from the "Ask Agent" form: two free-text boxes, no
/// author or attachment metadata.
pub fn build_modal_prompt(message_context: &str, task: &str) -> String {
    format!("{MESSAGE_CONTEXT_HEADER}\n\n{message_context}\n\n{USER_TASK_HEADER}\n\n{task}")
}

pub fn modal_excerpt(content: &str) -> String {
    if content.chars().count() <= MODAL_EXCERPT_LIMIT {
        return content.to_string();
    }
    let head: String = content.chars().take(MODAL_EXCERPT_LIMIT - 3).collect();
    format!("{head}...")
}
