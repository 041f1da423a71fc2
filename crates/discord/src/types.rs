use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const EPHEMERAL_FLAG: u64 = 1 << 6;

pub const ACTION_ROW: u8 = 1;
pub const TEXT_INPUT: u8 = 4;
pub const TEXT_INPUT_SHORT: u8 = 1;
pub const TEXT_INPUT_PARAGRAPH: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl InteractionKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::Autocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind_code: u8,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        InteractionKind::from_code(self.kind_code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub command_type: Option<u8>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub resolved: Option<ResolvedData>,
    #[serde(default)]
    pub components: Vec<ActionRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub messages: HashMap<String, Message>,
    #[serde(default)]
    pub users: HashMap<String, User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        match self.global_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub author: User,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub referenced_message: Option<Box<Message>>,
}

/// Leaf value of a slash-command option. Integers and fractional numbers
/// stay distinct so lookups never coerce between types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Integer(n) => Some(*n as f64),
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OptionValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

fn option_value<'a>(options: &'a [CommandOption], name: &str) -> Option<&'a OptionValue> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
}

/// `None` when the option is absent or holds a non-string value.
pub fn string_option<'a>(options: &'a [CommandOption], name: &str) -> Option<&'a str> {
    option_value(options, name).and_then(OptionValue::as_str)
}

pub fn number_option(options: &[CommandOption], name: &str) -> Option<f64> {
    option_value(options, name).and_then(OptionValue::as_f64)
}

pub fn bool_option(options: &[CommandOption], name: &str) -> Option<bool> {
    option_value(options, name).and_then(OptionValue::as_bool)
}

/// Text input inside a modal. Outbound forms fill in the presentation
/// fields; inbound submissions carry only `custom_id` and `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    #[serde(rename = "type", default = "text_input_type")]
    pub kind: u8,
    pub custom_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

fn text_input_type() -> u8 {
    TEXT_INPUT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    #[serde(rename = "type", default = "action_row_type")]
    pub kind: u8,
    #[serde(default)]
    pub components: Vec<TextInput>,
}

fn action_row_type() -> u8 {
    ACTION_ROW
}

impl ActionRow {
    pub fn single(input: TextInput) -> Self {
        Self {
            kind: ACTION_ROW,
            components: vec![input],
        }
    }
}

pub fn submitted_value<'a>(rows: &'a [ActionRow], custom_id: &str) -> Option<&'a str> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find(|component| component.custom_id == custom_id)
        .and_then(|component| component.value.as_deref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Pong = 1,
    ChannelMessageWithSource = 4,
    Modal = 9,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalData {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<ActionRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Modal(ModalData),
    Message(MessageData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind_code: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind_code: ResponseKind::Pong as u8,
            data: None,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self::with_message(MessageData {
            content: Some(content.into()),
            ..MessageData::default()
        })
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::with_message(MessageData {
            content: Some(content.into()),
            flags: Some(EPHEMERAL_FLAG),
            ..MessageData::default()
        })
    }

    pub fn embeds(embeds: Vec<Embed>) -> Self {
        Self::with_message(MessageData {
            embeds,
            ..MessageData::default()
        })
    }

    pub fn modal(modal: ModalData) -> Self {
        Self {
            kind_code: ResponseKind::Modal as u8,
            data: Some(ResponseData::Modal(modal)),
        }
    }

    fn with_message(data: MessageData) -> Self {
        Self {
            kind_code: ResponseKind::ChannelMessageWithSource as u8,
            data: Some(ResponseData::Message(data)),
        }
    }

    pub fn message_data(&self) -> Option<&MessageData> {
        match &self.data {
            Some(ResponseData::Message(data)) => Some(data),
            _ => None,
        }
    }

    pub fn modal_data(&self) -> Option<&ModalData> {
        match &self.data {
            Some(ResponseData::Modal(data)) => Some(data),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.message_data().and_then(|data| data.content.as_deref())
    }

    pub fn is_ephemeral(&self) -> bool {
        self.message_data()
            .and_then(|data| data.flags)
            .is_some_and(|flags| flags & EPHEMERAL_FLAG != 0)
    }
}
