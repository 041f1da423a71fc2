use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Running,
    Finished,
    Stopped,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Running => "RUNNING",
            AgentStatus::Finished => "FINISHED",
            AgentStatus::Stopped => "STOPPED",
            AgentStatus::Failed => "FAILED",
            AgentStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSource {
    pub repository: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTarget {
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub auto_create_pr: Option<bool>,
    #[serde(default)]
    pub open_as_cursor_github_app: Option<bool>,
    #[serde(default)]
    pub skip_reviewer_request: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: AgentStatus,
    pub source: AgentSource,
    #[serde(default)]
    pub target: AgentTarget,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentListResponse {
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    UserMessage,
    AssistantMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub role: ConversationRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimension {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptImage {
    pub data: String,
    pub dimension: ImageDimension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PromptImage>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_create_pr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_as_cursor_github_app: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reviewer_request: Option<bool>,
}

impl LaunchTarget {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchAgentRequest {
    pub prompt: Prompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub source: AgentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<LaunchTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
}

impl LaunchAgentRequest {
    pub fn new(prompt: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            prompt: Prompt::text(prompt),
            model: None,
            source: AgentSource {
                repository: repository.into(),
                git_ref: None,
            },
            target: None,
            webhook: None,
        }
    }

    pub fn with_ref(mut self, git_ref: Option<String>) -> Self {
        self.source.git_ref = git_ref;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// An all-empty target is dropped so the remote defaults apply.
    pub fn with_target(mut self, target: LaunchTarget) -> Self {
        self.target = (!target.is_empty()).then_some(target);
        self
    }

    pub fn with_webhook(mut self, webhook: Option<WebhookConfig>) -> Self {
        self.webhook = webhook;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub prompt: Prompt,
}

impl FollowUpRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Prompt::text(prompt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoriesResponse {
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    pub api_key_name: String,
    pub created_at: DateTime<Utc>,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_parses_remote_shape() {
        let agent: Agent = serde_json::from_value(json!({
            "id": "bc_abc123",
            "name": "Fix login",
            "status": "RUNNING",
            "source": { "repository": "https://github.com/owner/repo", "ref": "main" },
            "target": {
                "branchName": "cursor/fix-login",
                "url": "https://cursor.com/agents?id=bc_abc123",
                "autoCreatePr": true
            },
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(agent.status, AgentStatus::Running);
        assert_eq!(agent.source.git_ref.as_deref(), Some("main"));
        assert_eq!(agent.target.branch_name.as_deref(), Some("cursor/fix-login"));
        assert_eq!(agent.target.auto_create_pr, Some(true));
        assert_eq!(agent.summary, None);
    }

    #[test]
    fn unknown_status_does_not_fail_parsing() {
        let status: AgentStatus = serde_json::from_value(json!("CREATING")).unwrap();
        assert_eq!(status, AgentStatus::Unknown);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let agent: Agent = serde_json::from_value(json!({
            "id": "bc_x1",
            "status": "FINISHED",
            "source": { "repository": "owner/repo" },
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(agent.display_name(), "bc_x1");
    }

    #[test]
    fn launch_request_omits_unset_fields() {
        let request = LaunchAgentRequest::new("Fix it", "owner/repo")
            .with_target(LaunchTarget::default());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "prompt": { "text": "Fix it" },
                "source": { "repository": "owner/repo" }
            })
        );
    }

    #[test]
    fn launch_request_uses_camel_case_target() {
        let request = LaunchAgentRequest::new("Fix it", "owner/repo")
            .with_ref(Some("develop".into()))
            .with_model(Some("gpt-5".into()))
            .with_target(LaunchTarget {
                branch_name: Some("fix/it".into()),
                auto_create_pr: Some(true),
                ..LaunchTarget::default()
            });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["source"]["ref"], "develop");
        assert_eq!(value["model"], "gpt-5");
        assert_eq!(value["target"]["branchName"], "fix/it");
        assert_eq!(value["target"]["autoCreatePr"], true);
    }
}
