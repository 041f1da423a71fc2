use crate::config::Config;
use crate::format::{
    format_agent_list, format_agent_status, format_api_key_info, format_conversation,
    format_error, format_models, format_repositories, format_success,
};
use agentcord_agent::validation::{
    validate_agent_id, validate_branch_name, validate_limit, validate_prompt, validate_repository,
};
use agentcord_agent::{
    Agent, AppError, CloudAgentClient, ErrorKind, FollowUpRequest, LaunchAgentRequest,
    LaunchTarget, ReqwestTransport,
};
use agentcord_discord::commands::{AGENT_COMMAND, ASK_AGENT_COMMAND};
use agentcord_discord::context::modal_excerpt;
use agentcord_discord::{
    bool_option, build_modal_prompt, build_prompt_with_context, extract_referenced_message,
    extract_target_message, number_option, string_option, submitted_value, ActionRow,
    CommandOption, Interaction, InteractionData, InteractionKind, InteractionResponse, ModalData,
    TextInput, TEXT_INPUT, TEXT_INPUT_PARAGRAPH, TEXT_INPUT_SHORT,
};
use std::sync::Arc;
use std::time::Duration;

pub const ASK_AGENT_MODAL_PREFIX: &str = "ask_agent_modal:";

const REFERENCED_CONTEXT_NOTE: &str = "\n\n💬 *Context from referenced message included*";
const MODAL_CONTEXT_NOTE: &str = "\n\n💬 *Context from Discord message included*";

/// Result of routing one interaction. `Rejected` is a client-input fault and
/// becomes an HTTP 400; every command failure is already folded into `Reply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Reply(InteractionResponse),
    Rejected(String),
}

impl RouteOutcome {
    fn rejected(reason: &str) -> Self {
        RouteOutcome::Rejected(reason.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Create,
    List,
    Status,
    Conversation,
    Followup,
    Stop,
    Delete,
    Models,
    Repos,
    ApiKey,
}

impl Subcommand {
    pub fn parse(name: &str) -> Option<Self> {
        let sub = match name {
            "create" => Subcommand::Create,
            "list" => Subcommand::List,
            "status" => Subcommand::Status,
            "conversation" => Subcommand::Conversation,
            "followup" => Subcommand::Followup,
            "stop" => Subcommand::Stop,
            "delete" => Subcommand::Delete,
            "models" => Subcommand::Models,
            "repos" => Subcommand::Repos,
            "apikey" => Subcommand::ApiKey,
            _ => return None,
        };
        Some(sub)
    }
}

#[derive(Clone)]
pub struct InteractionRouter {
    client: CloudAgentClient,
}

impl InteractionRouter {
    pub fn new(client: CloudAgentClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.cursor.connect_timeout_secs),
            Duration::from_secs(config.cursor.request_timeout_secs),
        );
        let client = CloudAgentClient::with_transport(
            Arc::new(transport),
            &config.cursor.api_base_url,
            config.cursor.api_token.clone(),
        )?
        .with_retry_policy(config.retry_policy());
        Ok(Self::new(client))
    }

    pub async fn route(&self, interaction: &Interaction) -> RouteOutcome {
        tracing::debug!(
            "Routing interaction {:?} ({:?})",
            interaction.id,
            interaction.kind()
        );

        match interaction.kind() {
            InteractionKind::Ping => RouteOutcome::Reply(InteractionResponse::pong()),
            InteractionKind::ApplicationCommand => self.route_command(interaction).await,
            InteractionKind::ModalSubmit => self.route_modal(interaction).await,
            _ => RouteOutcome::rejected("Unknown interaction type"),
        }
    }

    async fn route_command(&self, interaction: &Interaction) -> RouteOutcome {
        let Some(data) = interaction.data.as_ref() else {
            return RouteOutcome::rejected("Missing command data");
        };

        match data.name.as_deref() {
            Some(ASK_AGENT_COMMAND) => return RouteOutcome::Reply(ask_agent_form(interaction)),
            Some(AGENT_COMMAND) => {}
            _ => return RouteOutcome::rejected("Unknown command"),
        }

        let Some(node) = data.options.first() else {
            return RouteOutcome::rejected("Missing subcommand");
        };

        let result = match Subcommand::parse(&node.name) {
            Some(subcommand) => {
                self.run_subcommand(subcommand, &node.options, interaction)
                    .await
            }
            None => Err(AppError::new(
                ErrorKind::Validation,
                format!("Unknown subcommand: {}", node.name),
            )),
        };

        RouteOutcome::Reply(result.unwrap_or_else(|e| {
            tracing::warn!("Command `{}` failed ({:?}): {}", node.name, e.kind(), e);
            InteractionResponse::message(format_error(&e))
        }))
    }

    async fn run_subcommand(
        &self,
        subcommand: Subcommand,
        options: &[CommandOption],
        interaction: &Interaction,
    ) -> Result<InteractionResponse, AppError> {
        match subcommand {
            Subcommand::Create => self.create(options, interaction).await,
            Subcommand::List => {
                let limit = validate_limit(number_option(options, "limit"));
                let page = self.client.list_agents(Some(limit), None).await?;
                Ok(InteractionResponse::message(format_agent_list(&page.agents)))
            }
            Subcommand::Status => {
                let id = validate_agent_id(string_option(options, "agent_id"))?;
                let agent = self.client.get_agent(&id).await?;
                Ok(InteractionResponse::embeds(vec![format_agent_status(&agent)]))
            }
            Subcommand::Conversation => {
                let id = validate_agent_id(string_option(options, "agent_id"))?;
                let conversation = self.client.get_conversation(&id).await?;
                Ok(InteractionResponse::message(format_conversation(
                    &conversation.messages,
                )))
            }
            Subcommand::Followup => self.follow_up(options, interaction).await,
            Subcommand::Stop => {
                let id = validate_agent_id(string_option(options, "agent_id"))?;
                self.client.stop_agent(&id).await?;
                Ok(InteractionResponse::message(format_success(&format!(
                    "Agent `{id}` stopped."
                ))))
            }
            Subcommand::Delete => {
                let id = validate_agent_id(string_option(options, "agent_id"))?;
                self.client.delete_agent(&id).await?;
                Ok(InteractionResponse::message(format_success(&format!(
                    "Agent `{id}` permanently deleted."
                ))))
            }
            Subcommand::Models => {
                let models = self.client.list_models().await?;
                Ok(InteractionResponse::message(format_models(&models.models)))
            }
            Subcommand::Repos => {
                let repos = self.client.list_repositories().await?;
                Ok(InteractionResponse::message(format_repositories(
                    &repos.repositories,
                )))
            }
            Subcommand::ApiKey => {
                let info = self.client.get_api_key_info().await?;
                Ok(InteractionResponse::ephemeral(format_api_key_info(&info)))
            }
        }
    }

    async fn create(
        &self,
        options: &[CommandOption],
        interaction: &Interaction,
    ) -> Result<InteractionResponse, AppError> {
        let prompt = validate_prompt(string_option(options, "prompt"))?;
        let repository = validate_repository(string_option(options, "repository"))?;
        let model = string_option(options, "model").map(str::to_string);
        let git_ref = string_option(options, "ref").map(str::to_string);
        let branch_name = validate_branch_name(string_option(options, "branch_name"))?;
        let auto_create_pr = bool_option(options, "auto_create_pr");

        let referenced = extract_referenced_message(interaction);
        let full_prompt = build_prompt_with_context(&prompt, referenced.as_ref());

        let request = LaunchAgentRequest::new(full_prompt.into_owned(), repository)
            .with_ref(git_ref)
            .with_model(model)
            .with_target(LaunchTarget {
                branch_name,
                auto_create_pr,
                ..LaunchTarget::default()
            });

        let agent = self.launch(&request).await?;
        let note = if referenced.is_some() {
            REFERENCED_CONTEXT_NOTE
        } else {
            ""
        };
        Ok(InteractionResponse::message(format_success(
            &launched_message("Agent launched!", &agent, note),
        )))
    }

    async fn follow_up(
        &self,
        options: &[CommandOption],
        interaction: &Interaction,
    ) -> Result<InteractionResponse, AppError> {
        let id = validate_agent_id(string_option(options, "agent_id"))?;
        let prompt = validate_prompt(string_option(options, "prompt"))?;

        let referenced = extract_referenced_message(interaction);
        let full_prompt = build_prompt_with_context(&prompt, referenced.as_ref());

        self.client
            .follow_up(&id, &FollowUpRequest::new(full_prompt.into_owned()))
            .await?;

        let note = if referenced.is_some() {
            REFERENCED_CONTEXT_NOTE
        } else {
            ""
        };
        Ok(InteractionResponse::message(format_success(&format!(
            "Follow-up added to agent `{id}`\n\nThe agent will continue working on your instruction.{note}"
        ))))
    }

    async fn launch(&self, request: &LaunchAgentRequest) -> Result<Agent, AppError> {
        let launched = self.client.launch_agent(request).await?;
        tracing::info!("Launched agent {}", launched.id);
        self.client.get_agent(&launched.id).await
    }

    async fn route_modal(&self, interaction: &Interaction) -> RouteOutcome {
        let Some(data) = interaction
            .data
            .as_ref()
            .filter(|data| is_ask_agent_modal(data))
        else {
            return RouteOutcome::rejected("Unknown interaction type");
        };

        let reply = match self.launch_from_modal(&data.components).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Modal submission failed ({:?}): {}", e.kind(), e);
                InteractionResponse::message(format_error(&e))
            }
        };
        RouteOutcome::Reply(reply)
    }

    async fn launch_from_modal(&self, rows: &[ActionRow]) -> Result<InteractionResponse, AppError> {
        let message_context = submitted_value(rows, "message_context").unwrap_or_default();
        let prompt = validate_prompt(submitted_value(rows, "prompt"))?;
        let repository = validate_repository(submitted_value(rows, "repository"))?;

        let request =
            LaunchAgentRequest::new(build_modal_prompt(message_context, &prompt), repository);
        let agent = self.launch(&request).await?;

        Ok(InteractionResponse::message(format_success(
            &launched_message("Agent launched from message context!", &agent, MODAL_CONTEXT_NOTE),
        )))
    }
}

fn is_ask_agent_modal(data: &InteractionData) -> bool {
    data.custom_id
        .as_deref()
        .is_some_and(|id| id.starts_with(ASK_AGENT_MODAL_PREFIX))
}

fn launched_message(headline: &str, agent: &Agent, note: &str) -> String {
    let branch = agent
        .target
        .branch_name
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or("auto-generated");
    format!(
        "{headline}\n\n**ID:** `{}`\n**Branch:** {branch}\n**URL:** {}{note}",
        agent.id, agent.target.url
    )
}

/// Form shown for the message context-menu command. Never calls the API.
fn ask_agent_form(interaction: &Interaction) -> InteractionResponse {
    let Some(target) = extract_target_message(interaction) else {
        let err = AppError::new(ErrorKind::NotFound, "Could not retrieve the target message");
        return InteractionResponse::ephemeral(format_error(&err));
    };

    InteractionResponse::modal(ModalData {
        custom_id: format!("{ASK_AGENT_MODAL_PREFIX}{}", target.id),
        title: "Ask Agent About Message".to_string(),
        components: vec![
            ActionRow::single(TextInput {
                custom_id: "message_context".to_string(),
                label: Some("Message Context (for reference)".to_string()),
                style: Some(TEXT_INPUT_PARAGRAPH),
                value: Some(modal_excerpt(&target.content)),
                required: Some(true),
                max_length: Some(1000),
                ..text_input()
            }),
            ActionRow::single(TextInput {
                custom_id: "prompt".to_string(),
                label: Some("Your Task/Instruction".to_string()),
                style: Some(TEXT_INPUT_PARAGRAPH),
                placeholder: Some("e.g., Fix this bug, Implement this feature...".to_string()),
                required: Some(true),
                min_length: Some(10),
                max_length: Some(2000),
                ..text_input()
            }),
            ActionRow::single(TextInput {
                custom_id: "repository".to_string(),
                label: Some("GitHub Repository URL".to_string()),
                style: Some(TEXT_INPUT_SHORT),
                placeholder: Some("https://github.com/owner/repo".to_string()),
                required: Some(true),
                ..text_input()
            }),
        ],
    })
}

fn text_input() -> TextInput {
    TextInput {
        kind: TEXT_INPUT,
        ..TextInput::default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use agentcord_agent::{ApiRequest, ApiResponse, Transport, TransportError};
    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Canned remote API keyed by method and path. Unrouted calls get a 404.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        routes: Vec<(Method, String, u16, Value)>,
        pub(crate) requests: Mutex<Vec<ApiRequest>>,
    }

    impl FakeApi {
        pub(crate) fn route(mut self, method: Method, path: &str, status: u16, body: Value) -> Self {
            self.routes.push((method, path.to_string(), status, body));
            self
        }

        pub(crate) fn recorded(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeApi {
        async fn send(
            &self,
            request: ApiRequest,
            _bearer: &str,
        ) -> Result<ApiResponse, TransportError> {
            let matched = self
                .routes
                .iter()
                .find(|(method, path, _, _)| *method == request.method && path == request.url.path())
                .map(|(_, _, status, body)| (*status, body.clone()));
            self.requests.lock().unwrap().push(request);

            let (status, body) =
                matched.unwrap_or((404, json!({ "message": "no such route" })));
            Ok(ApiResponse {
                status,
                body: body.to_string().into_bytes(),
            })
        }
    }

    pub(crate) fn agent_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Fix the bug",
            "status": "RUNNING",
            "source": { "repository": "https://github.com/owner/repo" },
            "target": {
                "branchName": "cursor/fix-the-bug",
                "url": format!("https://cursor.com/agents?id={id}")
            },
            "createdAt": "2024-01-15T10:30:00Z"
        })
    }
}
