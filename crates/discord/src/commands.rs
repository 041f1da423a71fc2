use serde::Serialize;

pub const CHAT_INPUT: u8 = 1;
pub const MESSAGE_COMMAND: u8 = 3;

pub const OPTION_SUB_COMMAND: u8 = 1;
pub const OPTION_STRING: u8 = 3;
pub const OPTION_INTEGER: u8 = 4;
pub const OPTION_BOOLEAN: u8 = 5;

/// Manage Server (1 << 3), as the platform expects it: a decimal string.
pub const MANAGE_SERVER_PERMISSION: &str = "8";

pub const AGENT_COMMAND: &str = "agent";
pub const ASK_AGENT_COMMAND: &str = "Ask Agent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOptionSchema {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionSchema>,
}

impl CommandOptionSchema {
    fn new(kind: u8, name: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            options: Vec::new(),
        }
    }

    fn subcommand(name: &str, description: &str, options: Vec<CommandOptionSchema>) -> Self {
        Self {
            options,
            ..Self::new(OPTION_SUB_COMMAND, name, description)
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionSchema>,
    pub default_member_permissions: Option<String>,
}

fn agent_id_option() -> CommandOptionSchema {
    CommandOptionSchema::new(OPTION_STRING, "agent_id", "Agent ID (e.g., bc_abc123)").required()
}

pub fn agent_command() -> CommandSchema {
    use CommandOptionSchema as Opt;

    let create = Opt::subcommand(
        "create",
        "Launch a new Cursor Cloud Agent",
        vec![
            Opt::new(OPTION_STRING, "prompt", "The task or prompt for the agent").required(),
            Opt::new(OPTION_STRING, "repository", "GitHub repository URL").required(),
            Opt::new(
                OPTION_STRING,
                "model",
                "AI model to use (optional, defaults to auto)",
            ),
            Opt::new(
                OPTION_STRING,
                "ref",
                "Git branch or ref (optional, defaults to main)",
            ),
            Opt::new(
                OPTION_STRING,
                "branch_name",
                "Target branch name for changes (optional)",
            ),
            Opt::new(
                OPTION_BOOLEAN,
                "auto_create_pr",
                "Automatically create a PR when finished (default: false)",
            ),
        ],
    );

    let list = Opt::subcommand(
        "list",
        "List all your Cursor Cloud Agents",
        vec![Opt::new(
            OPTION_INTEGER,
            "limit",
            "Number of agents to return (max 100)",
        )],
    );

    let followup = Opt::subcommand(
        "followup",
        "Add a follow-up instruction to an agent",
        vec![
            agent_id_option(),
            Opt::new(OPTION_STRING, "prompt", "Follow-up instruction").required(),
        ],
    );

    CommandSchema {
        name: AGENT_COMMAND.to_string(),
        description: "Manage Cursor Cloud Agents".to_string(),
        kind: CHAT_INPUT,
        options: vec![
            create,
            list,
            Opt::subcommand(
                "status",
                "Get the status of a specific agent",
                vec![agent_id_option()],
            ),
            Opt::subcommand(
                "conversation",
                "View the conversation history of an agent",
                vec![agent_id_option()],
            ),
            followup,
            Opt::subcommand("stop", "Stop a running agent", vec![agent_id_option()]),
            Opt::subcommand(
                "delete",
                "Permanently delete an agent",
                vec![agent_id_option()],
            ),
            Opt::subcommand("models", "List available AI models for agents", Vec::new()),
            Opt::subcommand(
                "repos",
                "List accessible GitHub repositories (rate limited)",
                Vec::new(),
            ),
            Opt::subcommand(
                "apikey",
                "Show information about your Cursor API key",
                Vec::new(),
            ),
        ],
        default_member_permissions: Some(MANAGE_SERVER_PERMISSION.to_string()),
    }
}

/// Message context-menu entry. The platform requires an empty description.
pub fn ask_agent_command() -> CommandSchema {
    CommandSchema {
        name: ASK_AGENT_COMMAND.to_string(),
        description: String::new(),
        kind: MESSAGE_COMMAND,
        options: Vec::new(),
        default_member_permissions: Some(MANAGE_SERVER_PERMISSION.to_string()),
    }
}

pub fn all_commands() -> Vec<CommandSchema> {
    vec![agent_command(), ask_agent_command()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_command_has_ten_subcommands() {
        let names: Vec<_> = agent_command()
            .options
            .iter()
            .map(|o| o.name.clone())
            .collect();
        assert_eq!(
            names,
            [
                "create",
                "list",
                "status",
                "conversation",
                "followup",
                "stop",
                "delete",
                "models",
                "repos",
                "apikey"
            ]
        );
        assert!(agent_command()
            .options
            .iter()
            .all(|o| o.kind == OPTION_SUB_COMMAND));
    }

    #[test]
    fn create_requires_prompt_and_repository_only() {
        let command = agent_command();
        let create = &command.options[0];
        let required: Vec<_> = create
            .options
            .iter()
            .filter(|o| o.required)
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(required, ["prompt", "repository"]);

        let auto_pr = create
            .options
            .iter()
            .find(|o| o.name == "auto_create_pr")
            .unwrap();
        assert_eq!(auto_pr.kind, OPTION_BOOLEAN);
    }

    #[test]
    fn serializes_to_platform_json() {
        let value = serde_json::to_value(ask_agent_command()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Ask Agent",
                "description": "",
                "type": 3,
                "default_member_permissions": "8"
            })
        );

        let value = serde_json::to_value(agent_command()).unwrap();
        let list = &value["options"][1];
        assert_eq!(list["name"], "list");
        assert_eq!(list["options"][0]["type"], 4);
        assert!(list["options"][0].get("required").is_none());

        let models = &value["options"][7];
        assert!(models.get("options").is_none());
    }

    #[test]
    fn all_commands_lists_both_entries() {
        let names: Vec<_> = all_commands().into_iter().map(|c| c.name).collect();
        assert_eq!(names, [AGENT_COMMAND, ASK_AGENT_COMMAND]);
    }
}
