use agentcord_agent::RetryPolicy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub cursor: CursorConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub public_key: String,
    pub application_id: String,
    pub bot_token: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub api_token: String,
    pub api_base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            application_id: String::new(),
            bot_token: String::new(),
            api_base_url: DEFAULT_DISCORD_API_BASE_URL.to_string(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_base_url: agentcord_agent::DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

impl Config {
    /// Defaults, then the TOML file, then `.env`, then the process environment.
    /// Fails when any runtime credential is blank.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`Config::load`], but only the command-registration
    /// credentials are required.
    pub fn load_for_registration() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate_registration()?;
        Ok(config)
    }

    fn load_unvalidated() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::debug!("Ignoring unreadable .env file: {e}");
            }
        }

        let mut config = match resolve_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(read_env)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DISCORD_PUBLIC_KEY") {
            self.discord.public_key = value;
        }
        if let Some(value) = lookup("DISCORD_APPLICATION_ID") {
            self.discord.application_id = value;
        }
        if let Some(value) = lookup("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = value;
        }
        if let Some(value) = lookup("CURSOR_API_TOKEN") {
            self.cursor.api_token = value;
        }
        if let Some(value) = lookup("CURSOR_API_BASE_URL") {
            self.cursor.api_base_url = value;
        }
        if let Some(value) = lookup("AGENTCORD_BIND") {
            self.server.bind = value;
        }
        if let Some(value) = lookup("AGENTCORD_PORT") {
            self.server.port = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "AGENTCORD_PORT".to_string(),
                    value,
                })?;
        }
        if let Some(value) = lookup("AGENTCORD_LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("DISCORD_PUBLIC_KEY", &self.discord.public_key),
            ("DISCORD_APPLICATION_ID", &self.discord.application_id),
            ("DISCORD_BOT_TOKEN", &self.discord.bot_token),
            ("CURSOR_API_TOKEN", &self.cursor.api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    pub fn validate_registration(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("DISCORD_APPLICATION_ID", &self.discord.application_id),
            ("DISCORD_BOT_TOKEN", &self.discord.bot_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.cursor.max_retries,
            base_delay: Duration::from_millis(self.cursor.base_delay_ms),
            max_delay: Duration::from_millis(self.cursor.max_delay_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = read_env("AGENTCORD_CONFIG") {
        return Some(PathBuf::from(path));
    }

    ProjectDirs::from("com", "agentcord", "agentcord")
        .map(|dirs| dirs.config_dir().join("agentcord.toml"))
        .into_iter()
        .chain(std::iter::once(PathBuf::from("config/agentcord.toml")))
        .find(|path| path.exists())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_PUBLIC_KEY", "ab"),
            ("DISCORD_APPLICATION_ID", "123"),
            ("DISCORD_BOT_TOKEN", "bot"),
            ("CURSOR_API_TOKEN", "key_abc"),
        ]
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.cursor.api_base_url, "https://api.cursor.com");
        assert_eq!(config.discord.api_base_url, "https://discord.com/api/v10");
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);

        let retry = config.retry_policy();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(1000));
        assert_eq!(retry.max_delay, Duration::from_millis(30_000));
    }

    #[test]
    fn missing_credentials_are_reported_together() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[("DISCORD_APPLICATION_ID", "123")]))
            .unwrap();

        match config.validate() {
            Err(ConfigError::Missing(names)) => assert_eq!(
                names,
                ["DISCORD_PUBLIC_KEY", "DISCORD_BOT_TOKEN", "CURSOR_API_TOKEN"]
            ),
            other => panic!("expected missing error, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut config = Config::default();
        config.apply_env(lookup(&complete_env())).unwrap();
        config.cursor.api_token = "   ".to_string();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required configuration: CURSOR_API_TOKEN"
        );
    }

    #[test]
    fn registration_needs_only_bot_credentials() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("DISCORD_APPLICATION_ID", "123"),
                ("DISCORD_BOT_TOKEN", "bot"),
            ]))
            .unwrap();

        assert!(config.validate_registration().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config: Config = toml::from_str(
            r#"
[cursor]
api_base_url = "https://file.example.test"
max_retries = 5

[server]
port = 8080

[logging]
format = "json"
"#,
        )
        .unwrap();

        let mut env = complete_env();
        env.push(("CURSOR_API_BASE_URL", "https://env.example.test"));
        env.push(("AGENTCORD_PORT", "9000"));
        config.apply_env(lookup(&env)).unwrap();

        assert_eq!(config.cursor.api_base_url, "https://env.example.test");
        assert_eq!(config.cursor.max_retries, 5);
        assert_eq!(config.cursor.request_timeout_secs, 30);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("AGENTCORD_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvOverride { ref key, .. } if key == "AGENTCORD_PORT"
        ));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = Config::from_file(Path::new("/nonexistent/agentcord.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
