use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use crate::core::mcp::{ServerSpec, Transport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub llm: LLMConfig,
    pub agent: AgentConfig,
    pub research: ResearchConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Temperature used by the research assistant's calculator path.
    pub research_temperature: f32,
    pub base_url: String,
    pub max_retries: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            research_temperature: 0.1,
            base_url: "https://api.openai.com/v1".to_string(),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub tool_timeout_secs: u64,
    pub tool_max_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            tool_timeout_secs: 30,
            tool_max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    pub max_results: usize,
    pub snippet_chars: usize,
    pub search_endpoint: String,
    pub fallback_topic: String,
    pub request_timeout_secs: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_results: 2,
            snippet_chars: 100,
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            fallback_topic: "langgraph".to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Tool servers by name. A config source that declares any server replaces
/// the built-in calculator and weather entries as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerSpec>,
}

impl Default for McpConfig {
    fn default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(
            "calculator".to_string(),
            ServerSpec {
                command: "python".to_string(),
                args: vec!["./mcp_servers/calc_server.py".to_string()],
                transport: Transport::Stdio,
            },
        );
        servers.insert(
            "weather".to_string(),
            ServerSpec {
                command: "python".to_string(),
                args: vec!["./mcp_servers/weather_server.py".to_string()],
                transport: Transport::Stdio,
            },
        );
        Self { servers }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Layers built-in defaults, `{dir}/{name}.toml` (optional) and `APP__*`
    /// environment overrides. `name` falls back to `CONFIG_ENV`, then `default`.
    pub fn load(dir: impl AsRef<Path>, name: Option<&str>) -> Result<Self, ConfigError> {
        let config_env = name
            .map(str::to_string)
            .or_else(|| env::var("CONFIG_ENV").ok())
            .unwrap_or_else(|| "default".to_string());
        let file = dir.as_ref().join(config_env);

        // Maps merge key by key across sources, so the server defaults are
        // applied after loading rather than seeded into the base layer.
        let mut base = Settings::default();
        base.mcp.servers.clear();

        let config = Config::builder()
            .add_source(Config::try_from(&base)?)
            .add_source(File::with_name(&file.to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        if settings.mcp.servers.is_empty() {
            settings.mcp = McpConfig::default();
        }
        Ok(settings)
    }

    pub fn api_key() -> Result<String> {
        env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))
    }
}
