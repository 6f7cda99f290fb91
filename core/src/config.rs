use std::env;

use aws_credential_types::Credentials;
use tracing::{info, warn};

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_QUALIFIER: &str = "DEFAULT";

/// Static configuration, read once at startup and handed to every component
/// that needs it. Nothing reads the environment after this is built.
#[derive(Debug, Clone)]
pub struct Settings {
    // Feature flags: each gates whether a tool delegates or falls back.
    pub use_bedrock: bool,
    pub use_knowledge_base: bool,
    pub use_comprehend: bool,
    pub use_translate: bool,

    pub knowledge_base_id: String,
    pub bedrock_model_id: String,
    pub region: String,

    pub agent_runtime_arn: String,
    pub agent_runtime_qualifier: String,

    pub chat_bind_addr: String,
    pub tools_bind_addr: String,

    // Endpoint overrides; `None` means the regional public host.
    pub knowledge_base_endpoint: Option<String>,
    pub comprehend_endpoint: Option<String>,
    pub translate_endpoint: Option<String>,
    pub agent_runtime_endpoint: Option<String>,

    /// Bearer credential for the Bedrock hosts. Never logged.
    pub bedrock_bearer_token: Option<String>,

    /// Static keys used to SigV4-sign every AWS request that has no bearer
    /// token. `Credentials` redacts the secret in `Debug`.
    pub aws_credentials: Option<Credentials>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_bedrock: true,
            use_knowledge_base: true,
            use_comprehend: true,
            use_translate: false,
            knowledge_base_id: String::new(),
            bedrock_model_id: DEFAULT_MODEL_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            agent_runtime_arn: String::new(),
            agent_runtime_qualifier: DEFAULT_QUALIFIER.to_string(),
            chat_bind_addr: "0.0.0.0:3000".to_string(),
            tools_bind_addr: "0.0.0.0:3001".to_string(),
            knowledge_base_endpoint: None,
            comprehend_endpoint: None,
            translate_endpoint: None,
            agent_runtime_endpoint: None,
            bedrock_bearer_token: None,
            aws_credentials: None,
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and reads every variable once.
    ///
    /// | Variable                  | Default                                       |
    /// |---------------------------|-----------------------------------------------|
    /// | `USE_BEDROCK`             | `true`                                        |
    /// | `USE_KNOWLEDGE_BASE`      | `true`                                        |
    /// | `USE_COMPREHEND`          | `true`                                        |
    /// | `USE_TRANSLATE`           | `false`                                       |
    /// | `KNOWLEDGE_BASE_ID`       | empty                                         |
    /// | `BEDROCK_MODEL_ID`        | `anthropic.claude-3-5-sonnet-20241022-v2:0`   |
    /// | `AWS_REGION`              | `us-east-1`                                   |
    /// | `AGENT_RUNTIME_ARN`       | empty                                         |
    /// | `AGENT_RUNTIME_QUALIFIER` | `DEFAULT`                                     |
    /// | `CHAT_BIND_ADDR`          | `0.0.0.0:3000`                                |
    /// | `TOOLS_BIND_ADDR`         | `0.0.0.0:3001`                                |
    /// | `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN` | unset |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            use_bedrock: flag("USE_BEDROCK", defaults.use_bedrock),
            use_knowledge_base: flag("USE_KNOWLEDGE_BASE", defaults.use_knowledge_base),
            use_comprehend: flag("USE_COMPREHEND", defaults.use_comprehend),
            use_translate: flag("USE_TRANSLATE", defaults.use_translate),
            knowledge_base_id: var_or("KNOWLEDGE_BASE_ID", defaults.knowledge_base_id),
            bedrock_model_id: var_or("BEDROCK_MODEL_ID", defaults.bedrock_model_id),
            region: var_or("AWS_REGION", defaults.region),
            agent_runtime_arn: var_or("AGENT_RUNTIME_ARN", defaults.agent_runtime_arn),
            agent_runtime_qualifier: var_or(
                "AGENT_RUNTIME_QUALIFIER",
                defaults.agent_runtime_qualifier,
            ),
            chat_bind_addr: var_or("CHAT_BIND_ADDR", defaults.chat_bind_addr),
            tools_bind_addr: var_or("TOOLS_BIND_ADDR", defaults.tools_bind_addr),
            knowledge_base_endpoint: optional_var("KNOWLEDGE_BASE_ENDPOINT"),
            comprehend_endpoint: optional_var("COMPREHEND_ENDPOINT"),
            translate_endpoint: optional_var("TRANSLATE_ENDPOINT"),
            agent_runtime_endpoint: optional_var("AGENT_RUNTIME_ENDPOINT"),
            bedrock_bearer_token: optional_var("AWS_BEARER_TOKEN_BEDROCK"),
            aws_credentials: aws_credentials_from_env(),
        }
    }

    /// Policy lookups need both the knowledge base and Bedrock itself.
    pub fn knowledge_base_enabled(&self) -> bool {
        self.use_knowledge_base && self.use_bedrock
    }

    pub fn model_arn(&self) -> String {
        format!(
            "arn:aws:bedrock:{}::foundation-model/{}",
            self.region, self.bedrock_model_id
        )
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  USE_BEDROCK: {}", self.use_bedrock);
        info!("  USE_KNOWLEDGE_BASE: {}", self.use_knowledge_base);
        info!("  KNOWLEDGE_BASE_ID: {}", self.knowledge_base_id);
        info!("  USE_COMPREHEND: {}", self.use_comprehend);
        info!("  USE_TRANSLATE: {}", self.use_translate);
        info!("  AWS_REGION: {}", self.region);
        info!("  AGENT_RUNTIME_ARN: {}", self.agent_runtime_arn);
        info!(
            "  AWS credentials: {}",
            if self.aws_credentials.is_some() { "environment" } else { "none" }
        );
        if self.agent_runtime_arn.is_empty() {
            warn!("AGENT_RUNTIME_ARN is empty; chat requests will fail until it is set");
        }
    }
}

/// Static keys from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`, plus the
/// optional `AWS_SESSION_TOKEN`. Both keys must be set.
pub fn aws_credentials_from_env() -> Option<Credentials> {
    let access_key_id = optional_var("AWS_ACCESS_KEY_ID")?;
    let secret_access_key = optional_var("AWS_SECRET_ACCESS_KEY")?;
    Some(Credentials::new(
        access_key_id,
        secret_access_key,
        optional_var("AWS_SESSION_TOKEN"),
        None,
        "environment",
    ))
}

/// Parses a boolean flag, keeping the default for unrecognised values.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!("Ignoring unrecognised value '{}' for {}; using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
