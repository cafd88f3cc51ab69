//! TOML app configuration: one stack and the constructs it contains.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error while loading or parsing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub stack: StackConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub trail: Vec<TrailConfig>,
    #[serde(default)]
    pub event_bus: Vec<EventBusConfig>,
    #[serde(default)]
    pub connection: Vec<ConnectionConfig>,
    #[serde(default)]
    pub api_destination: Vec<ApiDestinationConfig>,
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
    #[serde(default)]
    pub lifecycle_policy: Vec<LifecyclePolicyConfig>,
}

impl AppConfig {
    /// Loads an app file from TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    pub name: String,
    pub description: Option<String>,
}

/// Where and how templates are written. Missing fields take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for templates and the manifest.
    pub dir: String,
    pub format: FormatConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "cfn.out".to_string(),
            format: FormatConfig::Json(FormatOptions {
                pretty: Some(true),
                compression: None,
            }),
        }
    }
}

/// Output format selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatConfig {
    Json(FormatOptions),
    Yaml(FormatOptions),
}

impl FormatConfig {
    pub fn options(&self) -> &FormatOptions {
        match self {
            FormatConfig::Json(options) | FormatConfig::Yaml(options) => options,
        }
    }
}

/// Per-format options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Indented output (JSON only; YAML is always block style).
    pub pretty: Option<bool>,
    /// `gzip` or unset.
    pub compression: Option<String>,
}

/// A CloudTrail trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Construct id within the stack.
    pub id: String,
    pub trail_name: Option<String>,
    /// Existing bucket; a bucket and policy are created when unset.
    pub bucket_name: Option<String>,
    pub s3_key_prefix: Option<String>,
    pub enable_file_validation: Option<bool>,
    pub include_global_service_events: Option<bool>,
    pub is_multi_region_trail: Option<bool>,
    pub is_organization_trail: Option<bool>,
    /// `ReadOnly`, `WriteOnly`, `All` or `None`.
    pub management_events: Option<String>,
    pub send_to_cloud_watch_logs: Option<bool>,
    /// Retention of the created log group, e.g. `one_month`.
    pub cloud_watch_logs_retention: Option<String>,
    pub log_group_arn: Option<String>,
    pub sns_topic_name: Option<String>,
    pub kms_key_arn: Option<String>,
    #[serde(default)]
    pub insight_types: Vec<String>,
    #[serde(default)]
    pub s3_selector: Vec<S3SelectorConfig>,
    #[serde(default)]
    pub lambda_selector: Vec<LambdaSelectorConfig>,
    #[serde(default)]
    pub log_all_s3_data_events: bool,
    #[serde(default)]
    pub log_all_lambda_data_events: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorOptions {
    pub read_write_type: Option<String>,
    pub include_management_events: Option<bool>,
    #[serde(default)]
    pub exclude_management_event_sources: Vec<String>,
}

/// S3 data events for objects under a bucket prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3SelectorConfig {
    pub bucket_name: String,
    pub object_prefix: Option<String>,
    #[serde(flatten)]
    pub options: SelectorOptions,
}

/// Lambda data events for a set of functions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LambdaSelectorConfig {
    pub function_arns: Vec<String>,
    #[serde(flatten)]
    pub options: SelectorOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBusConfig {
    pub id: String,
    pub event_bus_name: Option<String>,
    pub event_source_name: Option<String>,
    #[serde(default)]
    pub archive: Vec<ArchiveConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub id: String,
    pub archive_name: Option<String>,
    pub description: Option<String>,
    pub retention_days: Option<u32>,
    /// Event pattern in EventBridge (kebab-case) shape.
    pub event_pattern: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    pub rule_name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    /// Id of an `[[event_bus]]` entry; the default bus when unset.
    pub event_bus: Option<String>,
    pub schedule: Option<ScheduleConfig>,
    /// Event pattern in EventBridge (kebab-case) shape.
    pub event_pattern: Option<Value>,
    #[serde(default)]
    pub target: Vec<TargetConfig>,
}

/// Rule schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleConfig {
    Rate { minutes: u64 },
    Cron(CronConfig),
    Expression { expression: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronConfig {
    pub minute: Option<String>,
    pub hour: Option<String>,
    pub day: Option<String>,
    pub month: Option<String>,
    pub week_day: Option<String>,
    pub year: Option<String>,
}

/// Rule target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    /// Any target addressed by ARN.
    Arn {
        arn: String,
        role_arn: Option<String>,
        input: Option<InputConfig>,
    },
    /// Id of an `[[api_destination]]` entry.
    ApiDestination {
        api_destination: String,
        input: Option<InputConfig>,
        #[serde(default)]
        header_parameters: BTreeMap<String, String>,
        #[serde(default)]
        query_string_parameters: BTreeMap<String, String>,
    },
}

/// Input passed to a rule target instead of the matched event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputConfig {
    Text { text: String },
    Object { value: Value },
    EventPath { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub id: String,
    pub connection_name: Option<String>,
    pub description: Option<String>,
    pub authorization: AuthorizationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationConfig {
    ApiKey {
        name: String,
        value: SecretConfig,
    },
    Basic {
        username: String,
        password: SecretConfig,
    },
    #[serde(rename = "oauth")]
    OAuth {
        authorization_endpoint: String,
        http_method: String,
        client_id: String,
        client_secret: SecretConfig,
    },
}

/// A secret value, inline or resolved from Secrets Manager at deploy time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretConfig {
    PlainText {
        value: String,
    },
    SecretsManager {
        secret_id: String,
        json_field: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDestinationConfig {
    pub id: String,
    /// Id of a `[[connection]]` entry.
    pub connection: String,
    pub endpoint: String,
    pub http_method: Option<String>,
    pub rate_limit_per_second: Option<u32>,
    pub api_destination_name: Option<String>,
    pub description: Option<String>,
}

/// A DLM lifecycle policy, given in CloudFormation property shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecyclePolicyConfig {
    pub id: String,
    pub properties: Value,
}
