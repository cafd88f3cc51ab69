//! Builds a [`Stack`] from an [`AppConfig`] and writes its template.

use cfnsynth_cloudtrail::{
    AddEventSelectorOptions, InsightType, ManagementEventSources, ReadWriteType, S3EventSelector,
    Trail, TrailError, TrailProps,
};
use cfnsynth_core::aws::kms::KeyRef;
use cfnsynth_core::aws::lambda::FunctionRef;
use cfnsynth_core::aws::logs::{LogGroupRef, RetentionDays};
use cfnsynth_core::aws::s3::BucketRef;
use cfnsynth_core::aws::sns::TopicRef;
use cfnsynth_core::config::{
    ApiDestinationConfig, AppConfig, AuthorizationConfig, ConnectionConfig, EventBusConfig,
    FormatConfig, InputConfig, LifecyclePolicyConfig, OutputConfig, RuleConfig, ScheduleConfig,
    SecretConfig, SelectorOptions, TargetConfig, TrailConfig,
};
use cfnsynth_core::{CfnString, Output, Stack, SynthError, TemplateWriter};
use cfnsynth_dlm::{CfnLifecyclePolicy, CfnLifecyclePolicyProps};
use cfnsynth_events::{
    ApiDestination, ApiDestinationProps, ApiDestinationTarget, ArnTarget, Authorization,
    BaseArchiveProps, Connection, ConnectionProps, ConnectionRef, CronOptions, EventBus,
    EventBusError, EventBusProps, EventBusRef, EventPattern, HttpMethod, OAuthAuthorization,
    PatternError, Rule, RuleError, RuleProps, RuleTarget, RuleTargetInput, Schedule,
    ScheduleError, SecretValue,
};
use cfnsynth_formats_json::JsonTemplateWriter;
use cfnsynth_formats_yaml::YamlTemplateWriter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Error while turning an app config into a stack.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("[{id}] {message}")]
    Invalid { id: String, message: String },
    #[error("[{id}] unknown {kind} '{reference}'")]
    UnknownReference {
        id: String,
        kind: &'static str,
        reference: String,
    },
    #[error("[{id}] invalid lifecycle policy properties: {source}")]
    LifecycleProperties {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Synth(#[from] SynthError),
    #[error(transparent)]
    Trail(#[from] TrailError),
    #[error(transparent)]
    EventBus(#[from] EventBusError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl AppError {
    fn invalid(id: &str, message: impl Into<String>) -> Self {
        AppError::Invalid {
            id: id.to_string(),
            message: message.into(),
        }
    }
}

/// Constructs defined so far, by config id, for cross references.
#[derive(Default)]
struct Registry {
    event_buses: BTreeMap<String, EventBusRef>,
    connections: BTreeMap<String, ConnectionRef>,
    api_destinations: BTreeMap<String, CfnString>,
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, T>,
    id: &str,
    kind: &'static str,
    reference: &str,
) -> Result<&'a T, AppError> {
    map.get(reference).ok_or_else(|| AppError::UnknownReference {
        id: id.to_string(),
        kind,
        reference: reference.to_string(),
    })
}

/// Creates every construct the config describes. Buses, connections and API
/// destinations come first so rules can refer to them by id.
pub fn build_stack(config: &AppConfig) -> Result<Stack, AppError> {
    let mut stack = Stack::new(config.stack.name.as_str());
    if let Some(description) = &config.stack.description {
        stack = stack.with_description(description.as_str());
    }
    let mut registry = Registry::default();

    for bus in &config.event_bus {
        add_event_bus(&mut stack, &mut registry, bus)?;
    }
    for connection in &config.connection {
        add_connection(&mut stack, &mut registry, connection)?;
    }
    for destination in &config.api_destination {
        add_api_destination(&mut stack, &mut registry, destination)?;
    }
    for trail in &config.trail {
        add_trail(&mut stack, trail)?;
    }
    for rule in &config.rule {
        add_rule(&mut stack, &registry, rule)?;
    }
    for policy in &config.lifecycle_policy {
        add_lifecycle_policy(&mut stack, policy)?;
    }

    info!(
        stack = %stack.name(),
        constructs = stack.construct_count(),
        "built stack from config"
    );
    Ok(stack)
}

/// Opens the writer selected by `[output]`.
pub fn open_writer(output: &OutputConfig) -> io::Result<Box<dyn TemplateWriter>> {
    let options = output.format.options();
    let gzip = match options.compression.as_deref() {
        None | Some("none") => false,
        Some("gzip") => true,
        Some(other) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported compression '{other}'"),
            ))
        }
    };
    let writer: Box<dyn TemplateWriter> = match &output.format {
        FormatConfig::Json(_) => Box::new(JsonTemplateWriter::new(
            &output.dir,
            options.pretty.unwrap_or(true),
            gzip,
        )?),
        FormatConfig::Yaml(_) => Box::new(YamlTemplateWriter::new(&output.dir, gzip)?),
    };
    Ok(writer)
}

/// File name the writer for `output` gives the template of `stack_name`.
pub fn template_file_name(output: &OutputConfig, stack_name: &str) -> String {
    let extension = match output.format {
        FormatConfig::Json(_) => "json",
        FormatConfig::Yaml(_) => "yaml",
    };
    let suffix = match output.format.options().compression.as_deref() {
        Some("gzip") => ".gz",
        _ => "",
    };
    format!("{stack_name}.template.{extension}{suffix}")
}

fn parse<T>(id: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|message: String| AppError::invalid(id, message))
}

fn add_event_bus(
    stack: &mut Stack,
    registry: &mut Registry,
    config: &EventBusConfig,
) -> Result<(), AppError> {
    let bus = EventBus::new(
        stack,
        &config.id,
        EventBusProps {
            event_bus_name: config.event_bus_name.clone(),
            event_source_name: config.event_source_name.clone(),
        },
    )?;
    for archive in &config.archive {
        let archive = bus.archive(
            stack,
            &format!("{}/{}", config.id, archive.id),
            BaseArchiveProps {
                event_pattern: EventPattern::from_value(archive.event_pattern.clone())?,
                archive_name: archive.archive_name.clone(),
                description: archive.description.clone(),
                retention_days: archive.retention_days,
            },
        )?;
        stack.add(archive);
    }
    stack.add_output(format!("{}Arn", config.id), Output::new(bus.event_bus_arn()))?;
    registry
        .event_buses
        .insert(config.id.clone(), bus.event_bus_ref());
    stack.add(bus);
    Ok(())
}

fn secret(config: &SecretConfig) -> SecretValue {
    match config {
        SecretConfig::PlainText { value } => SecretValue::unsafe_plain_text(value.as_str()),
        SecretConfig::SecretsManager {
            secret_id,
            json_field,
        } => SecretValue::secrets_manager(secret_id, json_field.as_deref()),
    }
}

fn add_connection(
    stack: &mut Stack,
    registry: &mut Registry,
    config: &ConnectionConfig,
) -> Result<(), AppError> {
    let authorization = match &config.authorization {
        AuthorizationConfig::ApiKey { name, value } => {
            Authorization::api_key(name.as_str(), secret(value))
        }
        AuthorizationConfig::Basic { username, password } => {
            Authorization::basic(username.as_str(), secret(password))
        }
        AuthorizationConfig::OAuth {
            authorization_endpoint,
            http_method,
            client_id,
            client_secret,
        } => Authorization::oauth(OAuthAuthorization {
            authorization_endpoint: authorization_endpoint.clone(),
            http_method: parse::<HttpMethod>(&config.id, http_method)?,
            client_id: client_id.clone(),
            client_secret: secret(client_secret),
            header_parameters: BTreeMap::new(),
            query_string_parameters: BTreeMap::new(),
            body_parameters: BTreeMap::new(),
        }),
    };
    let connection = Connection::new(
        stack,
        &config.id,
        ConnectionProps {
            connection_name: config.connection_name.clone(),
            description: config.description.clone(),
            ..ConnectionProps::new(authorization)
        },
    )?;
    registry
        .connections
        .insert(config.id.clone(), connection.connection_ref());
    stack.add(connection);
    Ok(())
}

fn add_api_destination(
    stack: &mut Stack,
    registry: &mut Registry,
    config: &ApiDestinationConfig,
) -> Result<(), AppError> {
    let connection = lookup(
        &registry.connections,
        &config.id,
        "connection",
        &config.connection,
    )?
    .clone();
    let http_method = config
        .http_method
        .as_deref()
        .map(|method| parse::<HttpMethod>(&config.id, method))
        .transpose()?;
    let destination = ApiDestination::new(
        stack,
        &config.id,
        ApiDestinationProps {
            http_method,
            rate_limit_per_second: config.rate_limit_per_second,
            api_destination_name: config.api_destination_name.clone(),
            description: config.description.clone(),
            ..ApiDestinationProps::new(connection, config.endpoint.as_str())
        },
    )?;
    registry
        .api_destinations
        .insert(config.id.clone(), destination.api_destination_arn());
    stack.add(destination);
    Ok(())
}

fn selector_options(
    id: &str,
    options: &SelectorOptions,
) -> Result<AddEventSelectorOptions, AppError> {
    Ok(AddEventSelectorOptions {
        exclude_management_event_sources: options
            .exclude_management_event_sources
            .iter()
            .map(|source| parse::<ManagementEventSources>(id, source))
            .collect::<Result<_, _>>()?,
        include_management_events: options.include_management_events,
        read_write_type: options
            .read_write_type
            .as_deref()
            .map(|value| parse::<ReadWriteType>(id, value))
            .transpose()?,
    })
}

/// Retention names use the snake_case spelling, e.g. `one_month`.
fn retention(id: &str, value: &str) -> Result<RetentionDays, AppError> {
    serde_json::from_value(Value::String(value.to_string()))
        .map_err(|_| AppError::invalid(id, format!("unknown log retention '{value}'")))
}

fn add_trail(stack: &mut Stack, config: &TrailConfig) -> Result<(), AppError> {
    let id = config.id.as_str();
    let props = TrailProps {
        bucket: config
            .bucket_name
            .as_deref()
            .map(BucketRef::from_bucket_name),
        cloud_watch_log_group: config
            .log_group_arn
            .as_deref()
            .map(LogGroupRef::from_log_group_arn),
        cloud_watch_logs_retention: config
            .cloud_watch_logs_retention
            .as_deref()
            .map(|value| retention(id, value))
            .transpose()?,
        enable_file_validation: config.enable_file_validation,
        encryption_key: config.kms_key_arn.as_deref().map(KeyRef::from_key_arn),
        include_global_service_events: config.include_global_service_events,
        insight_types: config
            .insight_types
            .iter()
            .map(|insight| parse::<InsightType>(id, insight))
            .collect::<Result<_, _>>()?,
        is_multi_region_trail: config.is_multi_region_trail,
        is_organization_trail: config.is_organization_trail,
        management_events: config
            .management_events
            .as_deref()
            .map(|value| parse::<ReadWriteType>(id, value))
            .transpose()?,
        s3_key_prefix: config.s3_key_prefix.clone(),
        send_to_cloud_watch_logs: config.send_to_cloud_watch_logs,
        sns_topic: config.sns_topic_name.as_deref().map(TopicRef::from_topic_name),
        trail_name: config.trail_name.clone(),
    };
    let mut trail = Trail::new(stack, id, props)?;

    for selector in &config.s3_selector {
        trail.add_s3_event_selector(
            &[S3EventSelector {
                bucket: BucketRef::from_bucket_name(selector.bucket_name.as_str()),
                object_prefix: selector.object_prefix.clone(),
            }],
            selector_options(id, &selector.options)?,
        )?;
    }
    for selector in &config.lambda_selector {
        let functions: Vec<FunctionRef> = selector
            .function_arns
            .iter()
            .map(|arn| FunctionRef::from_function_arn(arn.as_str()))
            .collect();
        trail.add_lambda_event_selector(&functions, selector_options(id, &selector.options)?)?;
    }
    if config.log_all_s3_data_events {
        trail.log_all_s3_data_events(AddEventSelectorOptions::default())?;
    }
    if config.log_all_lambda_data_events {
        trail.log_all_lambda_data_events(AddEventSelectorOptions::default())?;
    }

    stack.add_output(format!("{id}Arn"), Output::new(trail.trail_arn()))?;
    debug!(id, selectors = trail.event_selectors().len(), "configured trail");
    stack.add(trail);
    Ok(())
}

fn schedule(config: &ScheduleConfig) -> Result<Schedule, ScheduleError> {
    match config {
        ScheduleConfig::Rate { minutes } => {
            Schedule::rate(Duration::from_secs(minutes.saturating_mul(60)))
        }
        ScheduleConfig::Cron(cron) => Schedule::cron(CronOptions {
            minute: cron.minute.clone(),
            hour: cron.hour.clone(),
            day: cron.day.clone(),
            month: cron.month.clone(),
            week_day: cron.week_day.clone(),
            year: cron.year.clone(),
        }),
        ScheduleConfig::Expression { expression } => Ok(Schedule::expression(expression.as_str())),
    }
}

fn target_input(config: &InputConfig) -> RuleTargetInput {
    match config {
        InputConfig::Text { text } => RuleTargetInput::from_text(text),
        InputConfig::Object { value } => RuleTargetInput::from_object(value),
        InputConfig::EventPath { path } => RuleTargetInput::from_event_path(path.as_str()),
    }
}

fn rule_target(
    registry: &Registry,
    rule_id: &str,
    config: &TargetConfig,
) -> Result<Box<dyn RuleTarget>, AppError> {
    Ok(match config {
        TargetConfig::Arn {
            arn,
            role_arn,
            input,
        } => {
            let mut target = ArnTarget::new(arn.as_str());
            if let Some(role_arn) = role_arn {
                target = target.with_role_arn(role_arn.as_str());
            }
            if let Some(input) = input {
                target = target.with_input(target_input(input));
            }
            Box::new(target)
        }
        TargetConfig::ApiDestination {
            api_destination,
            input,
            header_parameters,
            query_string_parameters,
        } => {
            let arn = lookup(
                &registry.api_destinations,
                rule_id,
                "api destination",
                api_destination,
            )?;
            let mut target = ApiDestinationTarget::from_arn(arn.clone());
            if let Some(input) = input {
                target = target.with_input(target_input(input));
            }
            for (name, value) in header_parameters {
                target = target.with_header(name.as_str(), value.as_str());
            }
            for (name, value) in query_string_parameters {
                target = target.with_query_string(name.as_str(), value.as_str());
            }
            Box::new(target)
        }
    })
}

fn add_rule(stack: &mut Stack, registry: &Registry, config: &RuleConfig) -> Result<(), AppError> {
    let id = config.id.as_str();
    let event_bus = config
        .event_bus
        .as_deref()
        .map(|bus| lookup(&registry.event_buses, id, "event bus", bus).cloned())
        .transpose()?;
    let event_pattern = config
        .event_pattern
        .clone()
        .map(EventPattern::from_value)
        .transpose()?;
    let targets = config
        .target
        .iter()
        .map(|target| rule_target(registry, id, target))
        .collect::<Result<Vec<_>, _>>()?;

    let rule = Rule::new(
        stack,
        id,
        RuleProps {
            description: config.description.clone(),
            enabled: config.enabled,
            event_bus,
            event_pattern,
            rule_name: config.rule_name.clone(),
            schedule: config.schedule.as_ref().map(schedule).transpose()?,
            targets,
        },
    )?;
    stack.add(rule);
    Ok(())
}

fn add_lifecycle_policy(stack: &mut Stack, config: &LifecyclePolicyConfig) -> Result<(), AppError> {
    let props = CfnLifecyclePolicyProps::from_value(config.properties.clone()).map_err(|source| {
        AppError::LifecycleProperties {
            id: config.id.clone(),
            source,
        }
    })?;
    let policy = CfnLifecyclePolicy::new(stack, &config.id, props)?;
    stack.add(policy);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(toml: &str) -> Result<Stack, AppError> {
        build_stack(&AppConfig::from_toml(toml).expect("config"))
    }

    #[test]
    fn trail_with_selectors_and_outputs() {
        let stack = build(
            r#"
[stack]
name = "Audit"
description = "account audit trail"

[[trail]]
id = "Trail"
management_events = "read_only"
insight_types = ["ApiCallRateInsight"]

[[trail.lambda_selector]]
function_arns = ["arn:aws:lambda:us-east-1:123456789012:function:a"]

[[trail.s3_selector]]
bucket_name = "data"
object_prefix = "in/"
read_write_type = "WriteOnly"
"#,
        )
        .expect("stack");
        let template = stack.synthesize().expect("template");
        assert_eq!(template.description.as_deref(), Some("account audit trail"));
        let (_, trail) = template
            .resources_of_type("AWS::CloudTrail::Trail")
            .next()
            .expect("trail");
        let selectors = trail.properties["EventSelectors"]
            .as_array()
            .expect("selectors");
        assert_eq!(selectors.len(), 3);
        assert_eq!(selectors[0]["ReadWriteType"], json!("ReadOnly"));
        assert_eq!(selectors[1]["ReadWriteType"], json!("WriteOnly"));
        assert_eq!(
            selectors[2]["DataResources"][0]["Type"],
            json!("AWS::Lambda::Function")
        );
        assert!(template.outputs.contains_key("TrailArn"));
    }

    #[test]
    fn rules_resolve_buses_and_api_destinations() {
        let stack = build(
            r#"
[stack]
name = "Events"

[[event_bus]]
id = "Orders"
event_bus_name = "orders"

[[connection]]
id = "Conn"
authorization = { type = "api_key", name = "x-api-key", value = { type = "secrets_manager", secret_id = "webhook" } }

[[api_destination]]
id = "Hook"
connection = "Conn"
endpoint = "https://example.com/hook"
http_method = "put"

[[rule]]
id = "Forward"
event_bus = "Orders"
event_pattern = { source = ["shop.orders"] }

[[rule.target]]
type = "api_destination"
api_destination = "Hook"
header_parameters = { "x-source" = "cfnsynth" }
"#,
        )
        .expect("stack");
        let template = stack.synthesize().expect("template");
        let (_, rule) = template
            .resources_of_type("AWS::Events::Rule")
            .next()
            .expect("rule");
        assert_eq!(rule.properties["EventBusName"], json!({"Ref": stack_bus_id(&template)}));
        assert_eq!(
            rule.properties["Targets"][0]["HttpParameters"]["HeaderParameters"],
            json!({"x-source": "cfnsynth"})
        );
        let (_, destination) = template
            .resources_of_type("AWS::Events::ApiDestination")
            .next()
            .expect("destination");
        assert_eq!(destination.properties["HttpMethod"], json!("PUT"));
        assert_eq!(template.resources_of_type("AWS::IAM::Role").count(), 1);
    }

    fn stack_bus_id(template: &cfnsynth_core::Template) -> String {
        template
            .resources_of_type("AWS::Events::EventBus")
            .next()
            .map(|(id, _)| id.clone())
            .expect("bus")
    }

    #[test]
    fn unknown_references_are_reported() {
        let err = build(
            r#"
[stack]
name = "Events"

[[rule]]
id = "Forward"
event_bus = "Missing"
event_pattern = { source = ["a"] }
"#,
        )
        .err()
        .expect("error");
        assert!(matches!(
            err,
            AppError::UnknownReference { kind: "event bus", .. }
        ));
    }

    #[test]
    fn bad_enum_values_name_the_construct() {
        let err = build(
            r#"
[stack]
name = "Audit"

[[trail]]
id = "Trail"
management_events = "sometimes"
"#,
        )
        .err()
        .expect("error");
        assert_eq!(err.to_string(), "[Trail] unknown read/write type 'sometimes'");
    }

    #[test]
    fn lifecycle_policy_properties_are_cloudformation_shaped() {
        let stack = build(
            r#"
[stack]
name = "Backups"

[[lifecycle_policy]]
id = "Daily"
properties = { State = "ENABLED", Description = "daily snapshots", PolicyDetails = { ResourceTypes = ["VOLUME"] } }
"#,
        )
        .expect("stack");
        let template = stack.synthesize().expect("template");
        let node = template.resource("Daily").expect("policy");
        assert_eq!(node.properties["PolicyDetails"], json!({"ResourceTypes": ["VOLUME"]}));
    }

    #[test]
    fn lifecycle_policy_typo_is_reported() {
        let err = build(
            r#"
[stack]
name = "Backups"

[[lifecycle_policy]]
id = "Daily"
properties = { State = "ENABLED", Descriptoin = "daily" }
"#,
        )
        .err()
        .expect("error");
        assert!(matches!(err, AppError::LifecycleProperties { .. }));
        assert!(err.to_string().contains("Descriptoin"));
    }

    #[test]
    fn scheduled_rule_from_rate() {
        let stack = build(
            r#"
[stack]
name = "Jobs"

[[rule]]
id = "Every"
schedule = { type = "rate", minutes = 120 }

[[rule.target]]
type = "arn"
arn = "arn:aws:lambda:us-east-1:123456789012:function:job"
input = { type = "object", value = { job = "cleanup" } }
"#,
        )
        .expect("stack");
        let template = stack.synthesize().expect("template");
        let (_, rule) = template
            .resources_of_type("AWS::Events::Rule")
            .next()
            .expect("rule");
        assert_eq!(rule.properties["ScheduleExpression"], json!("rate(2 hours)"));
        assert_eq!(rule.properties["Targets"][0]["Input"], json!("{\"job\":\"cleanup\"}"));
    }

    #[test]
    fn writer_follows_output_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = OutputConfig {
            dir: dir.path().to_string_lossy().to_string(),
            format: FormatConfig::Yaml(Default::default()),
        };
        let stack = build("[stack]\nname = \"Empty\"\n").expect("stack");
        let mut writer = open_writer(&output).expect("writer");
        writer
            .write_template(stack.name(), &stack.synthesize().expect("template"))
            .expect("write");
        assert!(dir
            .path()
            .join(template_file_name(&output, stack.name()))
            .exists());
    }
}
