//! L1 EventBridge resources: CloudFormation property structs as documented.

use cfnsynth_core::cfn_resource;
use cfnsynth_core::validation::is_name_char;
use cfnsynth_core::{CfnProperties, CfnString, CfnTag, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const NAME_CHARS: &str = "[.-_A-Za-z0-9]";

/// Properties of `AWS::Events::Rule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRuleProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CfnString>,
    /// Name or ARN of the bus; the default bus when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_bus_name: Option<CfnString>,
    /// Pattern in EventBridge shape (kebab-case keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_expression: Option<CfnString>,
    /// `ENABLED` or `DISABLED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<TargetProperty>>,
}

impl CfnProperties for CfnRuleProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::Rule";

    fn validate(&self, validator: &mut Validator) {
        validator.length("Name", self.name.as_ref(), 1, 64);
        validator.charset("Name", self.name.as_ref(), is_name_char, NAME_CHARS);
        validator.max_length("Description", self.description.as_ref(), 512);
        validator.one_of(
            "State",
            self.state.as_ref().and_then(CfnString::as_str),
            &["ENABLED", "DISABLED"],
        );
        if let Some(targets) = &self.targets {
            validator.max_items("Targets", targets.len(), 5);
            for target in targets {
                validator.length("Target Id", Some(&target.id), 1, 64);
            }
        }
    }
}

cfn_resource!(
    /// `AWS::Events::Rule`.
    CfnRule,
    CfnRuleProps
);

impl CfnRule {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }
}

/// One target of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetProperty {
    pub arn: CfnString,
    pub id: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_parameters: Option<BatchParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_config: Option<DeadLetterConfigProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs_parameters: Option<EcsParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_parameters: Option<HttpParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transformer: Option<InputTransformerProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinesis_parameters: Option<KinesisParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift_data_parameters: Option<RedshiftDataParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicyProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_command_parameters: Option<RunCommandParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqs_parameters: Option<SqsParametersProperty>,
}

impl TargetProperty {
    pub fn new(id: impl Into<CfnString>, arn: impl Into<CfnString>) -> Self {
        Self {
            arn: arn.into(),
            id: id.into(),
            batch_parameters: None,
            dead_letter_config: None,
            ecs_parameters: None,
            http_parameters: None,
            input: None,
            input_path: None,
            input_transformer: None,
            kinesis_parameters: None,
            redshift_data_parameters: None,
            retry_policy: None,
            role_arn: None,
            run_command_parameters: None,
            sqs_parameters: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchParametersProperty {
    pub job_definition: CfnString,
    pub job_name: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_properties: Option<BatchArrayPropertiesProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_strategy: Option<BatchRetryStrategyProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchArrayPropertiesProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchRetryStrategyProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeadLetterConfigProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<CfnString>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EcsParametersProperty {
    pub task_definition_arn: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_type: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfigurationProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConfigurationProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_vpc_configuration: Option<AwsVpcConfigurationProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsVpcConfigurationProperty {
    pub subnets: Vec<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_public_ip: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<CfnString>>,
}

/// Path, header and query parameters for API Gateway and API destination targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpParametersProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_parameters: Option<BTreeMap<String, CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_parameter_values: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<BTreeMap<String, CfnString>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputTransformerProperty {
    pub input_template: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_paths_map: Option<BTreeMap<String, CfnString>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KinesisParametersProperty {
    pub partition_key_path: CfnString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedshiftDataParametersProperty {
    pub database: CfnString,
    pub sql: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_user: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_manager_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_event: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetryPolicyProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_event_age_in_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunCommandParametersProperty {
    pub run_command_targets: Vec<RunCommandTargetProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunCommandTargetProperty {
    pub key: CfnString,
    pub values: Vec<CfnString>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqsParametersProperty {
    pub message_group_id: CfnString,
}

/// Properties of `AWS::Events::EventBus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnEventBusProps {
    pub name: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source_name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CfnTag>>,
}

impl CfnProperties for CfnEventBusProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::EventBus";

    fn validate(&self, validator: &mut Validator) {
        validator.length("Name", Some(&self.name), 1, 256);
    }
}

cfn_resource!(
    /// `AWS::Events::EventBus`.
    CfnEventBus,
    CfnEventBusProps
);

impl CfnEventBus {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn attr_name(&self) -> CfnString {
        self.get_att("Name")
    }

    pub fn attr_policy(&self) -> CfnString {
        self.get_att("Policy")
    }
}

/// Properties of `AWS::Events::Archive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnArchiveProps {
    pub source_arn: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<Value>,
    /// Zero keeps events indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
}

impl CfnProperties for CfnArchiveProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::Archive";

    fn validate(&self, validator: &mut Validator) {
        validator.length("ArchiveName", self.archive_name.as_ref(), 1, 48);
        validator.charset("ArchiveName", self.archive_name.as_ref(), is_name_char, NAME_CHARS);
        validator.max_length("Description", self.description.as_ref(), 512);
    }
}

cfn_resource!(
    /// `AWS::Events::Archive`.
    CfnArchive,
    CfnArchiveProps
);

impl CfnArchive {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn attr_archive_name(&self) -> CfnString {
        self.get_att("ArchiveName")
    }
}

/// Properties of `AWS::Events::Connection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnConnectionProps {
    /// `API_KEY`, `BASIC` or `OAUTH_CLIENT_CREDENTIALS`.
    pub authorization_type: CfnString,
    pub auth_parameters: AuthParametersProperty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<CfnString>,
}

impl CfnProperties for CfnConnectionProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::Connection";

    fn validate(&self, validator: &mut Validator) {
        validator.length("Name", self.name.as_ref(), 1, 64);
        validator.charset("Name", self.name.as_ref(), is_name_char, NAME_CHARS);
        validator.max_length("Description", self.description.as_ref(), 512);
        validator.one_of(
            "AuthorizationType",
            self.authorization_type.as_str(),
            &["API_KEY", "BASIC", "OAUTH_CLIENT_CREDENTIALS"],
        );
    }
}

cfn_resource!(
    /// `AWS::Events::Connection`.
    CfnConnection,
    CfnConnectionProps
);

impl CfnConnection {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn attr_secret_arn(&self) -> CfnString {
        self.get_att("SecretArn")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthParametersProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_auth_parameters: Option<ApiKeyAuthParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_parameters: Option<BasicAuthParametersProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_http_parameters: Option<ConnectionHttpParametersProperty>,
    #[serde(
        rename = "OAuthParameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub oauth_parameters: Option<OAuthParametersProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiKeyAuthParametersProperty {
    pub api_key_name: CfnString,
    pub api_key_value: CfnString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasicAuthParametersProperty {
    pub username: CfnString,
    pub password: CfnString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OAuthParametersProperty {
    pub authorization_endpoint: CfnString,
    pub client_parameters: ClientParametersProperty,
    pub http_method: CfnString,
    #[serde(
        rename = "OAuthHttpParameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub oauth_http_parameters: Option<ConnectionHttpParametersProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientParametersProperty {
    #[serde(rename = "ClientID")]
    pub client_id: CfnString,
    #[serde(rename = "ClientSecret")]
    pub client_secret: CfnString,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionHttpParametersProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_parameters: Option<Vec<ParameterProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_parameters: Option<Vec<ParameterProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<Vec<ParameterProperty>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterProperty {
    pub key: CfnString,
    pub value: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_value_secret: Option<bool>,
}

/// Properties of `AWS::Events::ApiDestination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnApiDestinationProps {
    pub connection_arn: CfnString,
    pub http_method: CfnString,
    pub invocation_endpoint: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_rate_limit_per_second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<CfnString>,
}

impl CfnProperties for CfnApiDestinationProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::ApiDestination";

    fn validate(&self, validator: &mut Validator) {
        validator.length("Name", self.name.as_ref(), 1, 64);
        validator.charset("Name", self.name.as_ref(), is_name_char, NAME_CHARS);
        validator.max_length("Description", self.description.as_ref(), 512);
        validator.one_of(
            "HttpMethod",
            self.http_method.as_str(),
            &["POST", "GET", "HEAD", "OPTIONS", "PUT", "PATCH", "DELETE"],
        );
        if let Some(rate) = self.invocation_rate_limit_per_second {
            validator.ensure(rate >= 1, || {
                format!("InvocationRateLimitPerSecond must be at least 1, got {rate}")
            });
        }
    }
}

cfn_resource!(
    /// `AWS::Events::ApiDestination`.
    CfnApiDestination,
    CfnApiDestinationProps
);

impl CfnApiDestination {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }
}

/// Properties of `AWS::Events::EventBusPolicy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnEventBusPolicyProps {
    pub statement_id: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_bus_name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<CfnString>,
    /// Full IAM statement; replaces `action`, `principal` and `condition`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<Value>,
}

impl CfnProperties for CfnEventBusPolicyProps {
    const RESOURCE_TYPE: &'static str = "AWS::Events::EventBusPolicy";

    fn validate(&self, validator: &mut Validator) {
        validator.length("StatementId", Some(&self.statement_id), 1, 64);
        validator.mutually_exclusive(
            ("Statement", self.statement.is_some()),
            ("Principal", self.principal.is_some()),
        );
    }
}

cfn_resource!(
    /// `AWS::Events::EventBusPolicy`.
    CfnEventBusPolicy,
    CfnEventBusPolicyProps
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<CfnString>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CfnString>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnsynth_core::{Construct, Stack};
    use serde_json::json;

    #[test]
    fn required_fields_read_back() {
        let props = CfnApiDestinationProps {
            connection_arn: "arn:aws:events:us-east-1:1:connection/c".into(),
            http_method: "POST".into(),
            invocation_endpoint: "https://example.com/hook".into(),
            description: None,
            invocation_rate_limit_per_second: None,
            name: None,
        };
        assert_eq!(props.http_method, "POST");
        assert_eq!(props.invocation_endpoint, "https://example.com/hook");
        assert_eq!(props.description, None);
        let value = serde_json::to_value(&props).expect("json");
        assert!(value.get("Description").is_none());
        assert!(value.get("Name").is_none());
    }

    #[test]
    fn props_equality_is_field_wise() {
        let a = CfnEventBusProps {
            name: "orders".into(),
            event_source_name: None,
            tags: None,
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.event_source_name = Some("aws.partner/a/b".into());
        assert_ne!(a, b);
    }

    #[test]
    fn oauth_parameters_use_cloudformation_names() {
        let params = AuthParametersProperty {
            oauth_parameters: Some(OAuthParametersProperty {
                authorization_endpoint: "https://auth.example.com".into(),
                client_parameters: ClientParametersProperty {
                    client_id: "id".into(),
                    client_secret: "secret".into(),
                },
                http_method: "POST".into(),
                oauth_http_parameters: None,
            }),
            ..AuthParametersProperty::default()
        };
        let value = serde_json::to_value(&params).expect("json");
        assert_eq!(
            value,
            json!({"OAuthParameters": {
                "AuthorizationEndpoint": "https://auth.example.com",
                "ClientParameters": {"ClientID": "id", "ClientSecret": "secret"},
                "HttpMethod": "POST"
            }})
        );
    }

    #[test]
    fn rule_name_is_validated() {
        let mut stack = Stack::new("Demo");
        let rule = CfnRule::new(
            &mut stack,
            "Rule",
            CfnRuleProps {
                name: Some("has space".into()),
                state: Some("PAUSED".into()),
                ..CfnRuleProps::default()
            },
        )
        .expect("rule");
        let errors = rule.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("Name"));
        assert!(errors[1].message.contains("State"));
    }

    #[test]
    fn event_bus_policy_renders_and_rejects_statement_with_principal() {
        let mut stack = Stack::new("Demo");
        let mut policy = CfnEventBusPolicy::new(
            &mut stack,
            "AllowAccount",
            CfnEventBusPolicyProps {
                statement_id: "allow-111122223333".into(),
                action: Some("events:PutEvents".into()),
                condition: None,
                event_bus_name: Some("orders".into()),
                principal: Some("111122223333".into()),
                statement: None,
            },
        )
        .expect("policy");
        assert_eq!(
            CfnEventBusPolicy::CFN_RESOURCE_TYPE_NAME,
            "AWS::Events::EventBusPolicy"
        );
        assert!(policy.validate().is_empty());

        let mut template = cfnsynth_core::Template::new(None);
        policy.synthesize(&mut template).expect("synth");
        let node = template.resource("AllowAccount").expect("node");
        assert_eq!(
            node.properties,
            json!({
                "StatementId": "allow-111122223333",
                "Action": "events:PutEvents",
                "EventBusName": "orders",
                "Principal": "111122223333"
            })
        );

        policy.props_mut().statement = Some(json!({"Effect": "Allow"}));
        assert_eq!(policy.validate().len(), 1);
    }

    #[test]
    fn target_deserializes_from_cloudformation_shape() {
        let target: TargetProperty = serde_json::from_value(json!({
            "Arn": {"Fn::GetAtt": ["Queue", "Arn"]},
            "Id": "Target0",
            "SqsParameters": {"MessageGroupId": "g"}
        }))
        .expect("target");
        assert!(target.arn.is_token());
        assert_eq!(target.id, "Target0");
        assert_eq!(
            target.sqs_parameters,
            Some(SqsParametersProperty {
                message_group_id: "g".into()
            })
        );
    }
}
