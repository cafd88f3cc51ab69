//! Rule targets.

use crate::connection::ApiDestination;
use crate::input::RuleTargetInput;
use crate::model::{
    DeadLetterConfigProperty, HttpParametersProperty, RetryPolicyProperty,
    SqsParametersProperty, TargetProperty,
};
use cfnsynth_core::aws::iam::{
    CfnPolicy, CfnPolicyProps, CfnRole, CfnRoleProps, PolicyDocument, PolicyStatement, RoleRef,
};
use cfnsynth_core::{CfnString, Construct, Stack, SynthError};
use std::collections::BTreeMap;

/// State handed to a target while it is attached to a rule.
pub struct BindContext<'a> {
    stack: &'a mut Stack,
    rule_path: &'a str,
    target_id: &'a str,
    children: Vec<Box<dyn Construct>>,
}

impl<'a> BindContext<'a> {
    pub fn new(stack: &'a mut Stack, rule_path: &'a str, target_id: &'a str) -> Self {
        Self {
            stack,
            rule_path,
            target_id,
            children: Vec::new(),
        }
    }

    pub fn stack(&mut self) -> &mut Stack {
        self.stack
    }

    pub fn rule_path(&self) -> &str {
        self.rule_path
    }

    pub fn target_id(&self) -> &str {
        self.target_id
    }

    /// Path for a construct owned by this target.
    pub fn child_path(&self, id: &str) -> String {
        format!("{}/{}/{}", self.rule_path, self.target_id, id)
    }

    /// Registers a supporting construct that is rendered with the rule.
    pub fn add_child<C: Construct + 'static>(&mut self, construct: C) {
        self.children.push(Box::new(construct));
    }

    pub fn into_children(self) -> Vec<Box<dyn Construct>> {
        self.children
    }
}

/// Target properties produced by binding a target to a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTargetConfig {
    pub arn: CfnString,
    pub role_arn: Option<CfnString>,
    pub input: Option<RuleTargetInput>,
    pub dead_letter_config: Option<DeadLetterConfigProperty>,
    pub retry_policy: Option<RetryPolicyProperty>,
    pub http_parameters: Option<HttpParametersProperty>,
    pub sqs_parameters: Option<SqsParametersProperty>,
}

impl RuleTargetConfig {
    pub fn new(arn: impl Into<CfnString>) -> Self {
        Self {
            arn: arn.into(),
            role_arn: None,
            input: None,
            dead_letter_config: None,
            retry_policy: None,
            http_parameters: None,
            sqs_parameters: None,
        }
    }

    pub fn to_target_property(&self, id: &str) -> TargetProperty {
        let mut target = TargetProperty::new(id, self.arn.clone());
        target.role_arn = self.role_arn.clone();
        target.dead_letter_config = self.dead_letter_config.clone();
        target.retry_policy = self.retry_policy.clone();
        target.http_parameters = self.http_parameters.clone();
        target.sqs_parameters = self.sqs_parameters.clone();
        if let Some(input) = &self.input {
            input.apply(&mut target);
        }
        target
    }
}

/// Something a rule can deliver matched events to.
pub trait RuleTarget {
    fn bind(&self, ctx: &mut BindContext<'_>) -> Result<RuleTargetConfig, SynthError>;
}

/// Any target addressed by ARN (queue, topic, function, stream, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ArnTarget {
    arn: CfnString,
    role_arn: Option<CfnString>,
    input: Option<RuleTargetInput>,
    dead_letter_queue_arn: Option<CfnString>,
    retry_policy: Option<RetryPolicyProperty>,
    message_group_id: Option<CfnString>,
}

impl ArnTarget {
    pub fn new(arn: impl Into<CfnString>) -> Self {
        Self {
            arn: arn.into(),
            role_arn: None,
            input: None,
            dead_letter_queue_arn: None,
            retry_policy: None,
            message_group_id: None,
        }
    }

    pub fn with_role_arn(mut self, role_arn: impl Into<CfnString>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    pub fn with_input(mut self, input: RuleTargetInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_dead_letter_queue(mut self, queue_arn: impl Into<CfnString>) -> Self {
        self.dead_letter_queue_arn = Some(queue_arn.into());
        self
    }

    pub fn with_retry_policy(
        mut self,
        max_event_age_seconds: Option<u32>,
        max_retry_attempts: Option<u32>,
    ) -> Self {
        self.retry_policy = Some(RetryPolicyProperty {
            maximum_event_age_in_seconds: max_event_age_seconds,
            maximum_retry_attempts: max_retry_attempts,
        });
        self
    }

    /// FIFO queue message group.
    pub fn with_message_group_id(mut self, group: impl Into<CfnString>) -> Self {
        self.message_group_id = Some(group.into());
        self
    }
}

impl RuleTarget for ArnTarget {
    fn bind(&self, _ctx: &mut BindContext<'_>) -> Result<RuleTargetConfig, SynthError> {
        Ok(RuleTargetConfig {
            role_arn: self.role_arn.clone(),
            input: self.input.clone(),
            dead_letter_config: self.dead_letter_queue_arn.clone().map(|arn| {
                DeadLetterConfigProperty { arn: Some(arn) }
            }),
            retry_policy: self.retry_policy.clone(),
            sqs_parameters: self
                .message_group_id
                .clone()
                .map(|message_group_id| SqsParametersProperty { message_group_id }),
            ..RuleTargetConfig::new(self.arn.clone())
        })
    }
}

/// Delivers events to an HTTP endpoint through an API destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDestinationTarget {
    api_destination_arn: CfnString,
    role: Option<RoleRef>,
    input: Option<RuleTargetInput>,
    header_parameters: BTreeMap<String, CfnString>,
    query_string_parameters: BTreeMap<String, CfnString>,
    path_parameter_values: Vec<CfnString>,
}

impl ApiDestinationTarget {
    pub fn new(destination: &ApiDestination) -> Self {
        Self::from_arn(destination.api_destination_arn())
    }

    pub fn from_arn(api_destination_arn: impl Into<CfnString>) -> Self {
        Self {
            api_destination_arn: api_destination_arn.into(),
            role: None,
            input: None,
            header_parameters: BTreeMap::new(),
            query_string_parameters: BTreeMap::new(),
            path_parameter_values: Vec::new(),
        }
    }

    /// Role EventBridge assumes to invoke the destination; one is created when unset.
    pub fn with_role(mut self, role: RoleRef) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_input(mut self, input: RuleTargetInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<CfnString>) -> Self {
        self.header_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_query_string(
        mut self,
        name: impl Into<String>,
        value: impl Into<CfnString>,
    ) -> Self {
        self.query_string_parameters
            .insert(name.into(), value.into());
        self
    }

    pub fn with_path_parameter(mut self, value: impl Into<CfnString>) -> Self {
        self.path_parameter_values.push(value.into());
        self
    }

    fn http_parameters(&self) -> Option<HttpParametersProperty> {
        let params = HttpParametersProperty {
            header_parameters: non_empty_map(&self.header_parameters),
            query_string_parameters: non_empty_map(&self.query_string_parameters),
            path_parameter_values: (!self.path_parameter_values.is_empty())
                .then(|| self.path_parameter_values.clone()),
        };
        (params != HttpParametersProperty::default()).then_some(params)
    }

    fn create_role(&self, ctx: &mut BindContext<'_>) -> Result<RoleRef, SynthError> {
        let role_path = ctx.child_path("EventsRole");
        let role = CfnRole::new(
            ctx.stack(),
            &role_path,
            CfnRoleProps {
                assume_role_policy_document: PolicyDocument::assumed_by_service(
                    "events.amazonaws.com",
                ),
                description: None,
                role_name: None,
            },
        )?;
        let role_ref = role.as_role_ref();
        let policy_name = ctx.stack().unique_name(&format!("{role_path}/DefaultPolicy"), 128);
        let policy = CfnPolicy::new(
            ctx.stack(),
            &format!("{role_path}/DefaultPolicy"),
            CfnPolicyProps {
                policy_name: policy_name.into(),
                policy_document: PolicyDocument::new(vec![PolicyStatement::allow()
                    .action("events:InvokeApiDestination")
                    .resource(self.api_destination_arn.clone())]),
                roles: Some(vec![role.reference()]),
            },
        )?;
        ctx.add_child(role);
        ctx.add_child(policy);
        Ok(role_ref)
    }
}

impl RuleTarget for ApiDestinationTarget {
    fn bind(&self, ctx: &mut BindContext<'_>) -> Result<RuleTargetConfig, SynthError> {
        let role = match &self.role {
            Some(role) => role.clone(),
            None => self.create_role(ctx)?,
        };
        Ok(RuleTargetConfig {
            role_arn: Some(role.role_arn),
            input: self.input.clone(),
            http_parameters: self.http_parameters(),
            ..RuleTargetConfig::new(self.api_destination_arn.clone())
        })
    }
}

fn non_empty_map(map: &BTreeMap<String, CfnString>) -> Option<BTreeMap<String, CfnString>> {
    (!map.is_empty()).then(|| map.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arn_target_renders_optional_settings() {
        let mut stack = Stack::new("Demo");
        let mut ctx = BindContext::new(&mut stack, "Rule", "Target0");
        let config = ArnTarget::new("arn:aws:sqs:us-east-1:1:jobs.fifo")
            .with_message_group_id("g")
            .with_dead_letter_queue("arn:aws:sqs:us-east-1:1:dlq")
            .with_input(RuleTargetInput::from_text("go"))
            .bind(&mut ctx)
            .expect("bind");
        assert!(ctx.into_children().is_empty());

        let value = serde_json::to_value(config.to_target_property("Target0")).expect("json");
        assert_eq!(
            value,
            json!({
                "Arn": "arn:aws:sqs:us-east-1:1:jobs.fifo",
                "Id": "Target0",
                "DeadLetterConfig": {"Arn": "arn:aws:sqs:us-east-1:1:dlq"},
                "Input": "\"go\"",
                "SqsParameters": {"MessageGroupId": "g"}
            })
        );
    }

    #[test]
    fn api_destination_target_creates_invoke_role() {
        let mut stack = Stack::new("Demo");
        let mut ctx = BindContext::new(&mut stack, "Rule", "Target0");
        let config = ApiDestinationTarget::from_arn("arn:aws:events:us-east-1:1:api-destination/d")
            .with_header("X-Team", "ops")
            .bind(&mut ctx)
            .expect("bind");
        let children = ctx.into_children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].path(), "Rule/Target0/EventsRole");
        assert!(config.role_arn.expect("role").is_token());
        assert_eq!(
            serde_json::to_value(config.http_parameters).expect("json"),
            json!({"HeaderParameters": {"X-Team": "ops"}})
        );
    }

    #[test]
    fn api_destination_target_reuses_given_role() {
        let mut stack = Stack::new("Demo");
        let mut ctx = BindContext::new(&mut stack, "Rule", "Target0");
        let config = ApiDestinationTarget::from_arn("arn:aws:events:us-east-1:1:api-destination/d")
            .with_role(RoleRef::from_role_arn("arn:aws:iam::1:role/invoke"))
            .bind(&mut ctx)
            .expect("bind");
        assert!(ctx.into_children().is_empty());
        assert_eq!(
            config.role_arn,
            Some(CfnString::from("arn:aws:iam::1:role/invoke"))
        );
        assert_eq!(config.http_parameters, None);
    }
}
