//! The `Trail` construct: a trail plus the bucket, log group, role and
//! policies it needs to deliver logs.

use crate::model::{
    CfnTrail, CfnTrailProps, DataResourceProperty, DataResourceType, EventSelectorProperty,
    InsightSelectorProperty, InsightType, ManagementEventSources, ReadWriteType,
    MAX_DATA_RESOURCE_VALUES, MAX_EVENT_SELECTORS,
};
use cfnsynth_core::aws::iam::{
    CfnPolicy, CfnPolicyProps, CfnRole, CfnRoleProps, PolicyDocument, PolicyStatement, Principal,
};
use cfnsynth_core::aws::kms::KeyRef;
use cfnsynth_core::aws::lambda::FunctionRef;
use cfnsynth_core::aws::logs::{CfnLogGroup, CfnLogGroupProps, LogGroupRef, RetentionDays};
use cfnsynth_core::aws::s3::{
    BucketEncryption, BucketRef, CfnBucket, CfnBucketPolicy, CfnBucketPolicyProps,
    CfnBucketProps, PublicAccessBlockConfiguration,
};
use cfnsynth_core::aws::sns::{CfnTopicPolicy, CfnTopicPolicyProps, TopicRef};
use cfnsynth_core::token::concat;
use cfnsynth_core::{
    CfnString, Construct, Pseudo, Stack, SynthError, Template, ValidationError,
};
use cfnsynth_events::{EventPattern, Rule, RuleError, RuleProps, RuleTarget};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

const CLOUDTRAIL_SERVICE: &str = "cloudtrail.amazonaws.com";

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("a maximum of 250 data elements can be in one event selector, got {0}")]
    TooManyDataValues(usize),
    #[error("a maximum of 5 event selectors are supported per trail")]
    TooManySelectors,
    #[error(transparent)]
    Synth(#[from] SynthError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailProps {
    /// Bucket that receives the log files; a bucket is created when unset.
    pub bucket: Option<BucketRef>,
    /// Log group for `send_to_cloud_watch_logs`; one is created when unset.
    pub cloud_watch_log_group: Option<LogGroupRef>,
    /// Retention of a created log group. Defaults to one year.
    pub cloud_watch_logs_retention: Option<RetentionDays>,
    /// Defaults to true.
    pub enable_file_validation: Option<bool>,
    pub encryption_key: Option<KeyRef>,
    /// Defaults to true.
    pub include_global_service_events: Option<bool>,
    pub insight_types: Vec<InsightType>,
    /// Defaults to true.
    pub is_multi_region_trail: Option<bool>,
    pub is_organization_trail: Option<bool>,
    /// Management events to log; CloudTrail logs all when unset.
    pub management_events: Option<ReadWriteType>,
    pub s3_key_prefix: Option<String>,
    /// Defaults to false.
    pub send_to_cloud_watch_logs: Option<bool>,
    pub sns_topic: Option<TopicRef>,
    pub trail_name: Option<String>,
}

/// Options shared by every event selector method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddEventSelectorOptions {
    pub exclude_management_event_sources: Vec<ManagementEventSources>,
    /// Defaults to true.
    pub include_management_events: Option<bool>,
    /// Defaults to all events.
    pub read_write_type: Option<ReadWriteType>,
}

/// A bucket and optional key prefix whose object-level events are logged.
#[derive(Debug, Clone, PartialEq)]
pub struct S3EventSelector {
    pub bucket: BucketRef,
    /// All objects when unset.
    pub object_prefix: Option<String>,
}

/// Options for [`Trail::on_event`].
#[derive(Default)]
pub struct OnEventOptions {
    pub description: Option<String>,
    /// Added on top of the CloudTrail API call filter.
    pub event_pattern: Option<EventPattern>,
    pub rule_name: Option<String>,
    pub target: Option<Box<dyn RuleTarget>>,
}

/// A CloudTrail trail.
pub struct Trail {
    path: String,
    resource: CfnTrail,
    bucket: BucketRef,
    log_group: Option<LogGroupRef>,
    event_selectors: Vec<EventSelectorProperty>,
    children: Vec<Box<dyn Construct>>,
}

impl Trail {
    pub fn new(stack: &mut Stack, id: &str, props: TrailProps) -> Result<Self, TrailError> {
        let mut children: Vec<Box<dyn Construct>> = Vec::new();
        let mut depends_on: Vec<String> = Vec::new();

        let bucket = match props.bucket {
            Some(bucket) => bucket,
            None => {
                let (bucket, policy) =
                    create_log_bucket(stack, id, props.s3_key_prefix.as_deref())?;
                let bucket_ref = bucket.as_bucket_ref();
                depends_on.push(policy.logical_id().to_string());
                children.push(Box::new(bucket));
                children.push(Box::new(policy));
                bucket_ref
            }
        };

        if let Some(topic) = props.sns_topic.as_ref().filter(|topic| topic.owned) {
            let policy = CfnTopicPolicy::new(
                stack,
                &format!("{id}/SnsTopicPolicy"),
                CfnTopicPolicyProps {
                    policy_document: PolicyDocument::new(vec![PolicyStatement::allow()
                        .principal(Principal::service(CLOUDTRAIL_SERVICE))
                        .action("sns:Publish")
                        .resource(topic.topic_arn.clone())]),
                    topics: vec![topic.topic_arn.clone()],
                },
            )?;
            children.push(Box::new(policy));
        }

        let mut log_group = None;
        let mut logs_role_arn = None;
        if props.send_to_cloud_watch_logs.unwrap_or(false) {
            let group = match props.cloud_watch_log_group {
                Some(group) => group,
                None => {
                    let retention = props.cloud_watch_logs_retention.unwrap_or_default();
                    let group = CfnLogGroup::new(
                        stack,
                        &format!("{id}/LogGroup/Resource"),
                        CfnLogGroupProps {
                            log_group_name: None,
                            retention_in_days: retention.days(),
                            kms_key_id: None,
                        },
                    )?;
                    let group_ref = group.as_log_group_ref();
                    children.push(Box::new(group));
                    group_ref
                }
            };
            let (role, policy) = create_logs_role(stack, id, &group)?;
            logs_role_arn = Some(role.attr_arn());
            depends_on.push(role.logical_id().to_string());
            depends_on.push(policy.logical_id().to_string());
            children.push(Box::new(role));
            children.push(Box::new(policy));
            log_group = Some(group);
        }

        let mut event_selectors = Vec::new();
        match props.management_events {
            Some(ReadWriteType::None) => event_selectors.push(EventSelectorProperty {
                include_management_events: Some(false),
                ..EventSelectorProperty::default()
            }),
            Some(read_write) => event_selectors.push(EventSelectorProperty {
                include_management_events: Some(true),
                read_write_type: Some(read_write.as_str().into()),
                ..EventSelectorProperty::default()
            }),
            None => {}
        }

        let insight_selectors = (!props.insight_types.is_empty()).then(|| {
            props
                .insight_types
                .iter()
                .map(|insight| InsightSelectorProperty {
                    insight_type: Some(insight.as_str().into()),
                })
                .collect()
        });

        let mut cfn_props = CfnTrailProps::new(true, bucket.bucket_name.clone());
        cfn_props.enable_log_file_validation = Some(props.enable_file_validation.unwrap_or(true));
        cfn_props.is_multi_region_trail = Some(props.is_multi_region_trail.unwrap_or(true));
        cfn_props.include_global_service_events =
            Some(props.include_global_service_events.unwrap_or(true));
        cfn_props.is_organization_trail = props.is_organization_trail;
        cfn_props.trail_name = props.trail_name.map(Into::into);
        cfn_props.kms_key_id = props.encryption_key.map(|key| key.key_arn);
        cfn_props.s3_key_prefix = props.s3_key_prefix.map(Into::into);
        cfn_props.cloud_watch_logs_log_group_arn =
            log_group.as_ref().map(|group| group.log_group_arn.clone());
        cfn_props.cloud_watch_logs_role_arn = logs_role_arn;
        cfn_props.sns_topic_name = props.sns_topic.map(|topic| topic.topic_name);
        cfn_props.insight_selectors = insight_selectors;

        let mut resource = CfnTrail::new(stack, &format!("{id}/Resource"), cfn_props)?;
        for logical_id in depends_on {
            resource.add_depends_on(logical_id);
        }
        debug!(id, logical_id = resource.logical_id(), "created trail");

        let mut trail = Self {
            path: id.to_string(),
            resource,
            bucket,
            log_group,
            event_selectors,
            children,
        };
        trail.sync_selectors();
        Ok(trail)
    }

    /// Appends a data event selector for `values` of `data_resource_type`.
    pub fn add_event_selector(
        &mut self,
        data_resource_type: DataResourceType,
        values: Vec<CfnString>,
        options: AddEventSelectorOptions,
    ) -> Result<(), TrailError> {
        if values.len() > MAX_DATA_RESOURCE_VALUES {
            return Err(TrailError::TooManyDataValues(values.len()));
        }
        if self.event_selectors.len() >= MAX_EVENT_SELECTORS {
            return Err(TrailError::TooManySelectors);
        }
        let exclude = (!options.exclude_management_event_sources.is_empty()).then(|| {
            options
                .exclude_management_event_sources
                .iter()
                .map(|source| source.as_str().into())
                .collect()
        });
        self.event_selectors.push(EventSelectorProperty {
            data_resources: Some(vec![DataResourceProperty {
                data_resource_type: data_resource_type.as_str().into(),
                values: Some(values),
            }]),
            exclude_management_event_sources: exclude,
            include_management_events: options.include_management_events,
            read_write_type: options
                .read_write_type
                .map(|read_write| read_write.as_str().into()),
        });
        self.sync_selectors();
        debug!(
            trail = %self.path,
            data_resource_type = %data_resource_type,
            selectors = self.event_selectors.len(),
            "added event selector"
        );
        Ok(())
    }

    /// Logs data events for objects in each bucket under its prefix.
    pub fn add_s3_event_selector(
        &mut self,
        selectors: &[S3EventSelector],
        options: AddEventSelectorOptions,
    ) -> Result<(), TrailError> {
        if selectors.is_empty() {
            return Ok(());
        }
        let values = selectors
            .iter()
            .map(|selector| {
                concat(vec![
                    selector.bucket.bucket_arn.clone(),
                    "/".into(),
                    selector.object_prefix.as_deref().unwrap_or("").into(),
                ])
            })
            .collect();
        self.add_event_selector(DataResourceType::S3Object, values, options)
    }

    /// Logs invocations of the given functions; an empty list adds nothing.
    pub fn add_lambda_event_selector(
        &mut self,
        handlers: &[FunctionRef],
        options: AddEventSelectorOptions,
    ) -> Result<(), TrailError> {
        if handlers.is_empty() {
            return Ok(());
        }
        let values = handlers
            .iter()
            .map(|handler| handler.function_arn.clone())
            .collect();
        self.add_event_selector(DataResourceType::LambdaFunction, values, options)
    }

    /// Logs data events for every object in every bucket of the account.
    pub fn log_all_s3_data_events(
        &mut self,
        options: AddEventSelectorOptions,
    ) -> Result<(), TrailError> {
        let all = concat(vec!["arn:".into(), Pseudo::Partition.token(), ":s3:::".into()]);
        self.add_event_selector(DataResourceType::S3Object, vec![all], options)
    }

    /// Logs invocations of every function in the account.
    pub fn log_all_lambda_data_events(
        &mut self,
        options: AddEventSelectorOptions,
    ) -> Result<(), TrailError> {
        let all = concat(vec!["arn:".into(), Pseudo::Partition.token(), ":lambda".into()]);
        self.add_event_selector(DataResourceType::LambdaFunction, vec![all], options)
    }

    /// Creates a rule matching API calls recorded by any trail in the account.
    pub fn on_event(
        stack: &mut Stack,
        id: &str,
        options: OnEventOptions,
    ) -> Result<Rule, TrailError> {
        let mut rule = Rule::new(
            stack,
            id,
            RuleProps {
                description: options.description,
                event_pattern: options.event_pattern,
                rule_name: options.rule_name,
                targets: options.target.into_iter().collect(),
                ..RuleProps::default()
            },
        )?;
        rule.add_event_pattern(
            &EventPattern::new().detail_type([json!("AWS API Call via CloudTrail")]),
        )?;
        Ok(rule)
    }

    pub fn trail_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn trail_sns_topic_arn(&self) -> CfnString {
        self.resource.attr_sns_topic_arn()
    }

    /// Log group events are delivered to, when `send_to_cloud_watch_logs` is set.
    pub fn log_group(&self) -> Option<&LogGroupRef> {
        self.log_group.as_ref()
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.bucket
    }

    pub fn event_selectors(&self) -> &[EventSelectorProperty] {
        &self.event_selectors
    }

    pub fn resource(&self) -> &CfnTrail {
        &self.resource
    }

    fn sync_selectors(&mut self) {
        self.resource.props_mut().event_selectors =
            (!self.event_selectors.is_empty()).then(|| self.event_selectors.clone());
    }
}

impl Construct for Trail {
    fn path(&self) -> &str {
        &self.path
    }

    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.resource.validate();
        for child in &self.children {
            errors.extend(child.validate());
        }
        errors
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        for child in &self.children {
            child.synthesize(template)?;
        }
        self.resource.synthesize(template)
    }
}

/// Bucket with S3-managed encryption and no public access, plus the policy
/// that lets CloudTrail deliver to it.
fn create_log_bucket(
    stack: &mut Stack,
    id: &str,
    s3_key_prefix: Option<&str>,
) -> Result<(CfnBucket, CfnBucketPolicy), SynthError> {
    let bucket = CfnBucket::new(
        stack,
        &format!("{id}/S3/Resource"),
        CfnBucketProps {
            bucket_name: None,
            bucket_encryption: Some(BucketEncryption::s3_managed()),
            public_access_block_configuration: Some(PublicAccessBlockConfiguration::block_all()),
            tags: None,
        },
    )?;
    let bucket_ref = bucket.as_bucket_ref();
    let prefix = s3_key_prefix
        .map(|prefix| format!("{prefix}/"))
        .unwrap_or_default();
    let log_objects = bucket_ref.arn_for_objects(concat(vec![
        format!("{prefix}AWSLogs/").into(),
        Pseudo::AccountId.token(),
        "/*".into(),
    ]));

    let document = PolicyDocument::new(vec![
        PolicyStatement::deny()
            .principal(Principal::Any)
            .action("s3:*")
            .resource(bucket_ref.bucket_arn.clone())
            .resource(bucket_ref.arn_for_objects("*"))
            .condition(json!({"Bool": {"aws:SecureTransport": "false"}})),
        PolicyStatement::allow()
            .principal(Principal::service(CLOUDTRAIL_SERVICE))
            .action("s3:GetBucketAcl")
            .resource(bucket_ref.bucket_arn.clone()),
        PolicyStatement::allow()
            .principal(Principal::service(CLOUDTRAIL_SERVICE))
            .action("s3:PutObject")
            .resource(log_objects)
            .condition(json!({"StringEquals": {"s3:x-amz-acl": "bucket-owner-full-control"}})),
    ]);
    let policy = CfnBucketPolicy::new(
        stack,
        &format!("{id}/S3/Policy/Resource"),
        CfnBucketPolicyProps {
            bucket: bucket_ref.bucket_name,
            policy_document: document,
        },
    )?;
    Ok((bucket, policy))
}

/// Role CloudTrail assumes to write to `group`, with its inline policy.
fn create_logs_role(
    stack: &mut Stack,
    id: &str,
    group: &LogGroupRef,
) -> Result<(CfnRole, CfnPolicy), SynthError> {
    let role = CfnRole::new(
        stack,
        &format!("{id}/LogsRole/Resource"),
        CfnRoleProps {
            assume_role_policy_document: PolicyDocument::assumed_by_service(CLOUDTRAIL_SERVICE),
            description: None,
            role_name: None,
        },
    )?;
    let policy_path = format!("{id}/LogsRole/DefaultPolicy/Resource");
    let policy_name = stack.unique_name(&policy_path, 128);
    let policy = CfnPolicy::new(
        stack,
        &policy_path,
        CfnPolicyProps {
            policy_name: policy_name.into(),
            policy_document: PolicyDocument::new(vec![PolicyStatement::allow()
                .action("logs:PutLogEvents")
                .action("logs:CreateLogStream")
                .resource(group.log_group_arn.clone())]),
            roles: Some(vec![role.reference()]),
        },
    )?;
    Ok((role, policy))
}
