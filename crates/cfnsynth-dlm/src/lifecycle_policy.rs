//! `AWS::DLM::LifecyclePolicy` and its nested property structs.

use cfnsynth_core::cfn_resource;
use cfnsynth_core::{CfnProperties, CfnString, CfnTag, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schedules one policy may define: one mandatory plus three optional.
pub const MAX_SCHEDULES: usize = 4;
/// Cross-region copy rules per schedule.
pub const MAX_CROSS_REGION_COPY_RULES: usize = 3;
/// Upper bound for retain and deprecate counts.
pub const MAX_COUNT: u32 = 1000;
/// Hours accepted by `CreateRule.Interval`.
pub const CREATE_INTERVALS: [u32; 8] = [1, 2, 3, 4, 6, 8, 12, 24];

const MAX_DESCRIPTION_LEN: usize = 500;

/// Properties of `AWS::DLM::LifecyclePolicy`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CfnLifecyclePolicyProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_details: Option<PolicyDetailsProperty>,
    /// `ENABLED` or `DISABLED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CfnTag>>,
}

impl CfnLifecyclePolicyProps {
    /// Reads props from a CloudFormation-shaped JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl CfnProperties for CfnLifecyclePolicyProps {
    const RESOURCE_TYPE: &'static str = "AWS::DLM::LifecyclePolicy";

    fn validate(&self, validator: &mut Validator) {
        validator.max_length("Description", self.description.as_ref(), MAX_DESCRIPTION_LEN);
        validator.charset(
            "Description",
            self.description.as_ref(),
            |c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'),
            "[0-9A-Za-z _-]",
        );
        validator.one_of(
            "State",
            self.state.as_ref().and_then(CfnString::as_str),
            &["ENABLED", "DISABLED"],
        );
        if let Some(details) = &self.policy_details {
            details.validate(validator);
        }
    }
}

cfn_resource!(
    /// `AWS::DLM::LifecyclePolicy`.
    CfnLifecyclePolicy,
    CfnLifecyclePolicyProps
);

impl CfnLifecyclePolicy {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }
}

/// What a policy manages and when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PolicyDetailsProperty {
    /// Event-based policies only; at most one action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<EventSourceProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParametersProperty>,
    /// `EBS_SNAPSHOT_MANAGEMENT`, `IMAGE_MANAGEMENT` or `EVENT_BASED_POLICY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_locations: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Vec<ScheduleProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tags: Option<Vec<CfnTag>>,
}

impl PolicyDetailsProperty {
    fn validate(&self, validator: &mut Validator) {
        validator.one_of(
            "PolicyType",
            self.policy_type.as_ref().and_then(CfnString::as_str),
            &["EBS_SNAPSHOT_MANAGEMENT", "IMAGE_MANAGEMENT", "EVENT_BASED_POLICY"],
        );
        if let Some(actions) = &self.actions {
            validator.max_items("Actions", actions.len(), 1);
        }
        if let Some(schedules) = &self.schedules {
            validator.max_items("Schedules", schedules.len(), MAX_SCHEDULES);
            for schedule in schedules {
                schedule.validate(validator);
            }
        }
    }
}

/// A schedule of snapshot or AMI creation, retention and copying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ScheduleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_rule: Option<CreateRuleProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_region_copy_rules: Option<Vec<CrossRegionCopyRuleProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecate_rule: Option<DeprecateRuleProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_restore_rule: Option<FastRestoreRuleProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_rule: Option<RetainRuleProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_rules: Option<Vec<ShareRuleProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_to_add: Option<Vec<CfnTag>>,
    /// Values must be `$(instance-id)` or `$(timestamp)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_tags: Option<Vec<CfnTag>>,
}

impl ScheduleProperty {
    fn validate(&self, validator: &mut Validator) {
        if let Some(create) = &self.create_rule {
            create.validate(validator);
        }
        if let Some(rules) = &self.cross_region_copy_rules {
            validator.max_items("CrossRegionCopyRules", rules.len(), MAX_CROSS_REGION_COPY_RULES);
            for rule in rules {
                validator.mutually_exclusive(
                    ("Target", rule.target.is_some()),
                    ("TargetRegion", rule.target_region.is_some()),
                );
            }
        }
        if let Some(count) = self.retain_rule.as_ref().and_then(|rule| rule.count) {
            check_count(validator, "RetainRule.Count", count);
        }
        if let Some(count) = self.deprecate_rule.as_ref().and_then(|rule| rule.count) {
            check_count(validator, "DeprecateRule.Count", count);
        }
    }
}

fn check_count(validator: &mut Validator, field: &str, count: u32) {
    validator.ensure((1..=MAX_COUNT).contains(&count), || {
        format!("{field} must be between 1 and {MAX_COUNT}, got {count}")
    });
}

/// When snapshots are taken: either a fixed interval or a cron expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CreateRuleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Only `HOURS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_unit: Option<CfnString>,
    /// `CLOUD` or `OUTPOST_LOCAL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CfnString>,
    /// Start time in UTC as `hh:mm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<CfnString>>,
}

impl CreateRuleProperty {
    fn validate(&self, validator: &mut Validator) {
        validator.mutually_exclusive(
            ("CronExpression", self.cron_expression.is_some()),
            ("Interval", self.interval.is_some()),
        );
        validator.one_of("CreateRule.Interval", self.interval, &CREATE_INTERVALS);
        validator.one_of(
            "CreateRule.IntervalUnit",
            self.interval_unit.as_ref().and_then(CfnString::as_str),
            &["HOURS"],
        );
        validator.one_of(
            "CreateRule.Location",
            self.location.as_ref().and_then(CfnString::as_str),
            &["CLOUD", "OUTPOST_LOCAL"],
        );
        if let Some(times) = &self.times {
            validator.max_items("CreateRule.Times", times.len(), 1);
        }
    }
}

/// Count- or age-based retention of created snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RetainRuleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_unit: Option<CfnString>,
}

/// AMI deprecation, by count or by age.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DeprecateRuleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_unit: Option<CfnString>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FastRestoreRuleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_unit: Option<CfnString>,
}

/// Accounts snapshots are shared with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ShareRuleProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_accounts: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unshare_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unshare_interval_unit: Option<CfnString>,
}

/// Copy of snapshots to another region or Outpost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CrossRegionCopyRuleProperty {
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmk_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecate_rule: Option<CrossRegionCopyDeprecateRuleProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_rule: Option<CrossRegionCopyRetainRuleProperty>,
    /// Region or Outpost ARN; replaces `target_region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_region: Option<CfnString>,
}

impl CrossRegionCopyRuleProperty {
    pub fn new(encrypted: bool) -> Self {
        Self {
            encrypted,
            cmk_arn: None,
            copy_tags: None,
            deprecate_rule: None,
            retain_rule: None,
            target: None,
            target_region: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CrossRegionCopyRetainRuleProperty {
    pub interval: u32,
    pub interval_unit: CfnString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CrossRegionCopyDeprecateRuleProperty {
    pub interval: u32,
    pub interval_unit: CfnString,
}

/// Action of an event-based policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ActionProperty {
    pub cross_region_copy: Vec<CrossRegionCopyActionProperty>,
    pub name: CfnString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CrossRegionCopyActionProperty {
    pub encryption_configuration: EncryptionConfigurationProperty,
    pub target: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_rule: Option<CrossRegionCopyRetainRuleProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EncryptionConfigurationProperty {
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmk_arn: Option<CfnString>,
}

/// Event that triggers an event-based policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EventSourceProperty {
    /// Only `MANAGED_CWE`.
    #[serde(rename = "Type")]
    pub source_type: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<EventParametersProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EventParametersProperty {
    pub event_type: CfnString,
    pub snapshot_owner: Vec<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_regex: Option<CfnString>,
}

/// Options for snapshot and AMI policies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ParametersProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_boot_volume: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_reboot: Option<bool>,
}
