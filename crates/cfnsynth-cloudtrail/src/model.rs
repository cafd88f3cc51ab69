//! `AWS::CloudTrail::Trail` property structs and value enums.

use cfnsynth_core::cfn_resource;
use cfnsynth_core::{CfnProperties, CfnString, CfnTag, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Event selectors a trail may have.
pub const MAX_EVENT_SELECTORS: usize = 5;
/// Data resource values across all selectors of a trail.
pub const MAX_DATA_RESOURCE_VALUES: usize = 250;

/// Properties of `AWS::CloudTrail::Trail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTrailProps {
    pub is_logging: bool,
    pub s3_bucket_name: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_watch_logs_log_group_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_watch_logs_role_arn: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_log_file_validation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_selectors: Option<Vec<EventSelectorProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_global_service_events: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_selectors: Option<Vec<InsightSelectorProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multi_region_trail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_organization_trail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_key_prefix: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sns_topic_name: Option<CfnString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CfnTag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail_name: Option<CfnString>,
}

impl CfnTrailProps {
    /// Props with only the required fields set.
    pub fn new(is_logging: bool, s3_bucket_name: impl Into<CfnString>) -> Self {
        Self {
            is_logging,
            s3_bucket_name: s3_bucket_name.into(),
            cloud_watch_logs_log_group_arn: None,
            cloud_watch_logs_role_arn: None,
            enable_log_file_validation: None,
            event_selectors: None,
            include_global_service_events: None,
            insight_selectors: None,
            is_multi_region_trail: None,
            is_organization_trail: None,
            kms_key_id: None,
            s3_key_prefix: None,
            sns_topic_name: None,
            tags: None,
            trail_name: None,
        }
    }
}

impl CfnProperties for CfnTrailProps {
    const RESOURCE_TYPE: &'static str = "AWS::CloudTrail::Trail";

    fn validate(&self, validator: &mut Validator) {
        if let Some(name) = self.trail_name.as_ref().and_then(CfnString::as_str) {
            validate_trail_name(validator, name);
        }
        validator.max_length("S3KeyPrefix", self.s3_key_prefix.as_ref(), 200);
        validator.max_length("SnsTopicName", self.sns_topic_name.as_ref(), 256);
        validator.ensure(
            self.cloud_watch_logs_role_arn.is_none() || self.cloud_watch_logs_log_group_arn.is_some(),
            || "CloudWatchLogsRoleArn requires CloudWatchLogsLogGroupArn".to_string(),
        );
        if let Some(selectors) = &self.event_selectors {
            validator.max_items("EventSelectors", selectors.len(), MAX_EVENT_SELECTORS);
            let values: usize = selectors.iter().map(EventSelectorProperty::value_count).sum();
            validator.ensure(values <= MAX_DATA_RESOURCE_VALUES, || {
                format!(
                    "a trail supports at most {MAX_DATA_RESOURCE_VALUES} data resource values across all event selectors, got {values}"
                )
            });
            for selector in selectors {
                validator.one_of(
                    "ReadWriteType",
                    selector.read_write_type.as_ref().and_then(CfnString::as_str),
                    &["ReadOnly", "WriteOnly", "All"],
                );
            }
        }
        if let Some(insights) = &self.insight_selectors {
            for insight in insights {
                validator.one_of(
                    "InsightType",
                    insight.insight_type.as_ref().and_then(CfnString::as_str),
                    &["ApiCallRateInsight", "ApiErrorRateInsight"],
                );
            }
        }
    }
}

/// Trail naming rules: 3-128 characters of `[A-Za-z0-9._-]`, alphanumeric at
/// both ends, no adjacent punctuation and not an IPv4 address.
fn validate_trail_name(validator: &mut Validator, name: &str) {
    let len = name.chars().count();
    if !(3..=128).contains(&len) {
        validator.error(format!(
            "TrailName must be between 3 and 128 characters, got {len}"
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        validator.error(format!("TrailName '{name}' contains '{bad}'"));
    }
    let alnum_ends = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    validator.ensure(alnum_ends, || {
        format!("TrailName '{name}' must start and end with a letter or number")
    });
    let is_punct = |c: char| matches!(c, '.' | '_' | '-');
    let adjacent = name
        .chars()
        .zip(name.chars().skip(1))
        .any(|(a, b)| is_punct(a) && is_punct(b));
    validator.ensure(!adjacent, || {
        format!("TrailName '{name}' must not contain adjacent periods, underscores or dashes")
    });
    validator.ensure(name.parse::<Ipv4Addr>().is_err(), || {
        format!("TrailName '{name}' must not be formatted as an IP address")
    });
}

cfn_resource!(
    /// `AWS::CloudTrail::Trail`.
    CfnTrail,
    CfnTrailProps
);

impl CfnTrail {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn attr_sns_topic_arn(&self) -> CfnString {
        self.get_att("SnsTopicArn")
    }
}

/// Which management and data events a trail logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSelectorProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_resources: Option<Vec<DataResourceProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_management_event_sources: Option<Vec<CfnString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_management_events: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_write_type: Option<CfnString>,
}

impl EventSelectorProperty {
    fn value_count(&self) -> usize {
        self.data_resources
            .iter()
            .flatten()
            .map(|resource| resource.values.as_ref().map_or(0, Vec::len))
            .sum()
    }
}

/// Resources whose data events are logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataResourceProperty {
    #[serde(rename = "Type")]
    pub data_resource_type: CfnString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<CfnString>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InsightSelectorProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_type: Option<CfnString>,
}

/// Types of events a trail can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadWriteType {
    ReadOnly,
    WriteOnly,
    All,
    None,
}

impl ReadWriteType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadWriteType::ReadOnly => "ReadOnly",
            ReadWriteType::WriteOnly => "WriteOnly",
            ReadWriteType::All => "All",
            ReadWriteType::None => "None",
        }
    }
}

/// Resource type of a data event selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataResourceType {
    #[serde(rename = "AWS::Lambda::Function")]
    LambdaFunction,
    #[serde(rename = "AWS::S3::Object")]
    S3Object,
}

impl DataResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataResourceType::LambdaFunction => "AWS::Lambda::Function",
            DataResourceType::S3Object => "AWS::S3::Object",
        }
    }
}

/// Management event sources that can be excluded from a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementEventSources {
    #[serde(rename = "kms.amazonaws.com")]
    Kms,
    #[serde(rename = "rdsdata.amazonaws.com")]
    RdsDataApi,
}

impl ManagementEventSources {
    pub fn as_str(self) -> &'static str {
        match self {
            ManagementEventSources::Kms => "kms.amazonaws.com",
            ManagementEventSources::RdsDataApi => "rdsdata.amazonaws.com",
        }
    }
}

/// CloudTrail Insights event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightType {
    ApiCallRateInsight,
    ApiErrorRateInsight,
}

impl InsightType {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightType::ApiCallRateInsight => "ApiCallRateInsight",
            InsightType::ApiErrorRateInsight => "ApiErrorRateInsight",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(ReadWriteType, DataResourceType, ManagementEventSources, InsightType);

/// Lower-cases and drops `_`, `-` and spaces so `READ_ONLY`, `read-only`
/// and `ReadOnly` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ReadWriteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "readonly" => Ok(ReadWriteType::ReadOnly),
            "writeonly" => Ok(ReadWriteType::WriteOnly),
            "all" => Ok(ReadWriteType::All),
            "none" => Ok(ReadWriteType::None),
            _ => Err(format!("unknown read/write type '{s}'")),
        }
    }
}

impl FromStr for ManagementEventSources {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "kms" | "kms.amazonaws.com" => Ok(ManagementEventSources::Kms),
            "rdsdataapi" | "rdsdata" | "rdsdata.amazonaws.com" => {
                Ok(ManagementEventSources::RdsDataApi)
            }
            _ => Err(format!("unknown management event source '{s}'")),
        }
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "apicallrateinsight" | "apicallrate" => Ok(InsightType::ApiCallRateInsight),
            "apierrorrateinsight" | "apierrorrate" => Ok(InsightType::ApiErrorRateInsight),
            _ => Err(format!("unknown insight type '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnsynth_core::{Construct, Intrinsic, Stack};
    use serde_json::json;

    fn errors_for(props: CfnTrailProps) -> Vec<String> {
        let mut stack = Stack::new("Demo");
        let trail = CfnTrail::new(&mut stack, "Trail", props).expect("trail");
        trail.validate().into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn required_fields_read_back_and_optionals_are_absent() {
        let props = CfnTrailProps::new(true, "audit-logs");
        assert!(props.is_logging);
        assert_eq!(props.s3_bucket_name, "audit-logs");
        assert_eq!(props.trail_name, None);
        assert_eq!(props.event_selectors, None);
        assert_eq!(
            serde_json::to_value(&props).expect("json"),
            json!({"IsLogging": true, "S3BucketName": "audit-logs"})
        );
    }

    #[test]
    fn equality_tracks_every_field() {
        let a = CfnTrailProps::new(true, "audit-logs");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.s3_key_prefix = Some("org".into());
        assert_ne!(a, b);
    }

    #[test]
    fn data_resource_renders_type_key() {
        let resource = DataResourceProperty {
            data_resource_type: DataResourceType::S3Object.as_str().into(),
            values: Some(vec!["arn:aws:s3:::bucket/".into()]),
        };
        assert_eq!(
            serde_json::to_value(&resource).expect("json"),
            json!({"Type": "AWS::S3::Object", "Values": ["arn:aws:s3:::bucket/"]})
        );
    }

    #[test]
    fn trail_name_rules() {
        let named = |name: &str| {
            let mut props = CfnTrailProps::new(true, "b");
            props.trail_name = Some(name.into());
            errors_for(props)
        };
        assert!(named("audit.trail-1").is_empty());
        assert_eq!(named("ab").len(), 1);
        assert_eq!(named("my--trail").len(), 1);
        assert_eq!(named("my-_trail").len(), 1);
        assert_eq!(named("-trail").len(), 1);
        assert_eq!(named("192.168.5.4").len(), 1);
        assert_eq!(named("has space").len(), 1);
    }

    #[test]
    fn token_trail_name_is_not_checked() {
        let mut props = CfnTrailProps::new(true, "b");
        props.trail_name = Some(Intrinsic::reference("Name").into());
        assert!(errors_for(props).is_empty());
    }

    #[test]
    fn role_without_log_group_is_rejected() {
        let mut props = CfnTrailProps::new(true, "b");
        props.cloud_watch_logs_role_arn = Some("arn:aws:iam::1:role/logs".into());
        let errors = errors_for(props);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("CloudWatchLogsLogGroupArn"));
    }

    #[test]
    fn total_data_values_are_limited() {
        let selector = |n: usize| EventSelectorProperty {
            data_resources: Some(vec![DataResourceProperty {
                data_resource_type: "AWS::S3::Object".into(),
                values: Some((0..n).map(|i| format!("arn:aws:s3:::b{i}/").into()).collect()),
            }]),
            ..EventSelectorProperty::default()
        };
        let mut props = CfnTrailProps::new(true, "b");
        props.event_selectors = Some(vec![selector(200), selector(51)]);
        let errors = errors_for(props);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("251"));
    }

    #[test]
    fn enums_parse_from_config_spellings() {
        assert_eq!("READ_ONLY".parse::<ReadWriteType>(), Ok(ReadWriteType::ReadOnly));
        assert_eq!("WriteOnly".parse::<ReadWriteType>(), Ok(ReadWriteType::WriteOnly));
        assert_eq!(
            "kms.amazonaws.com".parse::<ManagementEventSources>(),
            Ok(ManagementEventSources::Kms)
        );
        assert_eq!(
            "api_error_rate_insight".parse::<InsightType>(),
            Ok(InsightType::ApiErrorRateInsight)
        );
        assert!("sometimes".parse::<ReadWriteType>().is_err());
    }
}
