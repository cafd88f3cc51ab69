//! CloudWatch Logs log groups.

use crate::cfn_resource;
use crate::resource::CfnProperties;
use crate::token::{CfnString, Intrinsic};
use serde::{Deserialize, Serialize};

/// Retention periods accepted by `AWS::Logs::LogGroup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDays {
    OneDay,
    ThreeDays,
    FiveDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    TwoMonths,
    ThreeMonths,
    FourMonths,
    FiveMonths,
    SixMonths,
    OneYear,
    ThirteenMonths,
    EighteenMonths,
    TwoYears,
    FiveYears,
    TenYears,
    Infinite,
}

impl RetentionDays {
    /// Days to retain, or `None` to keep logs forever.
    pub fn days(self) -> Option<u32> {
        let days = match self {
            RetentionDays::OneDay => 1,
            RetentionDays::ThreeDays => 3,
            RetentionDays::FiveDays => 5,
            RetentionDays::OneWeek => 7,
            RetentionDays::TwoWeeks => 14,
            RetentionDays::OneMonth => 30,
            RetentionDays::TwoMonths => 60,
            RetentionDays::ThreeMonths => 90,
            RetentionDays::FourMonths => 120,
            RetentionDays::FiveMonths => 150,
            RetentionDays::SixMonths => 180,
            RetentionDays::OneYear => 365,
            RetentionDays::ThirteenMonths => 400,
            RetentionDays::EighteenMonths => 545,
            RetentionDays::TwoYears => 731,
            RetentionDays::FiveYears => 1827,
            RetentionDays::TenYears => 3653,
            RetentionDays::Infinite => return None,
        };
        Some(days)
    }
}

impl Default for RetentionDays {
    fn default() -> Self {
        RetentionDays::OneYear
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnLogGroupProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name: Option<CfnString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<CfnString>,
}

impl CfnProperties for CfnLogGroupProps {
    const RESOURCE_TYPE: &'static str = "AWS::Logs::LogGroup";
}

cfn_resource!(
    /// `AWS::Logs::LogGroup`.
    CfnLogGroup,
    CfnLogGroupProps
);

impl CfnLogGroup {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn as_log_group_ref(&self) -> LogGroupRef {
        LogGroupRef {
            log_group_arn: self.attr_arn(),
            log_group_name: Some(self.reference()),
        }
    }
}

/// Reference to a log group.
#[derive(Debug, Clone, PartialEq)]
pub struct LogGroupRef {
    pub log_group_arn: CfnString,
    pub log_group_name: Option<CfnString>,
}

impl LogGroupRef {
    pub fn from_log_group_arn(arn: impl Into<CfnString>) -> Self {
        Self {
            log_group_arn: arn.into(),
            log_group_name: None,
        }
    }

    pub fn from_log_group_name(name: &str) -> Self {
        Self {
            log_group_arn: Intrinsic::sub(format!(
                "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:{name}:*"
            ))
            .into(),
            log_group_name: Some(name.into()),
        }
    }
}
