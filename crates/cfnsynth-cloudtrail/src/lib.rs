//! AWS CloudTrail constructs.
//!
//! [`Trail`] renders an `AWS::CloudTrail::Trail` together with the log
//! bucket, CloudWatch Logs delivery role and topic policy it depends on.

pub mod model;
pub mod trail;

pub use model::{
    CfnTrail, CfnTrailProps, DataResourceProperty, DataResourceType, EventSelectorProperty,
    InsightSelectorProperty, InsightType, ManagementEventSources, ReadWriteType,
};
pub use trail::{
    AddEventSelectorOptions, OnEventOptions, S3EventSelector, Trail, TrailError, TrailProps,
};
