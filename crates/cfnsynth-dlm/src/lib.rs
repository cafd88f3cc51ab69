//! Amazon Data Lifecycle Manager resources.

pub mod lifecycle_policy;

pub use lifecycle_policy::{
    ActionProperty, CfnLifecyclePolicy, CfnLifecyclePolicyProps, CreateRuleProperty,
    CrossRegionCopyActionProperty, CrossRegionCopyDeprecateRuleProperty,
    CrossRegionCopyRetainRuleProperty, CrossRegionCopyRuleProperty, DeprecateRuleProperty,
    EncryptionConfigurationProperty, EventParametersProperty, EventSourceProperty,
    FastRestoreRuleProperty, ParametersProperty, PolicyDetailsProperty, RetainRuleProperty,
    ScheduleProperty, ShareRuleProperty,
};
