//! Amazon EventBridge constructs: rules, buses, archives, connections and
//! API destinations, plus the L1 resources they render to.

pub mod bus;
pub mod connection;
pub mod input;
pub mod model;
pub mod pattern;
pub mod rule;
pub mod schedule;
pub mod target;

pub use bus::{Archive, ArchiveProps, BaseArchiveProps, EventBus, EventBusError, EventBusProps, EventBusRef};
pub use connection::{
    ApiDestination, ApiDestinationProps, Authorization, Connection, ConnectionProps,
    ConnectionRef, HttpMethod, HttpParameter, HttpParameters, OAuthAuthorization, SecretValue,
};
pub use input::RuleTargetInput;
pub use model::{
    CfnApiDestination, CfnArchive, CfnConnection, CfnEventBus, CfnEventBusPolicy, CfnRule,
};
pub use pattern::{EventPattern, PatternError};
pub use rule::{Rule, RuleError, RuleProps};
pub use schedule::{CronOptions, Schedule, ScheduleError};
pub use target::{ApiDestinationTarget, ArnTarget, BindContext, RuleTarget, RuleTargetConfig};
