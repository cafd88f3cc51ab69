//! Custom event buses and archives.

use crate::model::{CfnArchive, CfnArchiveProps, CfnEventBus, CfnEventBusProps};
use crate::pattern::EventPattern;
use cfnsynth_core::validation::is_name_char;
use cfnsynth_core::{
    CfnString, Construct, Intrinsic, Stack, SynthError, Template, ValidationError,
};
use thiserror::Error;
use tracing::debug;

const MAX_BUS_NAME_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("'event_bus_name' and 'event_source_name' cannot both be provided")]
    NameAndSource,
    #[error("'event_bus_name' must not be 'default'")]
    DefaultName,
    #[error("'event_bus_name' must not contain '/'")]
    NameContainsSlash,
    #[error("'{0}' must be 1-256 characters of [/.-_A-Za-z0-9]")]
    InvalidName(String),
    #[error("'event_source_name' must match aws.partner/<name>/<name>..., got '{0}'")]
    InvalidSourceName(String),
    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Reference to an event bus: one defined in this stack, an imported one,
/// or the account's default bus.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBusRef {
    pub event_bus_name: CfnString,
    pub event_bus_arn: CfnString,
    pub event_source_name: Option<CfnString>,
}

impl EventBusRef {
    pub fn from_event_bus_name(name: &str) -> Self {
        Self {
            event_bus_name: name.into(),
            event_bus_arn: Intrinsic::sub(format!(
                "arn:${{AWS::Partition}}:events:${{AWS::Region}}:${{AWS::AccountId}}:event-bus/{name}"
            ))
            .into(),
            event_source_name: None,
        }
    }

    /// Imports a bus by literal ARN; the name is the part after `event-bus/`.
    pub fn from_event_bus_arn(arn: &str) -> Self {
        let name = arn
            .split_once(":event-bus/")
            .map(|(_, name)| name)
            .unwrap_or(arn);
        Self {
            event_bus_name: name.into(),
            event_bus_arn: arn.into(),
            event_source_name: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBusProps {
    /// Physical name; generated from the construct path when unset.
    pub event_bus_name: Option<String>,
    /// Partner event source this bus receives from.
    pub event_source_name: Option<String>,
}

/// A custom event bus.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBus {
    resource: CfnEventBus,
    event_source_name: Option<String>,
}

impl EventBus {
    pub fn new(stack: &mut Stack, id: &str, props: EventBusProps) -> Result<Self, EventBusError> {
        let path = format!("{id}/Resource");
        let (name, event_source_name) = match (props.event_bus_name, props.event_source_name) {
            (Some(_), Some(_)) => return Err(EventBusError::NameAndSource),
            (Some(name), None) => {
                check_bus_name(&name)?;
                (name, None)
            }
            (None, Some(source)) => {
                check_source_name(&source)?;
                (source.clone(), Some(source))
            }
            (None, None) => (stack.unique_name(id, MAX_BUS_NAME_LEN), None),
        };
        let resource = CfnEventBus::new(
            stack,
            &path,
            CfnEventBusProps {
                name: name.as_str().into(),
                event_source_name: event_source_name.as_deref().map(Into::into),
                tags: None,
            },
        )?;
        debug!(id, name = %name, "created event bus");
        Ok(Self {
            resource,
            event_source_name,
        })
    }

    pub fn from_event_bus_name(name: &str) -> EventBusRef {
        EventBusRef::from_event_bus_name(name)
    }

    pub fn from_event_bus_arn(arn: &str) -> EventBusRef {
        EventBusRef::from_event_bus_arn(arn)
    }

    pub fn event_bus_name(&self) -> CfnString {
        self.resource.reference()
    }

    pub fn event_bus_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn event_bus_policy(&self) -> CfnString {
        self.resource.attr_policy()
    }

    pub fn event_bus_ref(&self) -> EventBusRef {
        EventBusRef {
            event_bus_name: self.event_bus_name(),
            event_bus_arn: self.event_bus_arn(),
            event_source_name: self.event_source_name.as_deref().map(Into::into),
        }
    }

    /// Archives events sent to this bus that match `props.event_pattern`.
    pub fn archive(
        &self,
        stack: &mut Stack,
        id: &str,
        props: BaseArchiveProps,
    ) -> Result<Archive, SynthError> {
        Archive::new(
            stack,
            id,
            ArchiveProps {
                source_event_bus: self.event_bus_ref(),
                base: props,
            },
        )
    }

    pub fn resource(&self) -> &CfnEventBus {
        &self.resource
    }
}

impl Construct for EventBus {
    fn path(&self) -> &str {
        self.resource.path()
    }

    fn validate(&self) -> Vec<ValidationError> {
        self.resource.validate()
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        self.resource.synthesize(template)
    }
}

fn is_bus_name(name: &str) -> bool {
    (1..=MAX_BUS_NAME_LEN).contains(&name.len())
        && name.chars().all(|c| c == '/' || is_name_char(c))
}

fn check_bus_name(name: &str) -> Result<(), EventBusError> {
    if name == "default" {
        return Err(EventBusError::DefaultName);
    }
    if name.contains('/') {
        return Err(EventBusError::NameContainsSlash);
    }
    if !is_bus_name(name) {
        return Err(EventBusError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// `aws.partner` followed by at least two non-empty `/`-separated segments.
fn check_source_name(source: &str) -> Result<(), EventBusError> {
    let valid = source
        .strip_prefix("aws.partner/")
        .map(|rest| {
            let segments: Vec<&str> = rest.split('/').collect();
            segments.len() >= 2
                && segments
                    .iter()
                    .all(|s| !s.is_empty() && s.chars().all(is_name_char))
        })
        .unwrap_or(false);
    if !valid {
        return Err(EventBusError::InvalidSourceName(source.to_string()));
    }
    if !is_bus_name(source) {
        return Err(EventBusError::InvalidName(source.to_string()));
    }
    Ok(())
}

/// Archive settings shared by [`EventBus::archive`] and [`Archive::new`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseArchiveProps {
    pub event_pattern: EventPattern,
    pub archive_name: Option<String>,
    pub description: Option<String>,
    /// Days to keep events; kept indefinitely when unset.
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveProps {
    pub source_event_bus: EventBusRef,
    pub base: BaseArchiveProps,
}

/// An archive of events from a bus, available for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    resource: CfnArchive,
}

impl Archive {
    pub fn new(stack: &mut Stack, id: &str, props: ArchiveProps) -> Result<Self, SynthError> {
        let base = props.base;
        let resource = CfnArchive::new(
            stack,
            &format!("{id}/Resource"),
            CfnArchiveProps {
                source_arn: props.source_event_bus.event_bus_arn,
                archive_name: base.archive_name.map(Into::into),
                description: base.description.map(Into::into),
                event_pattern: base.event_pattern.render(),
                retention_days: Some(base.retention_days.unwrap_or(0)),
            },
        )?;
        Ok(Self { resource })
    }

    pub fn archive_name(&self) -> CfnString {
        self.resource.reference()
    }

    pub fn archive_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn resource(&self) -> &CfnArchive {
        &self.resource
    }
}

impl Construct for Archive {
    fn path(&self) -> &str {
        self.resource.path()
    }

    fn validate(&self) -> Vec<ValidationError> {
        self.resource.validate()
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        self.resource.synthesize(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bus(props: EventBusProps) -> Result<EventBus, EventBusError> {
        let mut stack = Stack::new("Demo");
        EventBus::new(&mut stack, "Bus", props)
    }

    #[test]
    fn generated_name_is_unique_per_stack() {
        let bus = bus(EventBusProps::default()).expect("bus");
        let name = bus.resource().props().name.as_str().expect("literal").to_string();
        assert!(name.starts_with("DemoBus"));
        assert_eq!(name.len(), "DemoBus".len() + 8);
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(matches!(
            bus(EventBusProps {
                event_bus_name: Some("default".into()),
                event_source_name: None,
            }),
            Err(EventBusError::DefaultName)
        ));
        assert!(matches!(
            bus(EventBusProps {
                event_bus_name: Some("a/b".into()),
                event_source_name: None,
            }),
            Err(EventBusError::NameContainsSlash)
        ));
        assert!(matches!(
            bus(EventBusProps {
                event_bus_name: Some("a".into()),
                event_source_name: Some("aws.partner/x/y".into()),
            }),
            Err(EventBusError::NameAndSource)
        ));
        assert!(matches!(
            bus(EventBusProps {
                event_bus_name: None,
                event_source_name: Some("aws.partner/only".into()),
            }),
            Err(EventBusError::InvalidSourceName(_))
        ));
    }

    #[test]
    fn partner_source_names_the_bus() {
        let bus = bus(EventBusProps {
            event_bus_name: None,
            event_source_name: Some("aws.partner/acme.com/123/orders".into()),
        })
        .expect("bus");
        let props = bus.resource().props();
        assert_eq!(props.name, "aws.partner/acme.com/123/orders");
        assert_eq!(
            props.event_source_name,
            Some(CfnString::from("aws.partner/acme.com/123/orders"))
        );
    }

    #[test]
    fn archive_targets_bus_arn_and_defaults_retention() {
        let mut stack = Stack::new("Demo");
        let bus = EventBus::new(
            &mut stack,
            "Bus",
            EventBusProps {
                event_bus_name: Some("orders".into()),
                event_source_name: None,
            },
        )
        .expect("bus");
        let archive = bus
            .archive(
                &mut stack,
                "Archive",
                BaseArchiveProps {
                    event_pattern: EventPattern::new().source(["shop.orders"]),
                    ..BaseArchiveProps::default()
                },
            )
            .expect("archive");

        let mut template = Template::default();
        archive.synthesize(&mut template).expect("synth");
        let node = template
            .resource(archive.resource().logical_id())
            .expect("node");
        assert_eq!(
            node.properties,
            json!({
                "SourceArn": {"Fn::GetAtt": [bus.resource().logical_id(), "Arn"]},
                "EventPattern": {"source": ["shop.orders"]},
                "RetentionDays": 0
            })
        );
    }

    #[test]
    fn imported_bus_name_comes_from_arn() {
        let bus = EventBus::from_event_bus_arn("arn:aws:events:us-east-1:1:event-bus/orders");
        assert_eq!(bus.event_bus_name, "orders");
    }
}
