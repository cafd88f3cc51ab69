//! Rules: route matching or scheduled events to targets.

use crate::bus::EventBusRef;
use crate::model::{CfnRule, CfnRuleProps, TargetProperty};
use crate::pattern::{EventPattern, PatternError};
use crate::schedule::Schedule;
use crate::target::{BindContext, RuleTarget};
use cfnsynth_core::{CfnString, Construct, Stack, SynthError, Template, ValidationError};
use thiserror::Error;
use tracing::debug;

/// Targets a single rule may have.
pub const MAX_TARGETS: usize = 5;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("cannot associate rule with 'event_bus' when using 'schedule'")]
    ScheduleOnCustomBus,
    #[error("a rule supports at most 5 targets")]
    TooManyTargets,
    #[error("duplicate event rule target with id '{0}'")]
    DuplicateTargetId(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Synth(#[from] SynthError),
}

#[derive(Default)]
pub struct RuleProps {
    pub description: Option<String>,
    /// Defaults to enabled.
    pub enabled: Option<bool>,
    /// Bus the rule listens on; the account's default bus when unset.
    pub event_bus: Option<EventBusRef>,
    pub event_pattern: Option<EventPattern>,
    pub rule_name: Option<String>,
    pub schedule: Option<Schedule>,
    pub targets: Vec<Box<dyn RuleTarget>>,
}

/// An EventBridge rule.
pub struct Rule {
    path: String,
    resource: CfnRule,
    event_pattern: EventPattern,
    targets: Vec<TargetProperty>,
    children: Vec<Box<dyn Construct>>,
}

impl Rule {
    pub fn new(stack: &mut Stack, id: &str, props: RuleProps) -> Result<Self, RuleError> {
        if props.event_bus.is_some() && props.schedule.is_some() {
            return Err(RuleError::ScheduleOnCustomBus);
        }
        let state = if props.enabled.unwrap_or(true) {
            "ENABLED"
        } else {
            "DISABLED"
        };
        let resource = CfnRule::new(
            stack,
            &format!("{id}/Resource"),
            CfnRuleProps {
                description: props.description.map(Into::into),
                event_bus_name: props.event_bus.map(|bus| bus.event_bus_name),
                name: props.rule_name.map(Into::into),
                schedule_expression: props
                    .schedule
                    .map(|schedule| schedule.expression_string().into()),
                state: Some(state.into()),
                ..CfnRuleProps::default()
            },
        )?;
        let mut rule = Self {
            path: id.to_string(),
            resource,
            event_pattern: EventPattern::default(),
            targets: Vec::new(),
            children: Vec::new(),
        };
        if let Some(pattern) = &props.event_pattern {
            rule.add_event_pattern(pattern)?;
        }
        for target in &props.targets {
            rule.add_target(stack, target.as_ref())?;
        }
        debug!(id, logical_id = rule.resource.logical_id(), "created rule");
        Ok(rule)
    }

    /// Adds a target with the next free id (`Target0`, `Target1`, ...).
    pub fn add_target(&mut self, stack: &mut Stack, target: &dyn RuleTarget) -> Result<(), RuleError> {
        let id = format!("Target{}", self.targets.len());
        self.add_target_with_id(stack, &id, target)
    }

    pub fn add_target_with_id(
        &mut self,
        stack: &mut Stack,
        id: &str,
        target: &dyn RuleTarget,
    ) -> Result<(), RuleError> {
        if self.targets.len() >= MAX_TARGETS {
            return Err(RuleError::TooManyTargets);
        }
        if self.targets.iter().any(|t| t.id == id) {
            return Err(RuleError::DuplicateTargetId(id.to_string()));
        }
        let path = self.path.clone();
        let mut ctx = BindContext::new(stack, &path, id);
        let config = target.bind(&mut ctx)?;
        self.children.extend(ctx.into_children());
        self.targets.push(config.to_target_property(id));
        self.resource.props_mut().targets = Some(self.targets.clone());
        debug!(rule = %self.path, target = id, "added rule target");
        Ok(())
    }

    /// Merges `pattern` into the rule's pattern; lists are appended and
    /// `detail` is merged key-wise.
    pub fn add_event_pattern(&mut self, pattern: &EventPattern) -> Result<(), RuleError> {
        self.event_pattern.merge(pattern)?;
        self.resource.props_mut().event_pattern = self.event_pattern.render();
        Ok(())
    }

    pub fn event_pattern(&self) -> &EventPattern {
        &self.event_pattern
    }

    pub fn targets(&self) -> &[TargetProperty] {
        &self.targets
    }

    pub fn rule_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn rule_name(&self) -> CfnString {
        self.resource.reference()
    }

    pub fn resource(&self) -> &CfnRule {
        &self.resource
    }
}

impl Construct for Rule {
    fn path(&self) -> &str {
        &self.path
    }

    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.resource.validate();
        if self.event_pattern.is_empty() && self.resource.props().schedule_expression.is_none() {
            errors.push(ValidationError::new(
                self.path.clone(),
                "either 'event_pattern' or 'schedule' must be defined",
            ));
        }
        for child in &self.children {
            errors.extend(child.validate());
        }
        errors
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        self.resource.synthesize(template)?;
        for child in &self.children {
            child.synthesize(template)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::input::RuleTargetInput;
    use crate::target::ArnTarget;
    use serde_json::json;
    use std::time::Duration;

    fn render(rule: &Rule) -> serde_json::Value {
        let mut template = Template::default();
        rule.synthesize(&mut template).expect("synth");
        template
            .resource(rule.resource().logical_id())
            .expect("node")
            .properties
            .clone()
    }

    #[test]
    fn added_patterns_concatenate_lists() {
        let mut stack = Stack::new("Demo");
        let mut rule = Rule::new(
            &mut stack,
            "Rule",
            RuleProps {
                event_pattern: Some(EventPattern::new().source(["a"])),
                ..RuleProps::default()
            },
        )
        .expect("rule");
        rule.add_event_pattern(&EventPattern::new().source(["b"]))
            .expect("merge");
        assert_eq!(render(&rule)["EventPattern"], json!({"source": ["a", "b"]}));
    }

    #[test]
    fn added_patterns_merge_detail() {
        let mut stack = Stack::new("Demo");
        let mut rule = Rule::new(&mut stack, "Rule", RuleProps::default()).expect("rule");
        rule.add_event_pattern(&EventPattern::new().detail(json!({"hello": [1]})).expect("detail"))
            .expect("merge");
        rule.add_event_pattern(&EventPattern::new().detail(json!({"foo": ["bar"]})).expect("detail"))
            .expect("merge");
        assert_eq!(
            render(&rule)["EventPattern"],
            json!({"detail": {"hello": [1], "foo": ["bar"]}})
        );
    }

    #[test]
    fn failed_pattern_merge_leaves_rule_unchanged() {
        let mut stack = Stack::new("Demo");
        let mut rule = Rule::new(&mut stack, "Rule", RuleProps::default()).expect("rule");
        rule.add_event_pattern(&EventPattern::new().detail(json!({"state": ["on"]})).expect("detail"))
            .expect("merge");

        let conflicting = EventPattern::new()
            .source(["x"])
            .detail(json!({"state": {"prefix": "o"}}))
            .expect("detail");
        assert!(rule.add_event_pattern(&conflicting).is_err());
        assert_eq!(rule.event_pattern().source, None);

        rule.add_event_pattern(&EventPattern::new().source(["y"]))
            .expect("merge");
        assert_eq!(
            render(&rule)["EventPattern"],
            json!({"source": ["y"], "detail": {"state": ["on"]}})
        );
    }

    #[test]
    fn scheduled_rule_with_targets() {
        let mut stack = Stack::new("Demo");
        let mut rule = Rule::new(
            &mut stack,
            "Nightly",
            RuleProps {
                schedule: Some(Schedule::rate(Duration::from_secs(3600)).expect("rate")),
                enabled: Some(false),
                ..RuleProps::default()
            },
        )
        .expect("rule");
        rule.add_target(
            &mut stack,
            &ArnTarget::new("arn:aws:sqs:us-east-1:1:a").with_input(RuleTargetInput::from_text("x")),
        )
        .expect("target");
        rule.add_target(&mut stack, &ArnTarget::new("arn:aws:sqs:us-east-1:1:b"))
            .expect("target");

        let props = render(&rule);
        assert_eq!(props["ScheduleExpression"], json!("rate(1 hour)"));
        assert_eq!(props["State"], json!("DISABLED"));
        assert_eq!(props["Targets"][0]["Id"], json!("Target0"));
        assert_eq!(props["Targets"][1]["Id"], json!("Target1"));
        assert!(props.get("EventPattern").is_none());
        assert!(rule.validate().is_empty());
    }

    #[test]
    fn target_limit_and_duplicate_ids() {
        let mut stack = Stack::new("Demo");
        let mut rule = Rule::new(
            &mut stack,
            "Rule",
            RuleProps {
                event_pattern: Some(EventPattern::new().source(["a"])),
                ..RuleProps::default()
            },
        )
        .expect("rule");
        let target = ArnTarget::new("arn:aws:sns:us-east-1:1:t");
        rule.add_target_with_id(&mut stack, "Alerts", &target)
            .expect("target");
        assert!(matches!(
            rule.add_target_with_id(&mut stack, "Alerts", &target),
            Err(RuleError::DuplicateTargetId(_))
        ));
        for _ in 0..4 {
            rule.add_target(&mut stack, &target).expect("target");
        }
        assert!(matches!(
            rule.add_target(&mut stack, &target),
            Err(RuleError::TooManyTargets)
        ));
    }

    #[test]
    fn schedule_on_custom_bus_is_rejected() {
        let mut stack = Stack::new("Demo");
        let result = Rule::new(
            &mut stack,
            "Rule",
            RuleProps {
                event_bus: Some(EventBus::from_event_bus_name("orders")),
                schedule: Some(Schedule::expression("rate(5 minutes)")),
                ..RuleProps::default()
            },
        );
        assert!(matches!(result, Err(RuleError::ScheduleOnCustomBus)));
    }

    #[test]
    fn rule_without_pattern_or_schedule_is_invalid() {
        let mut stack = Stack::new("Demo");
        let rule = Rule::new(
            &mut stack,
            "Rule",
            RuleProps {
                rule_name: Some("bad name".into()),
                ..RuleProps::default()
            },
        )
        .expect("rule");
        let errors = rule.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| e.message.contains("'event_pattern' or 'schedule'")));
    }
}
