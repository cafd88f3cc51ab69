use crate::model::{InputTransformerProperty, TargetProperty};
use cfnsynth_core::CfnString;
use serde_json::Value;
use std::collections::BTreeMap;

/// What a target receives instead of (or derived from) the matched event.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleTargetInput {
    /// Literal JSON text sent as `Input`.
    Literal(String),
    /// A JSONPath into the event sent as `InputPath`.
    EventPath(String),
    /// An input transformer template with its path bindings.
    Transform {
        template: String,
        paths: BTreeMap<String, String>,
    },
}

impl RuleTargetInput {
    /// Sends `text` as a JSON string.
    pub fn from_text(text: &str) -> Self {
        RuleTargetInput::Literal(json_string(text))
    }

    /// Sends every non-empty line of `text` as its own JSON string, one per line.
    pub fn from_multiline_text(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(json_string)
            .collect();
        RuleTargetInput::Literal(lines.join("\n"))
    }

    pub fn from_object(value: &Value) -> Self {
        RuleTargetInput::Literal(value.to_string())
    }

    /// Sends the part of the event selected by `path`, e.g. `$.detail`.
    pub fn from_event_path(path: impl Into<String>) -> Self {
        RuleTargetInput::EventPath(path.into())
    }

    /// Input transformer: `template` may reference `<name>` placeholders bound
    /// to JSONPaths in `paths`.
    pub fn from_transform<I, K, V>(template: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RuleTargetInput::Transform {
            template: template.into(),
            paths: paths
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Writes this input into the `Input`, `InputPath` or `InputTransformer` of a target.
    pub fn apply(&self, target: &mut TargetProperty) {
        match self {
            RuleTargetInput::Literal(text) => target.input = Some(text.as_str().into()),
            RuleTargetInput::EventPath(path) => target.input_path = Some(path.as_str().into()),
            RuleTargetInput::Transform { template, paths } => {
                let input_paths_map = if paths.is_empty() {
                    None
                } else {
                    Some(
                        paths
                            .iter()
                            .map(|(k, v)| (k.clone(), CfnString::from(v)))
                            .collect(),
                    )
                };
                target.input_transformer = Some(InputTransformerProperty {
                    input_template: template.as_str().into(),
                    input_paths_map,
                });
            }
        }
    }
}

fn json_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}
