//! Event patterns and pattern merging.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PatternError {
    #[error("invalid event pattern value for '{field}': {value}, expecting an object or an array")]
    InvalidValue { field: String, value: Value },

    #[error("invalid event pattern field '{field}': type mismatch between existing pattern {existing} and added pattern {added}")]
    TypeMismatch {
        field: String,
        existing: Value,
        added: Value,
    },

    #[error("event pattern must be an object, got {0}")]
    NotAnObject(Value),
}

/// Events a rule or archive matches.
///
/// Every top-level field is a list of allowed values (or content filters);
/// `detail` is an arbitrary object matched against the event detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EventPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Map<String, Value>>,
}

fn values<I, V>(items: I) -> Option<Vec<Value>>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Some(items.into_iter().map(Into::into).collect())
}

impl EventPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.version = values(items);
        self
    }

    pub fn id<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.id = values(items);
        self
    }

    pub fn detail_type<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.detail_type = values(items);
        self
    }

    pub fn source<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.source = values(items);
        self
    }

    pub fn account<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.account = values(items);
        self
    }

    pub fn time<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.time = values(items);
        self
    }

    pub fn region<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.region = values(items);
        self
    }

    pub fn resources<I: IntoIterator<Item = V>, V: Into<Value>>(mut self, items: I) -> Self {
        self.resources = values(items);
        self
    }

    /// Sets `detail`; `detail` must be a JSON object.
    pub fn detail(mut self, detail: Value) -> Result<Self, PatternError> {
        match detail {
            Value::Object(map) => {
                self.detail = Some(map);
                Ok(self)
            }
            other => Err(PatternError::NotAnObject(other)),
        }
    }

    /// Parses a pattern given in EventBridge shape.
    pub fn from_value(value: Value) -> Result<Self, PatternError> {
        if !value.is_object() {
            return Err(PatternError::NotAnObject(value));
        }
        let mut pattern = EventPattern::new();
        pattern.merge_value(&value)?;
        Ok(pattern)
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPattern::default()
    }

    /// Renders the pattern, or `None` when no field is set.
    pub fn render(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_value(self).ok()
    }

    /// Merges `other` into this pattern.
    ///
    /// List fields are appended to (duplicates are kept); `detail` is merged
    /// key-wise, recursing into objects and appending to lists. On error the
    /// pattern is left unchanged.
    pub fn merge(&mut self, other: &EventPattern) -> Result<(), PatternError> {
        let mut merged = self.clone();
        merge_list(&mut merged.version, &other.version);
        merge_list(&mut merged.id, &other.id);
        merge_list(&mut merged.detail_type, &other.detail_type);
        merge_list(&mut merged.source, &other.source);
        merge_list(&mut merged.account, &other.account);
        merge_list(&mut merged.time, &other.time);
        merge_list(&mut merged.region, &other.region);
        merge_list(&mut merged.resources, &other.resources);
        if let Some(detail) = &other.detail {
            let dest = merged.detail.get_or_insert_with(Map::new);
            merge_object(dest, detail, "detail")?;
        }
        *self = merged;
        Ok(())
    }

    fn merge_value(&mut self, value: &Value) -> Result<(), PatternError> {
        let Some(map) = value.as_object() else {
            return Err(PatternError::NotAnObject(value.clone()));
        };
        for (field, item) in map {
            if field == "detail" {
                let Some(detail) = item.as_object() else {
                    return Err(PatternError::InvalidValue {
                        field: field.clone(),
                        value: item.clone(),
                    });
                };
                let dest = self.detail.get_or_insert_with(Map::new);
                merge_object(dest, detail, "detail")?;
                continue;
            }
            let Some(items) = item.as_array() else {
                return Err(PatternError::InvalidValue {
                    field: field.clone(),
                    value: item.clone(),
                });
            };
            let slot = match field.as_str() {
                "version" => &mut self.version,
                "id" => &mut self.id,
                "detail-type" => &mut self.detail_type,
                "source" => &mut self.source,
                "account" => &mut self.account,
                "time" => &mut self.time,
                "region" => &mut self.region,
                "resources" => &mut self.resources,
                _ => {
                    return Err(PatternError::InvalidValue {
                        field: field.clone(),
                        value: item.clone(),
                    })
                }
            };
            merge_list(slot, &Some(items.clone()));
        }
        Ok(())
    }
}

fn merge_list(dest: &mut Option<Vec<Value>>, src: &Option<Vec<Value>>) {
    if let Some(src) = src {
        dest.get_or_insert_with(Vec::new).extend(src.iter().cloned());
    }
}

fn merge_object(
    dest: &mut Map<String, Value>,
    src: &Map<String, Value>,
    path: &str,
) -> Result<(), PatternError> {
    for (key, src_value) in src {
        let field = format!("{path}.{key}");
        match src_value {
            Value::Array(items) => match dest.get_mut(key) {
                None => {
                    dest.insert(key.clone(), src_value.clone());
                }
                Some(Value::Array(existing)) => existing.extend(items.iter().cloned()),
                Some(existing) => {
                    return Err(PatternError::TypeMismatch {
                        field,
                        existing: existing.clone(),
                        added: src_value.clone(),
                    })
                }
            },
            Value::Object(inner) => match dest.get_mut(key) {
                None => {
                    dest.insert(key.clone(), src_value.clone());
                }
                Some(Value::Object(existing)) => merge_object(existing, inner, &field)?,
                Some(existing) => {
                    return Err(PatternError::TypeMismatch {
                        field,
                        existing: existing.clone(),
                        added: src_value.clone(),
                    })
                }
            },
            other => {
                return Err(PatternError::InvalidValue {
                    field,
                    value: other.clone(),
                })
            }
        }
    }
    Ok(())
}
