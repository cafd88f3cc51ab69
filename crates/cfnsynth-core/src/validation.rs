//! Validation of documented resource constraints.
//!
//! Checks only apply to literal values; tokens are resolved by CloudFormation
//! and cannot be inspected at synthesis time.

use crate::token::CfnString;
use std::fmt;

/// A constraint violation found on a construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Construct path the error belongs to.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collects validation errors for one construct.
#[derive(Debug)]
pub struct Validator {
    path: String,
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            errors: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(self.path.clone(), message));
    }

    /// Records `message` when `condition` does not hold.
    pub fn ensure(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            self.error(message());
        }
    }

    pub fn length(&mut self, field: &str, value: Option<&CfnString>, min: usize, max: usize) {
        let Some(text) = value.and_then(CfnString::as_str) else {
            return;
        };
        let len = text.chars().count();
        if len < min || len > max {
            self.error(format!(
                "{field} must be between {min} and {max} characters, got {len}"
            ));
        }
    }

    pub fn max_length(&mut self, field: &str, value: Option<&CfnString>, max: usize) {
        self.length(field, value, 0, max);
    }

    /// Checks that every character is allowed; `allowed_desc` names the set in the message.
    pub fn charset(
        &mut self,
        field: &str,
        value: Option<&CfnString>,
        allowed: impl Fn(char) -> bool,
        allowed_desc: &str,
    ) {
        let Some(text) = value.and_then(CfnString::as_str) else {
            return;
        };
        if let Some(bad) = text.chars().find(|c| !allowed(*c)) {
            self.error(format!(
                "{field} '{text}' contains '{bad}'; only {allowed_desc} are allowed"
            ));
        }
    }

    pub fn max_items(&mut self, field: &str, count: usize, max: usize) {
        if count > max {
            self.error(format!("{field} supports at most {max} entries, got {count}"));
        }
    }

    pub fn one_of<T: PartialEq + fmt::Display>(&mut self, field: &str, value: Option<T>, allowed: &[T]) {
        if let Some(value) = value {
            if !allowed.contains(&value) {
                let allowed = allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.error(format!("{field} must be one of [{allowed}], got {value}"));
            }
        }
    }

    pub fn mutually_exclusive(&mut self, first: (&str, bool), second: (&str, bool)) {
        if first.1 && second.1 {
            self.error(format!(
                "{} and {} cannot both be specified",
                first.0, second.0
            ));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Characters accepted by most EventBridge names: `[.\-_A-Za-z0-9]`.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}
