use crate::validation::ValidationError;
use thiserror::Error;

/// Errors raised while building or synthesizing a stack.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("construct path '{0}' is invalid: path segments must be non-empty")]
    InvalidPath(String),

    #[error("construct path '{0}' is already in use")]
    DuplicatePath(String),

    #[error("duplicate logical id '{0}'")]
    DuplicateLogicalId(String),

    #[error("duplicate output id '{0}'")]
    DuplicateOutput(String),

    #[error("{}", render_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("failed to render properties of '{logical_id}': {source}")]
    Render {
        logical_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SynthError {
    pub fn render(logical_id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Render {
            logical_id: logical_id.into(),
            source,
        }
    }

    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            SynthError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn render_errors(errors: &[ValidationError]) -> String {
    let mut message = format!("validation failed with {} error(s):", errors.len());
    for err in errors {
        message.push_str("\n  ");
        message.push_str(&err.to_string());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_entry() {
        let err = SynthError::Validation(vec![
            ValidationError::new("Rule", "missing pattern"),
            ValidationError::new("Trail", "too many selectors"),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("validation failed with 2 error(s)"));
        assert!(message.contains("[Rule] missing pattern"));
        assert!(message.contains("[Trail] too many selectors"));
    }
}
