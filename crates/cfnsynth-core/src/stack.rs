//! Stack: the root of a construct tree and the unit of synthesis.

use crate::error::SynthError;
use crate::template::{Output, Template};
use crate::traits::Construct;
use crate::validation::ValidationError;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Path segment excluded from both the readable part and the hash of a logical id.
const HIDDEN_ID: &str = "Default";
/// Path segment excluded from the readable part of a logical id only.
const HIDDEN_FROM_HUMAN_ID: &str = "Resource";
const HASH_LEN: usize = 8;
const MAX_LOGICAL_ID_LEN: usize = 255;
const MAX_STACK_NAME_LEN: usize = 128;

/// Checks a stack name against CloudFormation's rule, `[A-Za-z][A-Za-z0-9-]*`
/// up to 128 characters. Names are also used as output file names.
pub fn check_stack_name(name: &str) -> Result<(), String> {
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter
        || name.len() > MAX_STACK_NAME_LEN
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(format!(
            "stack name '{name}' must start with a letter, contain only letters, digits and hyphens, and be at most {MAX_STACK_NAME_LEN} characters"
        ));
    }
    Ok(())
}

pub struct Stack {
    name: String,
    description: Option<String>,
    paths: HashSet<String>,
    logical_ids: HashSet<String>,
    constructs: Vec<Box<dyn Construct>>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            paths: HashSet::new(),
            logical_ids: HashSet::new(),
            constructs: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Reserves a construct path and returns the logical id derived from it.
    pub fn allocate_logical_id(&mut self, path: &str) -> Result<String, SynthError> {
        let components = split_path(path)?;
        if !self.paths.insert(path.to_string()) {
            return Err(SynthError::DuplicatePath(path.to_string()));
        }
        let logical_id = make_logical_id(&components);
        if logical_id.is_empty() {
            return Err(SynthError::InvalidPath(path.to_string()));
        }
        if !self.logical_ids.insert(logical_id.clone()) {
            return Err(SynthError::DuplicateLogicalId(logical_id));
        }
        debug!(path, logical_id = %logical_id, "allocated logical id");
        Ok(logical_id)
    }

    /// Physical name derived from the stack name and a construct path, for
    /// resources whose name is required but was not supplied.
    pub fn unique_name(&self, path: &str, max_len: usize) -> String {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let hash = path_hash(&components);
        let mut human: String = std::iter::once(self.name.as_str())
            .chain(
                components
                    .iter()
                    .copied()
                    .filter(|c| *c != HIDDEN_ID && *c != HIDDEN_FROM_HUMAN_ID),
            )
            .map(remove_non_alphanumeric)
            .collect();
        let budget = max_len.saturating_sub(HASH_LEN);
        if human.len() > budget {
            let keep_from = human.len() - budget;
            human = human[keep_from..].to_string();
        }
        format!("{human}{hash}")
    }

    /// Adds a finished construct; it is rendered when the stack is synthesized.
    pub fn add<C>(&mut self, construct: C)
    where
        C: Construct + 'static,
    {
        self.constructs.push(Box::new(construct));
    }

    pub fn add_output(&mut self, id: impl Into<String>, output: Output) -> Result<(), SynthError> {
        let id = remove_non_alphanumeric(&id.into());
        if self.outputs.contains_key(&id) {
            return Err(SynthError::DuplicateOutput(id));
        }
        self.outputs.insert(id, output);
        Ok(())
    }

    pub fn construct_count(&self) -> usize {
        self.constructs.len()
    }

    /// Validates every construct, then renders the template.
    ///
    /// Validation errors from all constructs are collected before failing so a
    /// single run reports every problem.
    pub fn synthesize(&self) -> Result<Template, SynthError> {
        let mut errors = Vec::new();
        if let Err(message) = check_stack_name(&self.name) {
            errors.push(ValidationError::new(self.name.clone(), message));
        }
        errors.extend(
            self.constructs
                .iter()
                .flat_map(|construct| construct.validate()),
        );
        if !errors.is_empty() {
            for err in &errors {
                warn!(stack = %self.name, path = %err.path, "{}", err.message);
            }
            return Err(SynthError::Validation(errors));
        }

        let mut template = Template::new(self.description.clone());
        for construct in &self.constructs {
            construct.synthesize(&mut template)?;
        }
        template.outputs = self.outputs.clone();

        info!(
            stack = %self.name,
            constructs = self.constructs.len(),
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "synthesized stack"
        );
        Ok(template)
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, SynthError> {
    let components: Vec<&str> = path.split('/').collect();
    if components.iter().any(|c| c.trim().is_empty()) {
        return Err(SynthError::InvalidPath(path.to_string()));
    }
    Ok(components)
}

fn make_logical_id(components: &[&str]) -> String {
    let components: Vec<&str> = components
        .iter()
        .copied()
        .filter(|c| *c != HIDDEN_ID)
        .collect();

    if components.len() == 1 {
        return remove_non_alphanumeric(components[0]);
    }

    let hash = path_hash(&components);
    let mut human: String = components
        .iter()
        .copied()
        .filter(|c| *c != HIDDEN_FROM_HUMAN_ID)
        .map(remove_non_alphanumeric)
        .collect();
    human.truncate(MAX_LOGICAL_ID_LEN - HASH_LEN);
    format!("{human}{hash}")
}

fn path_hash(components: &[&str]) -> String {
    let digest = Sha256::digest(components.join("/").as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02X}")).collect();
    hex[..HASH_LEN].to_string()
}

fn remove_non_alphanumeric(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
