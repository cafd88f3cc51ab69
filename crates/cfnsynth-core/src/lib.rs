//! Core types for cfnsynth constructs and template writers.
//!
//! This crate defines the template document, deploy-time tokens, the stack
//! that allocates logical ids, the L1 resource plumbing shared by the service
//! crates, and the collaborator resources (S3, IAM, Logs, SNS, Lambda, KMS)
//! that higher-level constructs create or reference.

pub mod aws;
pub mod config;
pub mod error;
pub mod resource;
pub mod stack;
pub mod tag;
pub mod template;
pub mod token;
pub mod traits;
pub mod validation;

pub use error::SynthError;
pub use resource::{CfnProperties, CfnResource};
pub use stack::Stack;
pub use tag::CfnTag;
pub use template::{DeletionPolicy, Output, ResourceNode, Template};
pub use token::{CfnString, Intrinsic, Pseudo, Resolvable};
pub use traits::{Construct, TemplateWriter};
pub use validation::{ValidationError, Validator};
