//! Collaborator resources created or referenced by the service constructs.

pub mod iam;
pub mod kms;
pub mod lambda;
pub mod logs;
pub mod s3;
pub mod sns;
