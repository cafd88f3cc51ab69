//! cfnsynth library crate.
//!
//! Re-exports the construct libraries and template writers, and provides the
//! `app` layer the CLI uses to turn a config file into a stack.

pub mod app;

pub use cfnsynth_cloudtrail as cloudtrail;
pub use cfnsynth_core as core;
pub use cfnsynth_dlm as dlm;
pub use cfnsynth_events as events;
pub use cfnsynth_formats_json as formats_json;
pub use cfnsynth_formats_yaml as formats_yaml;

pub use cfnsynth_core::config;
pub use cfnsynth_core::{Construct, Stack, SynthError, Template, TemplateWriter};
