use crate::error::SynthError;
use crate::template::Template;
use crate::validation::ValidationError;

/// A node of the construct tree that renders itself into a template.
pub trait Construct {
    /// Construct path, e.g. `CloudTrail/S3`.
    fn path(&self) -> &str;

    /// Returns constraint violations; an empty list means the construct is valid.
    fn validate(&self) -> Vec<ValidationError> {
        Vec::new()
    }

    /// Adds this construct's resources to the template.
    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError>;
}

/// Writes synthesized templates to a sink (files, streams, etc.).
pub trait TemplateWriter {
    /// Writes a single stack template and returns the number of bytes written.
    fn write_template(&mut self, stack_name: &str, template: &Template) -> std::io::Result<u64>;
    /// Flushes buffered data without closing the writer.
    fn flush(&mut self) -> std::io::Result<()>;
    /// Closes the writer, flushing any remaining data.
    fn close(&mut self) -> std::io::Result<()>;
}
