use cfnsynth_core::stack::check_stack_name;
use cfnsynth_core::template::Template;
use cfnsynth_core::traits::TemplateWriter;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes each stack to `<dir>/<stack>.template.yaml`, optionally gzipped.
///
/// Intrinsics are written in their long form (`Ref: Bucket`,
/// `Fn::GetAtt: [Bucket, Arn]`), never as YAML tags.
pub struct YamlTemplateWriter {
    dir: PathBuf,
    gzip: bool,
    written: Vec<PathBuf>,
    closed: bool,
}

impl YamlTemplateWriter {
    pub fn new(dir: impl Into<PathBuf>, gzip: bool) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            gzip,
            written: Vec::new(),
            closed: false,
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Renders through a JSON value so enum-shaped intrinsics become plain maps.
fn render(template: &Template) -> io::Result<Vec<u8>> {
    let value = serde_json::to_value(template).map_err(to_io)?;
    let text = serde_yaml::to_string(&value).map_err(to_io)?;
    Ok(text.into_bytes())
}

fn to_io<E>(err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::Other, err)
}

impl TemplateWriter for YamlTemplateWriter {
    fn write_template(&mut self, stack_name: &str, template: &Template) -> io::Result<u64> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "writer is closed"));
        }
        check_stack_name(stack_name)
            .map_err(|message| io::Error::new(io::ErrorKind::InvalidInput, message))?;
        let buffer = render(template)?;
        let path = template_path(&self.dir, stack_name, self.gzip);
        let file = BufWriter::new(File::create(&path)?);
        if self.gzip {
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(&buffer)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            file.write_all(&buffer)?;
            file.flush()?;
        }
        info!(path = %path.display(), bytes = buffer.len(), "wrote template");
        self.written.push(path);
        Ok(buffer.len() as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn template_path(dir: &Path, stack_name: &str, gzip: bool) -> PathBuf {
    let suffix = if gzip { ".gz" } else { "" };
    dir.join(format!("{stack_name}.template.yaml{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnsynth_core::template::ResourceNode;
    use cfnsynth_core::{CfnString, Intrinsic};
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::io::Read;

    fn sample() -> Template {
        let arn: CfnString = Intrinsic::get_att("Bucket", "Arn").into();
        let mut template = Template::default();
        template
            .add_resource(
                "Trail",
                ResourceNode::new(
                    "AWS::CloudTrail::Trail",
                    json!({"IsLogging": true, "S3BucketName": {"Ref": "Bucket"}, "KmsKeyId": arn}),
                ),
            )
            .expect("resource");
        template
    }

    #[test]
    fn intrinsics_are_plain_maps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = YamlTemplateWriter::new(dir.path(), false).expect("writer");
        writer.write_template("Audit", &sample()).expect("write");
        writer.close().expect("close");

        let text = fs::read_to_string(dir.path().join("Audit.template.yaml")).expect("read");
        assert!(!text.contains('!'));
        let value: serde_yaml::Value = serde_yaml::from_str(&text).expect("yaml");
        assert_eq!(
            value["Resources"]["Trail"]["Properties"]["S3BucketName"]["Ref"],
            serde_yaml::Value::from("Bucket")
        );
        assert_eq!(
            value["Resources"]["Trail"]["Properties"]["KmsKeyId"]["Fn::GetAtt"][1],
            serde_yaml::Value::from("Arn")
        );
    }

    #[test]
    fn gzip_output_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = YamlTemplateWriter::new(dir.path(), true).expect("writer");
        let bytes = writer.write_template("Audit", &sample()).expect("write");

        let file = File::open(dir.path().join("Audit.template.yaml.gz")).expect("open");
        let mut text = String::new();
        GzDecoder::new(file).read_to_string(&mut text).expect("decode");
        assert_eq!(text.len() as u64, bytes);
        let parsed: Template = serde_yaml::from_str(&text).expect("template");
        assert_eq!(parsed, sample());
    }

    #[test]
    fn stack_name_cannot_leave_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let mut writer = YamlTemplateWriter::new(&out, false).expect("writer");
        let err = writer.write_template("../x", &sample()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("x.template.yaml").exists());
        assert!(writer.written().is_empty());
    }
}
