use cfnsynth_core::stack::check_stack_name;
use cfnsynth_core::template::Template;
use cfnsynth_core::traits::TemplateWriter;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes each stack to `<dir>/<stack>.template.json`, optionally gzipped.
pub struct JsonTemplateWriter {
    dir: PathBuf,
    pretty: bool,
    gzip: bool,
    written: Vec<PathBuf>,
    closed: bool,
}

impl JsonTemplateWriter {
    pub fn new(dir: impl Into<PathBuf>, pretty: bool, gzip: bool) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            pretty,
            gzip,
            written: Vec::new(),
            closed: false,
        })
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn render(&self, template: &Template) -> io::Result<Vec<u8>> {
        let mut buffer = if self.pretty {
            serde_json::to_vec_pretty(template)
        } else {
            serde_json::to_vec(template)
        }
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        buffer.push(b'\n');
        Ok(buffer)
    }
}

impl TemplateWriter for JsonTemplateWriter {
    fn write_template(&mut self, stack_name: &str, template: &Template) -> io::Result<u64> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "writer is closed"));
        }
        check_stack_name(stack_name)
            .map_err(|message| io::Error::new(io::ErrorKind::InvalidInput, message))?;
        let buffer = self.render(template)?;
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
    dir.join(format!("{stack_name}.template.json{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfnsynth_core::template::ResourceNode;
    use flate2::read::GzDecoder;
    use serde_json::{json, Value};
    use std::io::Read;

    fn sample() -> Template {
        let mut template = Template::new(Some("demo".to_string()));
        template
            .add_resource(
                "Topic",
                ResourceNode::new("AWS::SNS::Topic", json!({"TopicName": "alerts"})),
            )
            .expect("resource");
        template
    }

    #[test]
    fn writes_pretty_json_per_stack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = JsonTemplateWriter::new(dir.path(), true, false).expect("writer");
        let bytes = writer.write_template("Demo", &sample()).expect("write");
        writer.close().expect("close");

        let path = dir.path().join("Demo.template.json");
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text.len() as u64, bytes);
        assert!(text.contains("\n  \"Resources\""));
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["Resources"]["Topic"]["Type"], json!("AWS::SNS::Topic"));
        assert_eq!(writer.written(), &[path]);
    }

    #[test]
    fn gzip_output_decodes_to_compact_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = JsonTemplateWriter::new(dir.path(), false, true).expect("writer");
        writer.write_template("Demo", &sample()).expect("write");

        let file = File::open(dir.path().join("Demo.template.json.gz")).expect("open");
        let mut text = String::new();
        GzDecoder::new(file).read_to_string(&mut text).expect("decode");
        assert_eq!(text.lines().count(), 1);
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["Description"], json!("demo"));
    }

    #[test]
    fn stack_name_cannot_leave_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let mut writer = JsonTemplateWriter::new(&out, true, false).expect("writer");
        let err = writer.write_template("../x", &sample()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("x.template.json").exists());
        assert!(writer.written().is_empty());
    }

    #[test]
    fn write_after_close_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = JsonTemplateWriter::new(dir.path(), true, false).expect("writer");
        writer.close().expect("close");
        assert!(writer.write_template("Demo", &sample()).is_err());
    }
}
