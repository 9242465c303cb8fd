//! Report output - writes the serialized analysis to a file or stdout

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Report writer
pub struct ReportWriter {
    pretty: bool,
}

impl ReportWriter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serialize `report` to a JSON string
    pub fn render<T: Serialize>(&self, report: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
    }

    /// Write `report` to `path`, creating parent directories as needed
    pub fn write_file<T: Serialize>(&self, report: &T, path: &Path) -> anyhow::Result<()> {
        let json = self.render(report)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, format!("{json}\n"))?;
        info!(path = %path.display(), bytes = json.len(), "report_written");
        Ok(())
    }

    /// Write `report` to stdout
    pub fn write_stdout<T: Serialize>(&self, report: &T) -> anyhow::Result<()> {
        let json = self.render(report)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")?;
        debug!(bytes = json.len(), "report_written_stdout");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_render_compact_and_pretty() {
        let value = json!({"a": 1});
        assert_eq!(ReportWriter::new(false).render(&value).unwrap(), r#"{"a":1}"#);
        assert!(ReportWriter::new(true).render(&value).unwrap().contains('\n'));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        ReportWriter::new(false).write_file(&json!({"ok": true}), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"ok\":true}\n");
    }
}
