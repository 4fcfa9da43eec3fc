use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use dco_core::Commit;

/// Ordered, append-only report of non-compliant commits.
///
/// Columns: locator, message, author name, author email, authored timestamp.
/// No header row; every field quoted.
pub struct ReportSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ReportSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("create report {}", path.display()))?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> ReportSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::CRLF)
            .from_writer(inner);
        Self { writer, rows: 0 }
    }

    pub fn write_commit(&mut self, commit: &Commit) -> Result<()> {
        let authored = commit.authored_display();
        self.writer
            .write_record([
                commit.html_url.as_str(),
                commit.message.as_str(),
                commit.author_name.as_str(),
                commit.author_email.as_str(),
                authored.as_str(),
            ])
            .with_context(|| format!("write report row for {}", commit.sha))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flush report")?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| anyhow::anyhow!("flush report: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::commit;
    use tempfile::tempdir;

    #[test]
    fn rows_are_fully_quoted_without_header() {
        let mut sink = ReportSink::from_writer(vec![]);
        sink.write_commit(&commit("abc", "Jane Doe", "https://github.com/org/repo", "say \"hi\"\n")).unwrap();
        sink.write_commit(&commit("def", "Joe", "https://github.com/org/repo", "second")).unwrap();
        assert_eq!(sink.rows(), 2);
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "\"https://github.com/org/repo/commit/abc\",\"say \"\"hi\"\"\n\",\"Jane Doe\",\"jane.doe@example.com\",\"2019-05-06 07:08:09-04:00\"\r\n\
             \"https://github.com/org/repo/commit/def\",\"second\",\"Joe\",\"joe@example.com\",\"2019-05-06 07:08:09-04:00\"\r\n"
        );
    }

    #[test]
    fn create_truncates_existing_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();
        let mut sink = ReportSink::create(&path).unwrap();
        sink.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
