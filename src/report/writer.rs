//! Persisting rendered reports.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::artifacts::{ArtifactError, ArtifactResult, LATEST_REPORT, sanitize_name, timestamp_suffix};
use crate::runner::RunResult;

/// Files written for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// `<prefix>-<timestamp>.html`
    pub timestamped: PathBuf,
    /// `latest-report.html`, overwritten on every run
    pub latest: PathBuf,
    /// `<prefix>-<timestamp>.json` with the serialized run
    pub manifest: PathBuf,
}

/// Writes reports into a reports directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
    prefix: String,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            prefix: sanitize_name(prefix),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Write `html` and the run manifest stamped with the current time
    pub fn write(&self, html: &str, run: &RunResult) -> ArtifactResult<ReportPaths> {
        self.write_at(html, run, &timestamp_suffix())
    }

    /// Write `html` and the run manifest under an explicit stamp
    pub fn write_at(&self, html: &str, run: &RunResult, stamp: &str) -> ArtifactResult<ReportPaths> {
        fs::create_dir_all(&self.reports_dir).map_err(ArtifactError::io(&self.reports_dir))?;

        let stem = format!("{}-{}", self.prefix, stamp);
        let paths = ReportPaths {
            timestamped: self.reports_dir.join(format!("{}.html", stem)),
            latest: self.reports_dir.join(LATEST_REPORT),
            manifest: self.reports_dir.join(format!("{}.json", stem)),
        };

        fs::write(&paths.timestamped, html).map_err(ArtifactError::io(&paths.timestamped))?;
        fs::write(&paths.latest, html).map_err(ArtifactError::io(&paths.latest))?;
        let manifest = serde_json::to_string_pretty(run)?;
        fs::write(&paths.manifest, manifest).map_err(ArtifactError::io(&paths.manifest))?;

        info!(report = %paths.timestamped.display(), "HTML report generated");
        info!(latest = %paths.latest.display(), "latest report saved");
        Ok(paths)
    }
}

/// Load a run from a manifest written by [`ReportWriter`]
pub fn read_manifest(path: &Path) -> ArtifactResult<RunResult> {
    let data = fs::read_to_string(path).map_err(ArtifactError::io(path))?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{Step, StepKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn run() -> RunResult {
        let mut run = RunResult::new();
        run.append(Step::with_timestamp("🚀", "Start", "go", StepKind::Info, "", "09:00:00 AM"));
        run.set_order_id("31544");
        run
    }

    #[test]
    fn test_write_creates_timestamped_latest_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path().join("reports"), "checkout-report");

        let paths = writer
            .write_at("<html>one</html>", &run(), "2026-10-18T09-00-00")
            .unwrap();

        assert_eq!(
            paths.timestamped.file_name().unwrap(),
            "checkout-report-2026-10-18T09-00-00.html"
        );
        assert_eq!(fs::read_to_string(&paths.timestamped).unwrap(), "<html>one</html>");
        assert_eq!(fs::read_to_string(&paths.latest).unwrap(), "<html>one</html>");
        assert_eq!(read_manifest(&paths.manifest).unwrap(), run());
    }

    #[test]
    fn test_latest_is_overwritten_history_kept() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path(), "checkout-report");

        let first = writer.write_at("first", &run(), "2026-10-18T09-00-00").unwrap();
        let second = writer.write_at("second", &run(), "2026-10-18T09-05-00").unwrap();

        assert_eq!(first.latest, second.latest);
        assert_eq!(fs::read_to_string(&second.latest).unwrap(), "second");
        assert_eq!(fs::read_to_string(&first.timestamped).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second.timestamped).unwrap(), "second");
    }

    #[test]
    fn test_read_manifest_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_manifest(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
