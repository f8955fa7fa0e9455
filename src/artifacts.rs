//! On-disk layout for run artifacts.
//!
//! Everything a run produces lives under one results directory:
//! - `screenshots/` final and error screenshots
//! - `reports/` timestamped HTML reports, their JSON manifests and
//!   `latest-report.html`
//! - `exports/` order hand-off files
//!
//! File names carry a sortable `YYYY-MM-DDTHH-MM-SS` suffix so a plain
//! directory listing is chronological.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserSession};

/// Timestamp format used in artifact file names
pub const ARTIFACT_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Fixed name of the most recent report
pub const LATEST_REPORT: &str = "latest-report.html";

const SCREENSHOTS_DIR: &str = "screenshots";
const REPORTS_DIR: &str = "reports";
const EXPORTS_DIR: &str = "exports";

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Error types for artifact operations
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Screenshot is not a valid image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed export {}: {message}", path.display())]
    Export { path: PathBuf, message: String },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ArtifactError::Io { path, source }
    }
}

/// The three artifact directories of a results root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDirs {
    root: PathBuf,
    screenshots: PathBuf,
    reports: PathBuf,
    exports: PathBuf,
}

impl ArtifactDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            screenshots: root.join(SCREENSHOTS_DIR),
            reports: root.join(REPORTS_DIR),
            exports: root.join(EXPORTS_DIR),
            root,
        }
    }

    /// Create all directories
    pub fn init(&self) -> ArtifactResult<()> {
        for dir in [&self.screenshots, &self.reports, &self.exports] {
            fs::create_dir_all(dir).map_err(ArtifactError::io(dir))?;
        }
        debug!(root = %self.root.display(), "artifact directories ready");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn screenshots(&self) -> &Path {
        &self.screenshots
    }

    pub fn reports(&self) -> &Path {
        &self.reports
    }

    pub fn exports(&self) -> &Path {
        &self.exports
    }

    /// `screenshots/<prefix>-<stamp>.png`
    pub fn screenshot_path(&self, prefix: &str, stamp: &str) -> PathBuf {
        self.screenshots
            .join(format!("{}-{}.png", sanitize_name(prefix), stamp))
    }

    /// Resolve an export file name; absolute paths are kept as given
    pub fn export_path(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.exports.join(name)
        }
    }

    /// Timestamped HTML reports, oldest first (the latest pointer is excluded)
    pub fn list_reports(&self) -> ArtifactResult<Vec<PathBuf>> {
        list_with_extension(&self.reports, "html").map(|mut reports| {
            reports.retain(|p| p.file_name().is_none_or(|n| n != LATEST_REPORT));
            reports
        })
    }

    /// Screenshots, oldest first
    pub fn list_screenshots(&self) -> ArtifactResult<Vec<PathBuf>> {
        list_with_extension(&self.screenshots, "png")
    }

    /// Delete screenshots, reports and manifests older than `max_age`.
    ///
    /// `latest-report.html` is never removed. Returns the number of files
    /// deleted.
    pub fn prune(&self, max_age: Duration) -> ArtifactResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for dir in [&self.screenshots, &self.reports] {
            if !dir.exists() {
                continue;
            }
            for entry in fs::read_dir(dir).map_err(ArtifactError::io(dir))? {
                let entry = entry.map_err(ArtifactError::io(dir))?;
                let path = entry.path();
                if !path.is_file() || path.file_name().is_some_and(|n| n == LATEST_REPORT) {
                    continue;
                }
                let age = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok());
                if age.is_some_and(|age| age > max_age) {
                    match fs::remove_file(&path) {
                        Ok(()) => removed += 1,
                        Err(e) => warn!(path = %path.display(), "could not prune artifact: {}", e),
                    }
                }
            }
        }

        info!(removed, "pruned old artifacts");
        Ok(removed)
    }
}

fn list_with_extension(dir: &Path, ext: &str) -> ArtifactResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir).map_err(ArtifactError::io(dir))? {
            let path = entry.map_err(ArtifactError::io(dir))?.path();
            if path.extension().is_some_and(|e| e == ext) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// A screenshot written to disk
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Screenshot {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Take a screenshot and store it as `screenshots/<prefix>-<timestamp>.png`.
///
/// The bytes are decoded before writing so a truncated or non-image payload
/// from the driver never lands on disk.
pub fn capture_screenshot<S>(session: &S, dirs: &ArtifactDirs, prefix: &str) -> ArtifactResult<Screenshot>
where
    S: BrowserSession + ?Sized,
{
    let png = session.screenshot()?;
    let decoded = image::load_from_memory(&png)?;

    fs::create_dir_all(dirs.screenshots()).map_err(ArtifactError::io(dirs.screenshots()))?;
    let path = dirs.screenshot_path(prefix, &timestamp_suffix());
    fs::write(&path, &png).map_err(ArtifactError::io(&path))?;

    debug!(path = %path.display(), width = decoded.width(), height = decoded.height(), "screenshot saved");
    Ok(Screenshot {
        path,
        width: decoded.width(),
        height: decoded.height(),
        png,
    })
}

/// Current local time in artifact file name form
pub fn timestamp_suffix() -> String {
    chrono::Local::now().format(ARTIFACT_TIME_FORMAT).to_string()
}

/// Make a name safe for use in file names
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockBrowser;
    use crate::browser::mock::MOCK_SCREENSHOT_SIZE;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let dirs = ArtifactDirs::new("/tmp/results");
        assert_eq!(dirs.screenshots(), Path::new("/tmp/results/screenshots"));
        assert_eq!(dirs.reports(), Path::new("/tmp/results/reports"));
        assert_eq!(dirs.exports(), Path::new("/tmp/results/exports"));
        assert_eq!(
            dirs.screenshot_path("ms error", "2026-10-18T09-30-00"),
            Path::new("/tmp/results/screenshots/ms_error-2026-10-18T09-30-00.png")
        );
        assert_eq!(dirs.export_path("orders.csv"), Path::new("/tmp/results/exports/orders.csv"));
        assert_eq!(dirs.export_path("/srv/orders.csv"), Path::new("/srv/orders.csv"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("hello world"), "hello_world");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("checkout-run_1"), "checkout-run_1");
    }

    #[test]
    fn test_timestamp_suffix_is_sortable() {
        let stamp = timestamp_suffix();
        assert_eq!(stamp.len(), "2026-10-18T09-30-00".len());
        assert_eq!(&stamp[10..11], "T");
        assert!(!stamp.contains(':'));
    }

    #[test]
    fn test_capture_screenshot_writes_valid_png() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        let browser = MockBrowser::new();

        let shot = capture_screenshot(&browser, &dirs, "checkout-run").unwrap();
        assert!(shot.path.exists());
        assert!(shot.file_name().starts_with("checkout-run-"));
        assert!(shot.file_name().ends_with(".png"));
        assert_eq!((shot.width, shot.height), MOCK_SCREENSHOT_SIZE);
        assert_eq!(dirs.list_screenshots().unwrap(), vec![shot.path.clone()]);
    }

    #[test]
    fn test_capture_screenshot_after_quit_fails() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        let browser = MockBrowser::new();
        browser.quit().unwrap();

        let err = capture_screenshot(&browser, &dirs, "error").unwrap_err();
        assert!(matches!(err, ArtifactError::Browser(BrowserError::Closed)));
    }

    #[test]
    fn test_list_reports_skips_latest() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        dirs.init().unwrap();
        fs::write(dirs.reports().join("run-2026-10-18T09-00-00.html"), "a").unwrap();
        fs::write(dirs.reports().join("run-2026-10-18T10-00-00.html"), "b").unwrap();
        fs::write(dirs.reports().join(LATEST_REPORT), "b").unwrap();
        fs::write(dirs.reports().join("run-2026-10-18T10-00-00.json"), "{}").unwrap();

        let names: Vec<String> = dirs
            .list_reports()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["run-2026-10-18T09-00-00.html", "run-2026-10-18T10-00-00.html"]
        );
    }

    #[test]
    fn test_prune_keeps_latest_and_fresh_files() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path());
        dirs.init().unwrap();
        fs::write(dirs.reports().join("run-a.html"), "a").unwrap();
        fs::write(dirs.reports().join(LATEST_REPORT), "a").unwrap();
        fs::write(dirs.screenshots().join("run-a.png"), "a").unwrap();

        // nothing is older than an hour
        assert_eq!(dirs.prune(Duration::from_secs(3600)).unwrap(), 0);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(dirs.prune(Duration::ZERO).unwrap(), 2);
        assert!(dirs.reports().join(LATEST_REPORT).exists());
    }

    #[test]
    fn test_prune_missing_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let dirs = ArtifactDirs::new(tmp.path().join("absent"));
        assert_eq!(dirs.prune(Duration::ZERO).unwrap(), 0);
    }
}
