//! HTML report rendering.
//!
//! [`render`] is a pure function of a finished [`RunResult`] and a
//! [`ReportContext`]: no clock, filesystem or randomness is touched, so the
//! same inputs always give the same document. Persisting is the job of
//! [`ReportWriter`].

pub mod html;
pub mod writer;

pub use html::{HtmlWriter, escape_html};
pub use writer::{ReportPaths, ReportWriter, read_manifest};

use base64::Engine;
use std::path::Path;

use crate::runner::{RunResult, RunStatus};
use crate::steps::StepKind;

/// Stylesheet embedded into every report
const REPORT_CSS: &str = "<style>\n\
body{font-family:Arial,sans-serif;margin:20px;background-color:#f5f5f5;}\n\
.container{max-width:1200px;margin:0 auto;background:white;padding:20px;border-radius:8px;box-shadow:0 2px 10px rgba(0,0,0,0.1);}\n\
.header{text-align:center;color:#333;border-bottom:3px solid #4CAF50;padding-bottom:20px;margin-bottom:30px;}\n\
.test-info{background:#e8f5e8;padding:15px;border-radius:5px;margin:20px 0;}\n\
.step{margin:15px 0;padding:10px;border-left:4px solid #4CAF50;background:#f9f9f9;}\n\
.step.error{border-left-color:#f44336;background:#ffebee;}\n\
.step.warning{border-left-color:#ff9800;background:#fff3e0;}\n\
.timestamp{color:#666;font-size:.9em;}\n\
.screenshot{text-align:center;margin:20px 0;}\n\
.screenshot img{max-width:100%;border:1px solid #ddd;border-radius:5px;}\n\
.summary{background:#e3f2fd;padding:15px;border-radius:5px;margin:20px 0;}\n\
.status-pass{color:#4CAF50;font-weight:bold;}\n\
.status-fail{color:#f44336;font-weight:bold;}\n\
.details{background:#fafafa;padding:10px;border-radius:5px;margin:10px 0;font-family:monospace;white-space:pre-wrap;}\n\
footer{text-align:center;margin-top:30px;color:#666;border-top:1px solid #eee;padding-top:20px;}\n\
</style>\n";

/// Literal status text for a passed run
pub const STATUS_PASSED: &str = "✅ PASSED";

/// Literal status text for a failed run
pub const STATUS_FAILED: &str = "❌ FAILED";

/// Run metadata that is not part of the step record
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Document title and heading
    pub report_title: String,
    /// Name of the executed scenario
    pub test_name: String,
    /// Entry URL of the scenario
    pub target_url: String,
    /// Generation time, already formatted
    pub generated_at: String,
    /// Machine the run executed on
    pub host: String,
    /// Link to the screenshot relative to the report file
    pub screenshot_href: Option<String>,
    /// PNG bytes to embed inline as a data URI
    pub screenshot_png: Option<Vec<u8>>,
    /// Stage checklist shown at the end of the report
    pub validations: Vec<String>,
}

impl ReportContext {
    pub fn new(report_title: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            report_title: report_title.into(),
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    pub fn generated_at(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = generated_at.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn screenshot_href(mut self, href: impl Into<String>) -> Self {
        self.screenshot_href = Some(href.into());
        self
    }

    pub fn screenshot_png(mut self, png: Vec<u8>) -> Self {
        self.screenshot_png = Some(png);
        self
    }

    pub fn validations<I, V>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.validations = items.into_iter().map(Into::into).collect();
        self
    }
}

/// File name of the screenshot, or empty when there is none
pub fn screenshot_file_name(run: &RunResult) -> String {
    Path::new(run.screenshot_path())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Render the report document
pub fn render(run: &RunResult, ctx: &ReportContext) -> String {
    let status = run.status();
    let total = run.steps().len();
    let errors = run.steps().error_count();
    let screenshot_name = screenshot_file_name(run);

    let mut w = HtmlWriter::document();
    w.open("html", None).open("head", None);
    w.void("meta", &[("charset", "utf-8")]);
    w.element("title", None, &ctx.report_title);
    w.markup(REPORT_CSS);
    w.close();

    w.open("body", None).open("div", Some("container"));

    w.open("div", Some("header"))
        .element("h1", None, &format!("🧪 {}", ctx.report_title))
        .element("p", Some("timestamp"), &format!("Generated on: {}", ctx.generated_at))
        .close();

    // Summary
    w.open("div", Some("test-info"));
    w.element("h2", None, "📋 Test Summary");
    w.field("Test Name:", &ctx.test_name);
    w.field("URL:", &ctx.target_url);
    w.open("p", None).element("strong", None, "Status:").text(" ");
    match status {
        RunStatus::Passed => w.element("span", Some("status-pass"), STATUS_PASSED),
        RunStatus::Failed => w.element("span", Some("status-fail"), STATUS_FAILED),
    };
    w.close();
    w.field("Execution Time:", &format!("{}ms", run.execution_time_ms()));
    w.field(
        "Steps:",
        &format!("{} OK / {} errors (total {})", total - errors, errors, total),
    );
    w.field(
        "Browser:",
        format!("{} {}", run.browser_name(), run.browser_version()).trim(),
    );
    if !ctx.host.is_empty() {
        w.field("Host:", &ctx.host);
    }
    w.close();

    // Observed values
    w.open("div", Some("summary"));
    w.element("h3", None, "📊 Test Results");
    w.field("Page Title:", run.page_title());
    w.field("Final URL:", run.final_url());
    w.field("Screenshot:", &screenshot_name);
    w.field("Order ID:", run.order_id());
    w.field("Product Title:", run.product_title());
    w.field("Product URL:", run.product_url());
    if !run.export_path().is_empty() {
        w.field("CSV Output:", run.export_path());
    }
    w.close();

    // Steps
    w.element("h3", None, "📝 Execution Steps");
    for step in run.steps() {
        let class = match step.kind() {
            StepKind::Info => "step",
            StepKind::Warning => "step warning",
            StepKind::Error => "step error",
        };
        w.open("div", Some(class));
        w.element("strong", None, &format!("{} {}", step.icon(), step.title()));
        w.element("p", None, step.description());
        w.element("div", Some("timestamp"), step.timestamp());
        if let Some(details) = step.details() {
            w.element("div", Some("details"), details);
        }
        w.close();
    }

    // Screenshot
    if !screenshot_name.is_empty() || ctx.screenshot_png.is_some() {
        w.open("div", Some("screenshot"));
        w.element("h3", None, "📸 Screenshot");
        if let Some(png) = &ctx.screenshot_png {
            let data_uri = format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png)
            );
            w.void("img", &[("src", data_uri.as_str()), ("alt", "Test Screenshot")]);
        } else if let Some(href) = &ctx.screenshot_href {
            w.void("img", &[("src", href.as_str()), ("alt", "Test Screenshot")]);
        }
        if !screenshot_name.is_empty() {
            w.element("p", None, &format!("Screenshot saved: {}", screenshot_name));
        }
        w.close();
    }

    if !ctx.validations.is_empty() {
        w.open("div", Some("test-info"));
        w.element("h3", None, "🎯 Test Validation");
        for item in &ctx.validations {
            w.element("p", None, &format!("✅ {}", item));
        }
        w.close();
    }

    w.open("footer", None)
        .element(
            "p",
            None,
            &format!("Generated by {} | {}", ctx.report_title, ctx.generated_at),
        )
        .close();

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::Step;
    use pretty_assertions::assert_eq;

    fn unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    fn context() -> ReportContext {
        ReportContext::new("Checkout Automation Report", "Storefront checkout")
            .target_url("https://example/home")
            .generated_at("2026-10-18 09:30:00")
    }

    fn failed_run() -> RunResult {
        let mut run = RunResult::new();
        run.append(Step::with_timestamp("🚀", "Start", "...", StepKind::Info, "", "09:00:00 AM"));
        run.append(Step::with_timestamp(
            "❌",
            "Login Failed",
            "bad credentials",
            StepKind::Error,
            "",
            "09:00:04 AM",
        ));
        run.set_page("Home", "https://example/home");
        run.set_screenshot_path("error-123.png");
        run.set_execution_time_ms(4521);
        run
    }

    #[test]
    fn test_failed_run_end_to_end() {
        let html = render(&failed_run(), &context().screenshot_href("../screenshots/error-123.png"));

        assert!(html.contains(STATUS_FAILED));
        assert!(!html.contains(STATUS_PASSED));
        assert!(html.contains("bad credentials"));
        assert!(html.contains("error-123.png"));
        assert!(html.contains("4521ms"));

        let start = html.find("🚀 Start").unwrap();
        let failed = html.find("❌ Login Failed").unwrap();
        assert!(start < failed);
        assert!(html.contains("1 OK / 1 errors (total 2)"));
    }

    #[test]
    fn test_status_flips_with_a_single_error() {
        let mut run = RunResult::new();
        for i in 0..5 {
            let kind = if i % 2 == 0 { StepKind::Info } else { StepKind::Warning };
            run.append(Step::with_timestamp("•", "step", "ok", kind, "", "10:00:00 AM"));
        }
        assert!(render(&run, &context()).contains(STATUS_PASSED));

        run.append(Step::with_timestamp("❌", "boom", "x", StepKind::Error, "", "10:00:01 AM"));
        let html = render(&run, &context());
        assert!(html.contains(STATUS_FAILED));
        assert!(!html.contains(STATUS_PASSED));
    }

    #[test]
    fn test_step_text_is_escaped_losslessly() {
        let hostile = r#"</div><script>alert("x")</script> & 'quoted'"#;
        let mut run = RunResult::new();
        run.append(Step::with_timestamp(
            "⚠️",
            "Odd <title>",
            hostile,
            StepKind::Warning,
            hostile,
            "10:00:00 AM",
        ));
        run.set_page("<Home>", "https://example/?a=1&b=2");

        let html = render(&run, &context());
        assert!(!html.contains("<script>"));
        assert!(!html.contains("</div><script>"));

        let escaped = escape_html(hostile);
        assert!(html.contains(&escaped));
        assert_eq!(unescape(&escaped), hostile);
        assert!(html.contains("https://example/?a=1&amp;b=2"));
        assert!(html.contains("Odd &lt;title&gt;"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let run = failed_run();
        assert_eq!(render(&run, &context()), render(&run, &context()));
    }

    #[test]
    fn test_inline_screenshot_and_validations() {
        let html = render(
            &failed_run(),
            &context()
                .screenshot_png(vec![0x89, b'P', b'N', b'G'])
                .validations(["Navigated to storefront", "Screenshot captured"]),
        );
        assert!(html.contains("data:image/png;base64,iVBORw=="));
        assert!(html.contains("✅ Navigated to storefront"));
    }

    #[test]
    fn test_details_rendered_only_when_present() {
        let mut run = RunResult::new();
        run.append(Step::with_timestamp("📄", "Page", "loaded", StepKind::Info, "", "10:00:00 AM"));
        assert!(!render(&run, &context()).contains("class=\"details\""));

        run.append(Step::with_timestamp(
            "📄",
            "Page",
            "loaded",
            StepKind::Info,
            "URL: https://example/",
            "10:00:01 AM",
        ));
        assert!(render(&run, &context()).contains("<div class=\"details\">URL: https://example/</div>"));
    }
}
