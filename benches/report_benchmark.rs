use criterion::{Criterion, black_box, criterion_group, criterion_main};
use checkout_runner::report::{ReportContext, escape_html, render};
use checkout_runner::runner::RunResult;
use checkout_runner::steps::{Step, StepKind};

fn sample_run(steps: usize) -> RunResult {
    let mut run = RunResult::new();
    for i in 0..steps {
        let kind = match i % 7 {
            0 => StepKind::Warning,
            _ => StepKind::Info,
        };
        run.append(Step::with_timestamp(
            "✅",
            &format!("Step {}", i),
            "Clicked <button class=\"primary\"> & waited for \"ready\"",
            kind,
            "URL: https://shop.example/p/1?a=1&b=2",
            "09:00:00 AM",
        ));
    }
    run.set_page("Shop & Co", "https://shop.example/");
    run.set_order_id("31544");
    run.set_screenshot_path("test-results/screenshots/checkout-run-2026-10-18T09-00-00.png");
    run
}

fn benchmark_render(c: &mut Criterion) {
    let ctx = ReportContext::new("Checkout Automation Report", "Storefront Checkout")
        .target_url("https://shop.example/")
        .generated_at("2026-10-18 09:00:00")
        .screenshot_href("../screenshots/checkout-run-2026-10-18T09-00-00.png")
        .validations(["Login", "Checkout", "Payment"]);

    let small = sample_run(20);
    let large = sample_run(500);

    c.bench_function("render_20_steps", |b| {
        b.iter(|| render(black_box(&small), black_box(&ctx)))
    });
    c.bench_function("render_500_steps", |b| {
        b.iter(|| render(black_box(&large), black_box(&ctx)))
    });
    c.bench_function("escape_html", |b| {
        b.iter(|| escape_html(black_box("<script>alert('x') & \"y\"</script>")))
    });
}

criterion_group!(benches, benchmark_render);
criterion_main!(benches);
