//! Terminal rendering for the flow's stages

use crate::consumer::AnalysisView;
use dermal_common::log_line::TAG_FINDING;
use dermal_common::payment::{FULL_REPORT_AMOUNT, FULL_REPORT_PLAN};
use dermal_common::quiz::QuizMetric;
use dermal_common::report::{DermalReport, FindingIcon, Trend, TrendMetric};
use dermal_common::LogLine;
use std::fmt::Write;

/// Included in the paid report
pub const INTERVENTION_PROTOCOL: [&str; 3] = [
    "Customized Actives",
    "AM/PM Layering Guide",
    "90-Day Outcome Model",
];

const PROGRESS_BAR_WIDTH: usize = 40;

pub fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "▲",
        Trend::Down => "▼",
        Trend::Neutral => "",
    }
}

fn finding_marker(icon: FindingIcon) -> &'static str {
    match icon {
        FindingIcon::Warning => "⚠",
        FindingIcon::Alert => "⚡",
    }
}

fn percent(metric: &TrendMetric, with_trend: bool) -> String {
    let arrow = if with_trend { trend_arrow(metric.trend) } else { "" };
    if arrow.is_empty() {
        format!("{}%", metric.value)
    } else {
        format!("{}% {}", metric.value, arrow)
    }
}

fn write_metrics(out: &mut String, report: &DermalReport, with_trend: bool) {
    let metrics = &report.metrics;
    let _ = writeln!(out, "  UV DAMAGE       {}", percent(&metrics.uv_damage, with_trend));
    let _ = writeln!(out, "  HYDRATION       {}", percent(&metrics.hydration, with_trend));
    let _ = writeln!(out, "  INFLAMMATION    {}", metrics.inflammation);
    let _ = writeln!(out, "  DERMAL BIO-AGE  {}", metrics.dermal_bio_age);
}

fn write_findings(out: &mut String, report: &DermalReport) {
    for finding in &report.findings {
        let _ = writeln!(out, "  {} {}", finding_marker(finding.icon), finding.title);
        let _ = writeln!(out, "    {}", finding.description);
    }
}

/// One diagnostic log line as shown in the kernel pane
pub fn render_log_line(line: &LogLine) -> String {
    if line.is_structured() {
        let marker = if line.tag == TAG_FINDING { "!" } else { " " };
        format!("{}{} {} {}", marker, line.time, line.tag, line.message)
    } else {
        format!("  {}", line.message)
    }
}

/// Progress header, e.g. `DIAGNOSTIC KERNEL [#####.....] 50%`
pub fn render_progress(view: &AnalysisView) -> String {
    let filled = usize::from(view.progress) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "DIAGNOSTIC KERNEL [{}{}] {}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled),
        view.progress
    )
}

/// Report preview shown before payment
pub fn render_preview(report: &DermalReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CLINICAL PROFILE ID: {}", report.profile_id);
    let _ = writeln!(out, "{}", report.headline);
    let _ = writeln!(out, "{}", report.description);
    let _ = writeln!(out);
    write_metrics(&mut out, report, true);
    let _ = writeln!(out);
    write_findings(&mut out, report);
    let _ = writeln!(out);
    let _ = writeln!(out, "Intervention Protocol");
    for item in INTERVENTION_PROTOCOL {
        let _ = writeln!(out, "  - {}", item);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Get {} — ${}", FULL_REPORT_PLAN, FULL_REPORT_AMOUNT);
    out
}

/// Printable report shown after payment
pub fn render_full(report: &DermalReport, plan: Option<&str>, amount: Option<f64>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Payment successful");
    match (plan, amount) {
        (Some(plan), Some(amount)) => {
            let _ = writeln!(out, "{} — ${} paid successfully.", plan, amount);
        }
        (Some(plan), None) => {
            let _ = writeln!(out, "{}", plan);
        }
        (None, Some(amount)) => {
            let _ = writeln!(out, "${} paid successfully.", amount);
        }
        (None, None) => {}
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "==================================================");
    let _ = writeln!(out, "CLINICAL PROFILE ID: {}", report.profile_id);
    let _ = writeln!(out, "==================================================");
    let _ = writeln!(out, "Your Full Report");
    let _ = writeln!(out, "{}", report.headline);
    let _ = writeln!(out, "Bio-age variance: {}", report.bio_age_variance);
    let _ = writeln!(out, "{}", report.description);
    let _ = writeln!(out);
    write_metrics(&mut out, report, false);
    let _ = writeln!(out);
    let _ = writeln!(out, "Findings");
    write_findings(&mut out, report);
    let _ = writeln!(out);
    let _ = writeln!(out, "Intervention Protocol");
    for item in INTERVENTION_PROTOCOL {
        let _ = writeln!(out, "  [x] {}", item);
    }
    out
}

/// One quiz question with numbered options
pub fn render_question(metric: &QuizMetric) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Step {}: {} ({})", metric.step, metric.title, metric.label);
    let _ = writeln!(out, "  {}", metric.question);
    for (i, option) in metric.options.iter().enumerate() {
        let _ = writeln!(out, "    {}. {}", i + 1, option);
    }
    out
}
