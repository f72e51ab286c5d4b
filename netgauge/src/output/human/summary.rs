use std::fmt::Write as _;

use netgauge_core::{ComparisonResult, MetricKind, SessionReport};

use super::format::{format_change, format_value, format_value_opt};

pub(crate) fn render_report(report: &SessionReport) -> String {
    let mut out = String::new();

    writeln!(&mut out, "report: {}", report.id).ok();
    writeln!(
        &mut out,
        "score: {}/100 ({})",
        report.score, report.classification
    )
    .ok();
    if report.settings.cancelled {
        out.push_str("  (cancelled before the full duration)\n");
    }
    out.push('\n');

    writeln!(&mut out, "{:<18} {:>14} {:>10}", "metric", "mean", "samples").ok();
    for (kind, m) in &report.metrics {
        let mean = if m.all_failed {
            "failed".to_string()
        } else {
            format_value_opt(m.mean_value, m.unit)
        };
        writeln!(
            &mut out,
            "{:<18} {:>14} {:>10}",
            kind.label(),
            mean,
            format!("{}/{}", m.sample_count, m.attempted)
        )
        .ok();
    }

    if !report.worker_results.is_empty() {
        out.push('\n');
        for w in &report.worker_results {
            writeln!(
                &mut out,
                "stream {}: {} ok, {} failed, mean {}",
                w.stream_id,
                w.successful_tests,
                w.failed_tests,
                format_value_opt(w.mean_throughput_mbps, MetricKind::Download.unit())
            )
            .ok();
        }
    }

    let b = &report.breakdown;
    writeln!(
        &mut out,
        "\npoints: dns {} + latency {} + tcp {} + bandwidth {}",
        b.dns, b.latency, b.tcp_connect, b.bandwidth
    )
    .ok();

    out
}

pub(crate) fn render_comparison(cmp: &ComparisonResult) -> String {
    let mut out = String::new();

    writeln!(&mut out, "before: {} (score {})", cmp.before_id, cmp.before_score).ok();
    writeln!(&mut out, "after:  {} (score {})", cmp.after_id, cmp.after_score).ok();
    writeln!(&mut out, "score change: {:+}", cmp.score_delta()).ok();
    out.push('\n');

    if cmp.metrics.is_empty() {
        out.push_str("no metric was measured in both reports\n");
        return out;
    }

    writeln!(
        &mut out,
        "{:<18} {:>14} {:>14} {:>9}  status",
        "metric", "before", "after", "change"
    )
    .ok();
    for m in &cmp.metrics {
        writeln!(
            &mut out,
            "{:<18} {:>14} {:>14} {:>9}  {}",
            m.metric.label(),
            format_value(m.before_value, m.unit),
            format_value(m.after_value, m.unit),
            format_change(m.percent_improvement),
            m.status
        )
        .ok();
    }
    writeln!(
        &mut out,
        "\noverall: {}",
        format_change(cmp.overall_improvement)
    )
    .ok();

    out
}

pub(crate) fn render_list(reports: &[SessionReport]) -> String {
    if reports.is_empty() {
        return "no saved reports\n".to_string();
    }

    let mut out = String::new();
    for r in reports {
        writeln!(
            &mut out,
            "{}  {:>3}  {}",
            r.id, r.score, r.classification
        )
        .ok();
    }
    out
}
