//! Prometheus text exposition (format 0.0.4) of a metrics snapshot

use std::fmt::Write;
use std::time::Duration;

use super::metrics::{MetricsSnapshot, LATENCY_BUCKETS_MS};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub const SAMPLE_SET_SIZE: &str = "ipni_lookout_sample_set_size";
pub const LOOKUP_SUCCESS_RATIO: &str = "ipni_lookout_lookup_success_ratio";
pub const LOOKUP_RESULTS: &str = "ipni_lookout_lookup_results";
pub const CHECK_LATENCY: &str = "ipni_lookout_check_latency";

/// Render every series in the snapshot, sorted by label values.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    header(&mut out, SAMPLE_SET_SIZE, "The sample set size returned by samplers.", "gauge");
    for (sampler, size) in &snapshot.sample_set_sizes {
        let labels = labels(&[("sampler", sampler.as_str())]);
        let _ = writeln!(out, "{SAMPLE_SET_SIZE}{{{labels}}} {size}");
    }

    header(
        &mut out,
        LOOKUP_SUCCESS_RATIO,
        "The lookup success ratio as a number between 0 and 1.",
        "gauge",
    );
    for (key, ratio) in &snapshot.success_ratios {
        let labels = labels(&[("checker", key.checker.as_str()), ("sample", key.sample.as_str())]);
        let _ = writeln!(out, "{LOOKUP_SUCCESS_RATIO}{{{labels}}} {}", ratio.ratio);
    }

    header(
        &mut out,
        LOOKUP_RESULTS,
        "The number of check results behind the lookup success ratio.",
        "gauge",
    );
    for (key, ratio) in &snapshot.success_ratios {
        let labels = labels(&[("checker", key.checker.as_str()), ("sample", key.sample.as_str())]);
        let _ = writeln!(out, "{LOOKUP_RESULTS}{{{labels}}} {}", ratio.total);
    }

    header(
        &mut out,
        CHECK_LATENCY,
        "The elapsed time per check in milliseconds.",
        "histogram",
    );
    for (key, histogram) in &snapshot.latencies {
        let status = key.status.to_string();
        let timeout = duration_label(key.timeout);
        let base = [
            ("checker", key.lookup.checker.as_str()),
            ("sample", key.lookup.sample.as_str()),
            ("status", status.as_str()),
            ("error", bool_label(key.error)),
            ("timeout", timeout.as_str()),
            ("streaming", bool_label(key.streaming)),
        ];

        for (bound, count) in LATENCY_BUCKETS_MS.iter().zip(histogram.buckets) {
            let le = bound.to_string();
            let mut with_le = base.to_vec();
            with_le.push(("le", le.as_str()));
            let _ = writeln!(out, "{CHECK_LATENCY}_bucket{{{}}} {count}", labels(&with_le));
        }
        let mut with_inf = base.to_vec();
        with_inf.push(("le", "+Inf"));
        let _ = writeln!(
            out,
            "{CHECK_LATENCY}_bucket{{{}}} {}",
            labels(&with_inf),
            histogram.count
        );

        let labels = labels(&base);
        let _ = writeln!(out, "{CHECK_LATENCY}_sum{{{labels}}} {}", histogram.sum);
        let _ = writeln!(out, "{CHECK_LATENCY}_count{{{labels}}} {}", histogram.count);
    }

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn bool_label(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn labels(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{name}=\"{}\"", escape(value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Compact duration label: `30s`, `1.5s`, `1m30s`, `250ms`
fn duration_label(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return with_fraction(nanos, 1_000, 3, "µs");
    }
    if nanos < 1_000_000_000 {
        return with_fraction(nanos, 1_000_000, 6, "ms");
    }

    let secs = duration.as_secs();
    let (hours, minutes) = (secs / 3600, secs % 3600 / 60);
    let seconds = with_fraction(
        u128::from(secs % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos()),
        1_000_000_000,
        9,
        "s",
    );
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}")
    } else {
        seconds
    }
}

fn with_fraction(value: u128, unit: u128, digits: usize, suffix: &str) -> String {
    let (whole, fraction) = (value / unit, value % unit);
    if fraction == 0 {
        return format!("{whole}{suffix}");
    }
    let fraction = format!("{fraction:0digits$}");
    format!("{whole}.{}{suffix}", fraction.trim_end_matches('0'))
}
