use netgauge_core::Unit;

pub(crate) fn format_bytes(b: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    if b >= GIB {
        return format!("{:.2}GiB", (b as f64) / (GIB as f64));
    }
    if b >= MIB {
        return format!("{:.2}MiB", (b as f64) / (MIB as f64));
    }
    if b >= KIB {
        return format!("{:.2}KiB", (b as f64) / (KIB as f64));
    }

    format!("{b}B")
}

/// Time values are shown in milliseconds whatever unit they were stored in.
pub(crate) fn format_value(value: f64, unit: Unit) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    match unit.to_millis(value) {
        Some(ms) => format!("{ms:.2}ms"),
        None => match unit {
            Unit::Percent => format!("{value:.2}%"),
            _ => format!("{value:.2} {unit}"),
        },
    }
}

pub(crate) fn format_value_opt(value: Option<f64>, unit: Unit) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format_value(v, unit))
}

pub(crate) fn format_change(pct: f64) -> String {
    if pct.is_finite() {
        format!("{pct:+.1}%")
    } else {
        "n/a".to_string()
    }
}
