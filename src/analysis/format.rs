/// 将数字格式化为易读的格式 (k, m, b)
pub fn format_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2}b", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2}m", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}k", value / 1_000.0)
    } else if abs >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.5e}", value)
    }
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "N/A".to_string())
}
