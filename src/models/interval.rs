/// Length of a Binance interval label ("5m", "4h", "1d", "1w") in minutes.
pub fn interval_minutes(label: &str) -> Option<u32> {
    if label.len() < 2 {
        return None;
    }
    let (value, unit) = label.split_at(label.len() - 1);
    let value: u32 = value.parse().ok()?;
    if value == 0 {
        return None;
    }

    let factor = match unit {
        "m" => 1,
        "h" => 60,
        "d" => 60 * 24,
        "w" => 60 * 24 * 7,
        _ => return None,
    };
    value.checked_mul(factor)
}
