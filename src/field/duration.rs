use std::{sync::LazyLock, time::Duration};

use regex::Regex;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const MAX_FRACTION_DIGITS: usize = 18;

static DURATION_LITERAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9]+(?:\.[0-9]+)?(?:ns|us|µs|ms|s|m|h))+$").ok());

static DURATION_PART: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([0-9]+)(?:\.([0-9]+))?(ns|us|µs|ms|s|m|h)").ok());

/// Parses a duration literal such as `"1h30m"`, `"250ms"` or `"1.5s"`.
///
/// Returns `None` for anything that is not entirely made of
/// `<number><unit>` parts, or that overflows [`Duration`].
pub fn parse_duration(literal: &str) -> Option<Duration> {
    let (Some(whole), Some(part)) = (DURATION_LITERAL.as_ref(), DURATION_PART.as_ref()) else {
        return None;
    };
    if !whole.is_match(literal) {
        return None;
    }

    let mut total: u128 = 0;
    for caps in part.captures_iter(literal) {
        let unit = unit_nanos(caps.get(3)?.as_str())?;
        let integer: u128 = caps.get(1)?.as_str().parse().ok()?;
        let mut nanos = integer.checked_mul(unit)?;

        if let Some(fraction) = caps.get(2) {
            let digits = &fraction.as_str()[..fraction.as_str().len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits.parse().ok()?;
            let denominator = 10u128.checked_pow(u32::try_from(digits.len()).ok()?)?;
            nanos = nanos.checked_add(numerator.checked_mul(unit)? / denominator)?;
        }

        total = total.checked_add(nanos)?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    let subsec = u32::try_from(total % NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, subsec))
}

/// Formats a duration as the literal accepted by [`parse_duration`].
///
/// Zero components are omitted, so 90 seconds formats as `"1m30s"` and
/// zero formats as `"0s"`.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    let parts = [
        (secs / 3600, "h"),
        ((secs % 3600) / 60, "m"),
        (secs % 60, "s"),
        (u64::from(nanos / 1_000_000), "ms"),
        (u64::from((nanos / 1_000) % 1_000), "us"),
        (u64::from(nanos % 1_000), "ns"),
    ];

    parts
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect()
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}
