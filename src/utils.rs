use crate::error::{BenchError, Result};

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Parses sizes such as `1G`, `512m`, `4k` or a bare byte count.
///
/// Suffixes are binary multiples and case-insensitive; an optional trailing
/// `b`/`iB` is accepted (`1GiB`, `64kb`).
pub fn parse_size(size_str: &str) -> Result<u64> {
    let trimmed = size_str.trim();
    let lower = trimmed.to_ascii_lowercase();
    let lower = lower
        .strip_suffix("ib")
        .or_else(|| lower.strip_suffix('b'))
        .unwrap_or(&lower);

    let split = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, unit) = lower.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| BenchError::InvalidSize(size_str.to_string()))?;

    let shift = match unit {
        "" => 0,
        "k" => 10,
        "m" => 20,
        "g" => 30,
        "t" => 40,
        _ => return Err(BenchError::InvalidSize(size_str.to_string())),
    };

    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| BenchError::InvalidSize(size_str.to_string()))
}

/// Formats a byte count with binary units, e.g. `1.0GiB`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1G").unwrap(), 1073741824);
        assert_eq!(parse_size("512m").unwrap(), 536870912);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("2T").unwrap(), 2 * (1u64 << 40));
        assert_eq!(parse_size("1000").unwrap(), 1000);
        assert_eq!(parse_size("1GiB").unwrap(), 1073741824);
        assert_eq!(parse_size("64kb").unwrap(), 65536);
    }

    #[test]
    fn test_parse_size_rejects_unknown_units() {
        assert!(matches!(parse_size("1P"), Err(BenchError::InvalidSize(_))));
        assert!(matches!(parse_size("3x"), Err(BenchError::InvalidSize(_))));
        assert!(matches!(parse_size("G"), Err(BenchError::InvalidSize(_))));
        assert!(matches!(parse_size(""), Err(BenchError::InvalidSize(_))));
    }

    #[test]
    fn test_parse_size_overflow() {
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512.0B");
        assert_eq!(format_size(1536), "1.5KiB");
        assert_eq!(format_size(1073741824), "1.0GiB");
        assert_eq!(format_size(3 * (1u64 << 40)), "3.0TiB");
    }
}
