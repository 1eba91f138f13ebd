/// Format an integer with comma thousands separators: 1234567 → "1,234,567"
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Quote volume in whole millions (truncated), e.g. 2_345_678_901.0 → "2,345M"
pub fn millions(quote_volume: f64) -> String {
    let whole = if quote_volume.is_finite() {
        (quote_volume / 1_000_000.0).trunc() as i64
    } else {
        0
    };
    format!("{}M", group_thousands(whole))
}

/// Percentage with two decimals, e.g. -3.4119 → "-3.41%"
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-45_000), "-45,000");
    }

    #[test]
    fn test_millions_truncates() {
        assert_eq!(millions(0.0), "0M");
        assert_eq!(millions(999_999.0), "0M");
        assert_eq!(millions(12_900_000.0), "12M");
        assert_eq!(millions(2_345_678_901.0), "2,345M");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.0), "0.00%");
        assert_eq!(percent(-3.4119), "-3.41%");
        assert_eq!(percent(12.5), "12.50%");
    }
}
