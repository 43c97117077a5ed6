/// Unit marker appended to abbreviated counts ("bin", thousand).
pub const THOUSANDS_SUFFIX: &str = "B";

/// Format a counter exactly as it was typed into the form.
///
/// Empty input shows `0`, text that is not a number is shown as-is, values
/// below one thousand keep their original spelling, and larger values are
/// abbreviated by [`abbreviate`].
pub fn format_count(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return "0".to_string(),
    };

    match parse_count(raw) {
        Some(value) if value < 1000.0 => raw.to_string(),
        Some(value) => abbreviate(value),
        None => raw.to_string(),
    }
}

/// Format an integer count, e.g. one coming from the lookup service.
pub fn format_number(n: u64) -> String {
    if n < 1000 {
        n.to_string()
    } else {
        abbreviate(n as f64)
    }
}

fn parse_count(raw: &str) -> Option<f64> {
    // `f64::from_str` also accepts "inf" and "NaN"; neither is a count.
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Thousands abbreviation with at most one decimal digit.
///
/// The fractional digits of `value / 1000` are compared as a number against
/// 100, so only quotients with three or more significant fractional digits
/// show a decimal: 1234 is `1,2 B` while 1500 is `1 B`.
fn abbreviate(value: f64) -> String {
    let scaled = shortest_decimal(value / 1000.0);
    let (int_part, frac_part) = match scaled.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (scaled.as_str(), None),
    };

    let first_digit = frac_part
        .filter(|frac| frac.parse::<f64>().is_ok_and(|v| v > 100.0))
        .and_then(|frac| frac.chars().next());

    match first_digit {
        Some(digit) => format!("{int_part},{digit} {THOUSANDS_SUFFIX}"),
        None => format!("{int_part} {THOUSANDS_SUFFIX}"),
    }
}

/// Shortest round-trip decimal string, switching to `1e+21` style
/// exponent notation from 1e21 upwards.
fn shortest_decimal(value: f64) -> String {
    if value.abs() >= 1e21 {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{mantissa}e+{power}")
            }
            _ => exp,
        }
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(format_count(None), "0");
        assert_eq!(format_count(Some("")), "0");
        assert_eq!(format_count(Some("0")), "0");
        assert_eq!(format_number(0), "0");
    }

    #[test]
    fn test_below_thousand_is_verbatim() {
        for n in [1u64, 7, 42, 100, 512, 999] {
            assert_eq!(format_number(n), n.to_string());
            assert_eq!(format_count(Some(&n.to_string())), n.to_string());
        }
        assert_eq!(format_count(Some("007")), "007");
        assert_eq!(format_count(Some("-5")), "-5");
    }

    #[test]
    fn test_thousand_boundaries() {
        assert_eq!(format_count(Some("999")), "999");
        assert_eq!(format_count(Some("1000")), "1 B");
        assert_eq!(format_number(1000), "1 B");
    }

    #[test]
    fn test_fraction_compared_as_number() {
        assert_eq!(format_number(1500), "1 B");
        assert_eq!(format_number(1050), "1 B");
        assert_eq!(format_number(1100), "1 B");
        assert_eq!(format_number(1101), "1,1 B");
        assert_eq!(format_number(1234), "1,2 B");
        assert_eq!(format_number(12345), "12,3 B");
        assert_eq!(format_number(999_999), "999,9 B");
        assert_eq!(format_number(1_000_000), "1000 B");
    }

    #[test]
    fn test_non_numeric_text_is_shown_as_is() {
        assert_eq!(format_count(Some("   ")), "   ");
        assert_eq!(format_count(Some("abc")), "abc");
        assert_eq!(format_count(Some("NaN")), "NaN");
        assert_eq!(format_count(Some("inf")), "inf");
        assert_eq!(format_count(Some("12k")), "12k");
    }

    #[test]
    fn test_huge_values_use_exponent_notation() {
        assert_eq!(shortest_decimal(1e21), "1e+21");
        assert_eq!(shortest_decimal(1.5e22), "1.5e+22");
        assert_eq!(shortest_decimal(2.5), "2.5");
    }
}
