//! Number formatting for user-facing figures.

pub const CURRENCY_LABEL: &str = "INR";

/// Two decimals with international thousands grouping: `8,017,145.48`.
pub fn grouped(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

/// A currency amount, e.g. `INR 1,500.00`.
pub fn inr(value: f64) -> String {
    format!("{CURRENCY_LABEL} {}", grouped(value))
}

/// Whole units with grouping and no decimals, truncated toward zero.
pub fn units(value: f64) -> String {
    let g = grouped(value.trunc());
    g.trim_end_matches(".00").to_string()
}

#[cfg(test)]
mod tests {
    use super::{grouped, inr, units};

    #[test]
    fn grouping_is_international() {
        assert_eq!(grouped(8_017_145.478), "8,017,145.48");
        assert_eq!(grouped(999.999), "1,000.00");
        assert_eq!(grouped(0.0), "0.00");
        assert_eq!(grouped(-1234.5), "-1,234.50");
        assert_eq!(grouped(-0.001), "0.00");
    }

    #[test]
    fn currency_and_units() {
        assert_eq!(inr(1500.0), "INR 1,500.00");
        assert_eq!(units(12_345.9), "12,345");
    }
}
