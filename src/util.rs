// Parsing and formatting helpers.
//
// Cell parsing is forgiving about whitespace and thousands separators but
// never guesses: anything that does not parse cleanly comes back as `None`
// and the loader reports it.
use num_format::{Locale, ToFormattedString};

use crate::config::{MILLION, THOUSAND};

/// Largest magnitude below which every integral `f64` is exact (2^53).
const F64_EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Parse a numeric cell into `f64`, accepting `"1,234.5"` style exports.
///
/// Rejects empty cells, alphabetic content, and non-finite results.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let v = s.replace(',', "").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_i64_safe(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Exports from decimal columns sometimes render integers as `2019.0`.
    // Float forms outside the exact range would saturate on `as`, so they fail.
    s.parse::<i64>().ok().or_else(|| {
        let f = s.parse::<f64>().ok()?;
        (f.is_finite() && f.fract() == 0.0 && f.abs() < F64_EXACT_INT_LIMIT).then_some(f as i64)
    })
}

pub fn parse_u64_safe(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    u64::try_from(parse_i64_safe(&s)?).ok()
}

/// Voided flags arrive as `0/1` from MySQL or `true/false` from other exports.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Some(true),
        "0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

/// Human-readable magnitude for headline counts.
///
/// Whole millions print without decimals, other values above a million get
/// one decimal, and everything else is truncated to whole thousands.
pub fn format_magnitude(n: u64) -> String {
    if n >= MILLION && n % MILLION == 0 {
        format!("{} M", n / MILLION)
    } else if n > MILLION {
        format!("{:.1} M", n as f64 / MILLION as f64)
    } else {
        format!("{} K", n / THOUSAND)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `en` thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
