// Parsing and formatting helpers.
//
// All the forgiving number/date handling for incoming rows lives here so the
// rest of the crate can work with normalized, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`, tolerating the formatting noise that
/// shows up in spreadsheet exports.
///
/// - Trims whitespace and an optional leading `$`.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators (`,`) before parsing.
/// - Returns `None` for anything that cannot be parsed into a finite number.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim().trim_start_matches('$').trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    // `?` propagates None early, same as the other parsers.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // "3.0" is a common export artefact for integer columns.
    s.parse::<u32>().ok().or_else(|| {
        parse_f64_safe(Some(s))
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    })
}

/// Parse a head-count that may carry thousands separators (`"1,250"`).
///
/// Unlike [`parse_f64_safe`] this only accepts whole, non-negative numbers.
pub fn parse_count(s: &str) -> Option<u64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<u64>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // ISO first, then the day-first layout used by spreadsheet exports,
    // then timestamps whose time part is dropped.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Clamp a figure to the non-negative, finite range.
pub fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

pub fn average(sum: f64, count: usize) -> f64 {
    // Zero for an empty denominator instead of NaN.
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Cut `text` to at most `width` characters, appending `...` when anything
/// was removed. Counts characters, not bytes, so accented names stay valid.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width).collect();
    out.push_str("...");
    out
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimals plus `en` thousands separators,
    // e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        // Wider than u128 (f64 reaches ~1.8e308): group the digits as text.
        Err(_) => group_digits(int_part),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

// Insert `,` every three digits from the right.
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_currency(n: f64) -> String {
    format!("${}", format_number(n, 2))
}

pub fn format_percent(n: f64) -> String {
    format!("{:.1}%", n)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
