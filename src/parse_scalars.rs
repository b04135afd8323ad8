//! Scalar text conversions used by the primitive fields.

/// Tokens accepted as `true`. Matching is case-sensitive.
pub(crate) const TRUE_TOKENS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "true", "True", "TRUE", "on", "On", "ON",
];

/// Tokens accepted as `false`. Matching is case-sensitive.
pub(crate) const FALSE_TOKENS: &[&str] = &[
    "n", "N", "no", "No", "NO", "false", "False", "FALSE", "off", "Off", "OFF",
];

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    if TRUE_TOKENS.contains(&s) {
        Some(true)
    } else if FALSE_TOKENS.contains(&s) {
        Some(false)
    } else {
        None
    }
}

/// Accumulate digits of `radix`. Single `_` separators may sit between digits,
/// or right after a radix prefix when `prefixed`.
fn parse_digits_i128(digits: &str, radix: u32, prefixed: bool) -> Option<i128> {
    let digits = if prefixed {
        digits.strip_prefix('_').unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty() || digits.split('_').any(str::is_empty) {
        return None;
    }
    let mut val: i128 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        let d = c.to_digit(radix)?;
        val = val.checked_mul(radix as i128)?;
        val = val.checked_add(d as i128)?;
    }
    Some(val)
}

fn strip_radix_prefix(s: &str) -> Option<(u32, &str)> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };
    Some((radix, &s[2..]))
}

/// Parse an integer in `base`.
///
/// Base `0` detects the radix from a `0x`/`0o`/`0b` prefix and otherwise reads a
/// decimal number, rejecting leading zeros on non-zero values. Bases 2, 8 and 16
/// accept their own prefix. Other bases range from 2 to 36.
pub(crate) fn parse_int(s: &str, base: u32) -> Option<i64> {
    let t = s.trim();
    let (neg, rest) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };

    let (radix, digits, prefixed) = match (base, strip_radix_prefix(rest)) {
        (0, Some((radix, digits))) => (radix, digits, true),
        (0, None) => {
            let significant = rest.trim_start_matches(['0', '_']);
            if rest.starts_with('0') && !significant.is_empty() {
                return None;
            }
            (10, rest, false)
        }
        (base, Some((radix, digits))) if base == radix => (radix, digits, true),
        (2..=36, _) => (base, rest, false),
        _ => return None,
    };

    let magnitude = parse_digits_i128(digits, radix, prefixed)?;
    let value = if neg { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Parse a float, accepting the YAML `.inf` and `.nan` spellings.
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    let t = s.trim();
    match t.to_ascii_lowercase().as_str() {
        ".nan" | "+.nan" | "-.nan" => Some(f64::NAN),
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        _ => t.parse::<f64>().ok(),
    }
}
