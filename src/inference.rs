//! Attribute type inference for XML -> ABX conversion.
//!
//! Each predicate is tried in order; the first match picks the ABX type.
//! The policy keeps round-trip XML equality for common attribute shapes
//! while reusing the interned pool on small, repeated tokens.

/// Decimal strings at or above this length are kept as strings, so long
/// certificate/key digit runs never get captured as integers.
const DECIMAL_LENGTH_LIMIT: usize = 15;

/// Values shorter than this, without spaces or hyphens, are interned.
/// Hyphenated identifiers (UUIDs, package names) stay plain strings since
/// the pool is capacity-limited and their reuse likelihood is low.
const INTERN_LENGTH_LIMIT: usize = 50;

/// The ABX-typed interpretation of an XML attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum InferredValue {
    Boolean(bool),
    IntHex(i32),
    LongHex(i64),
    Int(i32),
    Long(i64),
    Float(f32),
    InternedString,
    String,
}

/// Map an attribute string to the tightest ABX attribute type.
pub fn infer_attribute(value: &str) -> InferredValue {
    if value == "true" {
        return InferredValue::Boolean(true);
    }
    if value == "false" {
        return InferredValue::Boolean(false);
    }

    if let Some((negative, digits)) = hex_literal(value) {
        if digits.len() <= 8 {
            if let Some(v) = parse_hex_int(negative, digits) {
                return InferredValue::IntHex(v);
            }
        } else if let Some(v) = parse_hex_long(negative, digits) {
            return InferredValue::LongHex(v);
        }
        // unparseable hex falls through to the remaining predicates
    }

    if decimal_literal(value) && value.len() < DECIMAL_LENGTH_LIMIT {
        if let Ok(v) = value.parse::<i32>() {
            return InferredValue::Int(v);
        }
        if let Ok(v) = value.parse::<i64>() {
            return InferredValue::Long(v);
        }
    }

    if float_literal(value) {
        if let Ok(v) = value.parse::<f32>() {
            if v.is_finite() {
                return InferredValue::Float(v);
            }
        }
    }

    if value.len() < INTERN_LENGTH_LIMIT && !value.contains(' ') && !value.contains('-') {
        return InferredValue::InternedString;
    }

    InferredValue::String
}

/// True when the string is entirely whitespace (or empty).
pub fn is_whitespace_only(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace())
}

/// Match `^-?0[xX][0-9a-fA-F]+$`, returning the sign and the digit run.
fn hex_literal(s: &str) -> Option<(bool, &str)> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((negative, digits))
}

/// Parse up to 8 hex digits into an `i32`. Positive values adopt the
/// unsigned bit pattern, so `0xffffffff` becomes -1.
fn parse_hex_int(negative: bool, digits: &str) -> Option<i32> {
    let raw = u32::from_str_radix(digits, 16).ok()?;
    if negative {
        let value = -(raw as i64);
        if value < i32::MIN as i64 {
            None
        } else {
            Some(value as i32)
        }
    } else {
        Some(raw as i32)
    }
}

/// Parse up to 16 hex digits into an `i64`, unsigned bit pattern for
/// positive values.
fn parse_hex_long(negative: bool, digits: &str) -> Option<i64> {
    if digits.len() > 16 {
        return None;
    }
    let raw = u64::from_str_radix(digits, 16).ok()?;
    if negative {
        let value = -(raw as i128);
        if value < i64::MIN as i128 {
            None
        } else {
            Some(value as i64)
        }
    } else {
        Some(raw as i64)
    }
}

/// Match `^-?[0-9]+$`.
fn decimal_literal(s: &str) -> bool {
    let rest = s.strip_prefix('-').unwrap_or(s);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

/// Match `^-?[0-9]+\.[0-9]+$` (single dot required).
fn float_literal(s: &str) -> bool {
    let rest = s.strip_prefix('-').unwrap_or(s);
    match rest.split_once('.') {
        Some((int_part, frac_part)) => {
            !int_part.is_empty()
                && !frac_part.is_empty()
                && int_part.bytes().all(|b| b.is_ascii_digit())
                && frac_part.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans() {
        assert_eq!(infer_attribute("true"), InferredValue::Boolean(true));
        assert_eq!(infer_attribute("false"), InferredValue::Boolean(false));
        // only exact matches count
        assert_eq!(infer_attribute("True"), InferredValue::InternedString);
    }

    #[test]
    fn test_hex_int() {
        assert_eq!(infer_attribute("0xff"), InferredValue::IntHex(255));
        assert_eq!(infer_attribute("0XFF"), InferredValue::IntHex(255));
        assert_eq!(infer_attribute("-0x10"), InferredValue::IntHex(-16));
        // 8 digits adopt the unsigned bit pattern
        assert_eq!(infer_attribute("0xffffffff"), InferredValue::IntHex(-1));
        assert_eq!(
            infer_attribute("-0x80000000"),
            InferredValue::IntHex(i32::MIN)
        );
    }

    #[test]
    fn test_hex_long() {
        assert_eq!(infer_attribute("0x1ffffffff"), InferredValue::LongHex(0x1_ffff_ffff));
        assert_eq!(
            infer_attribute("0xffffffffffffffff"),
            InferredValue::LongHex(-1)
        );
        // 17 digits cannot parse; hyphen-free short value gets interned
        assert_eq!(
            infer_attribute("0x1ffffffffffffffff"),
            InferredValue::InternedString
        );
    }

    #[test]
    fn test_hex_overflowing_negative_falls_through() {
        // -0x80000001 fits neither i32 nor the fall-through numeric shapes;
        // the hyphen keeps it out of the interned pool too.
        assert_eq!(infer_attribute("-0x80000001"), InferredValue::String);
    }

    #[test]
    fn test_decimal_int_and_long() {
        assert_eq!(infer_attribute("42"), InferredValue::Int(42));
        assert_eq!(infer_attribute("-42"), InferredValue::Int(-42));
        assert_eq!(infer_attribute("0"), InferredValue::Int(0));
        assert_eq!(
            infer_attribute("4294967296"),
            InferredValue::Long(4294967296)
        );
    }

    #[test]
    fn test_decimal_length_guard() {
        // 14 digits still parse
        assert_eq!(
            infer_attribute("99999999999999"),
            InferredValue::Long(99_999_999_999_999)
        );
        // 15 digits are treated as an identifier, not a number
        assert_eq!(
            infer_attribute("999999999999999"),
            InferredValue::InternedString
        );
    }

    #[test]
    fn test_float() {
        assert_eq!(infer_attribute("3.14"), InferredValue::Float(3.14));
        assert_eq!(infer_attribute("-0.5"), InferredValue::Float(-0.5));
        // scientific notation is not a float literal here
        assert_eq!(infer_attribute("1.5e10"), InferredValue::InternedString);
        // two dots
        assert_eq!(infer_attribute("1.2.3"), InferredValue::InternedString);
        // bare dot forms
        assert_eq!(infer_attribute(".5"), InferredValue::InternedString);
        assert_eq!(infer_attribute("5."), InferredValue::InternedString);
    }

    #[test]
    fn test_interned_vs_plain_string() {
        assert_eq!(infer_attribute("enabled"), InferredValue::InternedString);
        assert_eq!(infer_attribute("has space"), InferredValue::String);
        assert_eq!(
            infer_attribute("550e8400-e29b-41d4-a716-446655440000"),
            InferredValue::String
        );
        let long = "x".repeat(50);
        assert_eq!(infer_attribute(&long), InferredValue::String);
        let just_under = "x".repeat(49);
        assert_eq!(infer_attribute(&just_under), InferredValue::InternedString);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(is_whitespace_only("  \n\t"));
        assert!(is_whitespace_only(""));
        assert!(!is_whitespace_only(" a "));
    }
}
