//! Text → [`Field`] conversion (§4.1): tokenizing, per-segment grammar, and the
//! vixie-cron "step without range" quirk.

use alloc::vec::Vec;
use core::fmt;

use crate::field::{Atom, Field, MAX_ATOMS};

/// Maximum accepted length of a whole schedule expression, in bytes (§4.1, §6).
pub const MAX_EXPRESSION_LEN: usize = 512;

/// The seven fields of a schedule, in fixed order (§3).
pub const FIELD_COUNT: usize = 7;

/// `(min, max)` bounds per field index, in schedule order.
pub const FIELD_BOUNDS: [(u32, u32); FIELD_COUNT] = [
    (0, 999_999_999), // nanosecond
    (0, 59),          // second
    (0, 59),          // minute
    (0, 23),          // hour
    (1, 31),          // day-of-month
    (1, 12),          // month
    (0, 6),           // day-of-week, 0 = Sunday
];

/// Everything that can go wrong while turning schedule text into [`Field`]s (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The expression exceeded [`MAX_EXPRESSION_LEN`] bytes.
    TooLong,
    /// The expression did not tokenize into exactly [`FIELD_COUNT`] fields.
    WrongFieldCount,
    /// A comma-separated segment was empty (`"1,,2"`).
    EmptySegment,
    /// A field carried more than [`MAX_ATOMS`] segments.
    TooManyAtoms,
    /// A numeric literal had no digits, a sign, or overflowed its representable range.
    InvalidNumber,
    /// A `v-w` range had `w < v`.
    InvertedRange,
    /// A value fell outside the field's declared `[min, max]`.
    OutOfBounds,
    /// A `/<step>` stride was zero or exceeded `2^32 - 1`.
    InvalidStep,
    /// A segment matched none of the accepted grammar forms.
    Malformed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "schedule expression exceeds {MAX_EXPRESSION_LEN} bytes"),
            Self::WrongFieldCount => write!(f, "expected exactly {FIELD_COUNT} fields"),
            Self::EmptySegment => write!(f, "empty segment between commas"),
            Self::TooManyAtoms => write!(f, "field has more than {MAX_ATOMS} segments"),
            Self::InvalidNumber => write!(f, "invalid or overflowing number"),
            Self::InvertedRange => write!(f, "range end is less than range start"),
            Self::OutOfBounds => write!(f, "value out of field bounds"),
            Self::InvalidStep => write!(f, "step must be between 1 and 2^32 - 1"),
            Self::Malformed => write!(f, "segment matches no accepted grammar form"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Parses a whole 7-field schedule expression into its [`Field`]s, in schedule order.
///
/// # Errors
/// Returns a [`ParseError`] on any grammar violation; leaves no partial state (§4.1, §7).
pub fn parse_expression(expr: &str) -> Result<[Field; FIELD_COUNT], ParseError> {
    if expr.len() > MAX_EXPRESSION_LEN {
        return Err(ParseError::TooLong);
    }
    let tokens: Vec<&str> = expr.split_ascii_whitespace().collect();
    if tokens.len() != FIELD_COUNT {
        return Err(ParseError::WrongFieldCount);
    }
    let mut fields: Vec<Field> = Vec::with_capacity(FIELD_COUNT);
    for (token, &(min, max)) in tokens.iter().zip(FIELD_BOUNDS.iter()) {
        fields.push(parse_field(token, min, max)?);
    }
    let mut iter = fields.into_iter();
    // `FIELD_COUNT` elements were just pushed one per bound, so every `next()` below succeeds;
    // `unwrap_or_else` with an atom covering nothing is unreachable but keeps this panic-free.
    let unreachable = || Field::new(Vec::new(), false);
    Ok([
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
        iter.next().unwrap_or_else(unreachable),
    ])
}

/// Parses one field token under `[min, max]` bounds (§4.1).
///
/// # Errors
/// Returns a [`ParseError`] on any grammar violation.
pub fn parse_field(token: &str, min: u32, max: u32) -> Result<Field, ParseError> {
    if token.is_empty() {
        return Err(ParseError::EmptySegment);
    }
    let is_wildcard = token == "*";
    let mut atoms: Vec<Atom> = Vec::with_capacity(MAX_ATOMS);
    for segment in token.split(',') {
        if segment.is_empty() {
            return Err(ParseError::EmptySegment);
        }
        if atoms.len() >= MAX_ATOMS {
            return Err(ParseError::TooManyAtoms);
        }
        atoms.push(parse_segment(segment, min, max)?);
    }
    Ok(Field::new(atoms, is_wildcard))
}

/// Parses one `,`-delimited segment into a single [`Atom`] (§4.1 rules 1-5).
fn parse_segment(segment: &str, min: u32, max: u32) -> Result<Atom, ParseError> {
    if segment == "*" {
        return Ok(Atom {
            start: min,
            end: max,
            step: 1,
        });
    }

    if let Some(step_text) = segment.strip_prefix("*/") {
        let step = parse_step(step_text)?;
        return Ok(Atom {
            start: min,
            end: max,
            step,
        });
    }

    let first = segment
        .bytes()
        .next()
        .ok_or(ParseError::EmptySegment)?;
    if !first.is_ascii_digit() {
        return Err(ParseError::Malformed);
    }

    // Split off an optional trailing "/<step>".
    let (range_part, step) = match segment.split_once('/') {
        Some((range_part, step_text)) => (range_part, Some(parse_step(step_text)?)),
        None => (segment, None),
    };

    let (start, end, had_explicit_range) = match range_part.split_once('-') {
        Some((start_text, end_text)) => {
            let start = parse_number(start_text, min, max)?;
            let end = parse_number(end_text, min, max)?;
            if end < start {
                return Err(ParseError::InvertedRange);
            }
            (start, end, true)
        }
        None => {
            let value = parse_number(range_part, min, max)?;
            (value, value, false)
        }
    };

    match step {
        None => Ok(Atom {
            start,
            end,
            step: 1,
        }),
        Some(step) if step > 1 && !had_explicit_range => {
            // Step-without-range quirk (§4.1 rule 5): "10/5" means "10, 15, ..., max".
            Ok(Atom {
                start,
                end: max,
                step,
            })
        }
        Some(step) => Ok(Atom { start, end, step }),
    }
}

/// Parses the digits after a `/`, enforcing `1 <= step <= 2^32 - 1`.
fn parse_step(text: &str) -> Result<u32, ParseError> {
    let step = parse_unsigned(text)?;
    if step == 0 {
        return Err(ParseError::InvalidStep);
    }
    Ok(step)
}

/// Parses a bounded decimal literal, rejecting signs, overflow, and out-of-range values.
fn parse_number(text: &str, min: u32, max: u32) -> Result<u32, ParseError> {
    let value = parse_unsigned(text)?;
    if value < min || value > max {
        return Err(ParseError::OutOfBounds);
    }
    Ok(value)
}

/// Parses an unsigned decimal literal with no sign, no leading `+`, no whitespace.
fn parse_unsigned(text: &str) -> Result<u32, ParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber);
    }
    let mut value: u32 = 0;
    for byte in text.bytes() {
        let digit = u32::from(byte - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseError::InvalidNumber)?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn values(field: &Field, min: u32, max: u32) -> Vec<u32> {
        (min..=max).filter(|&v| field.matches(v)).collect()
    }

    macro_rules! parse_field_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, min, max, expected): (&str, u32, u32, Vec<u32>) = $value;
                    let field = parse_field(input, min, max).unwrap();
                    assert_eq!(values(&field, min, max), expected);
                }
            )*
        }
    }

    parse_field_tests! {
        parse_minutes_0: ("0", 0, 59, vec![0]),
        parse_hours: ("23", 0, 23, vec![23]),
        parse_days: ("31", 1, 31, vec![31]),
        parse_every_30: ("*/30", 0, 59, vec![0, 30]),
        parse_every_5_minutes: ("*/5", 0, 59, vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55]),
        parse_range_5_10: ("5-10", 0, 59, vec![5, 6, 7, 8, 9, 10]),
        parse_list: ("15,30,45,0", 0, 59, vec![0, 15, 30, 45]),
        parse_repeat_values: ("1,1,1,1,2", 0, 59, vec![1, 2]),
        parse_range_and_list: ("1-8,11,9,4,5", 0, 23, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 11]),
        parse_range_list_step: ("*/30,40-45,57", 0, 59, vec![0, 30, 40, 41, 42, 43, 44, 45, 57]),
        parse_start_step_minute: ("1/6", 0, 59, vec![1, 7, 13, 19, 25, 31, 37, 43, 49, 55]),
        parse_range_with_step: ("5-40/3", 0, 59, vec![5, 8, 11, 14, 17, 20, 23, 26, 29, 32, 35, 38]),
        parse_step_one_without_range_is_a_single_value: ("6/1", 0, 23, vec![6]),
    }

    #[test]
    fn wildcard_sets_the_field_marker_only_for_bare_star() {
        assert!(parse_field("*", 0, 59).unwrap().is_wildcard());
        assert!(!parse_field("0-59", 0, 59).unwrap().is_wildcard());
        assert!(!parse_field("*/5", 0, 59).unwrap().is_wildcard());
        assert!(!parse_field("1,2", 0, 59).unwrap().is_wildcard());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            parse_expression("* * * * *").unwrap_err(),
            ParseError::WrongFieldCount
        );
        assert_eq!(
            parse_expression("* * * * * * * *").unwrap_err(),
            ParseError::WrongFieldCount
        );
    }

    #[test]
    fn rejects_empty_expression() {
        assert_eq!(
            parse_expression("").unwrap_err(),
            ParseError::WrongFieldCount
        );
    }

    #[test]
    fn rejects_value_overflowing_field() {
        assert_eq!(
            parse_field("1000000000", 0, 999_999_999).unwrap_err(),
            ParseError::OutOfBounds
        );
    }

    #[test]
    fn rejects_non_numeric_token() {
        assert_eq!(parse_field("abc", 0, 59).unwrap_err(), ParseError::Malformed);
    }

    #[test]
    fn rejects_value_out_of_declared_bounds() {
        assert_eq!(parse_field("60", 0, 59).unwrap_err(), ParseError::OutOfBounds);
    }

    #[test]
    fn rejects_too_long_expression() {
        let expr = "0 ".repeat(300);
        assert_eq!(parse_expression(&expr).unwrap_err(), ParseError::TooLong);
    }

    #[test]
    fn rejects_empty_segment_after_comma() {
        assert_eq!(parse_field("1,,2", 0, 59).unwrap_err(), ParseError::EmptySegment);
    }

    #[test]
    fn rejects_inverted_range() {
        assert_eq!(parse_field("10-5", 0, 59).unwrap_err(), ParseError::InvertedRange);
    }

    #[test]
    fn rejects_zero_step() {
        assert_eq!(parse_field("*/0", 0, 59).unwrap_err(), ParseError::InvalidStep);
    }

    #[test]
    fn numeric_overflow_during_accumulation_is_a_parse_failure() {
        assert_eq!(
            parse_field("99999999999999999999", 0, 59).unwrap_err(),
            ParseError::InvalidNumber
        );
    }
}
