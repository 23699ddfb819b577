//! Value coercion - parsing and formatting detail values
//!
//! Every detail slot holds an optional [`Value`] whose variant is dictated by
//! the field's [`TypeTag`]. The functions here are the only way raw text turns
//! into typed values and back, and are shared by file I/O and editing. They
//! are pure: no I/O, no clock reads.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

use crate::schema::TypeTag;

/// Format used to store modification timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Leading currency symbols accepted (and dropped) when parsing a cost
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

/// Single-field coercion failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CoerceError {
    #[error("Invalid {tag} value '{text}': {reason}")]
    #[diagnostic(code(inventario::value::invalid_format))]
    InvalidFormat {
        text: String,
        tag: TypeTag,
        reason: String,
    },
}

impl CoerceError {
    fn invalid(text: &str, tag: TypeTag, reason: impl Into<String>) -> Self {
        CoerceError::InvalidFormat {
            text: text.to_string(),
            tag,
            reason: reason.into(),
        }
    }
}

/// A typed detail value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `STR` - kept verbatim
    Id(String),
    /// `str`
    Text(String),
    /// `int`
    Int(u64),
    /// `cost`, always rounded to cents
    Cost(f64),
    /// `value` - a magnitude with a unit; magnitude 0 means unset
    Measure { magnitude: f64, unit: String },
    /// `cat` - canonical spelling of one list entry
    Category(String),
    /// `DATE` - kept verbatim
    Created(String),
    /// `date`
    Modified(NaiveDateTime),
}

impl Value {
    /// Whether this variant is the one a field of `tag` stores
    pub fn fits(&self, tag: TypeTag) -> bool {
        matches!(
            (self, tag),
            (Value::Id(_), TypeTag::Id)
                | (Value::Text(_), TypeTag::Text)
                | (Value::Int(_), TypeTag::Int)
                | (Value::Cost(_), TypeTag::Cost)
                | (Value::Measure { .. }, TypeTag::Measure)
                | (Value::Category(_), TypeTag::Category(_))
                | (Value::Created(_), TypeTag::Created)
                | (Value::Modified(_), TypeTag::Modified)
        )
    }

    /// Numeric reading of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Cost(c) => Some(*c),
            Value::Measure { magnitude, .. } => Some(*magnitude),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Textual content of the string-like variants
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Id(s) | Value::Text(s) | Value::Category(s) | Value::Created(s) => Some(s),
            _ => None,
        }
    }

    /// A measure with magnitude 0 counts as unset
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Measure { magnitude, .. } if *magnitude == 0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

/// Parse raw text into a value of the given tag
pub fn parse(text: &str, tag: TypeTag) -> Result<Value, CoerceError> {
    match tag {
        TypeTag::Id => Ok(Value::Id(text.to_string())),
        TypeTag::Created => Ok(Value::Created(text.to_string())),
        TypeTag::Text => Ok(Value::Text(text.to_string())),
        TypeTag::Int => parse_int(text).map(Value::Int),
        TypeTag::Cost => parse_cost(text).map(Value::Cost),
        TypeTag::Measure => Ok(parse_measure(text)),
        TypeTag::Category(choices) => Ok(Value::Category(parse_category(text, choices))),
        TypeTag::Modified => parse_timestamp(text).map(Value::Modified),
    }
}

/// Format a value as the text stored in files and matched by filters
pub fn format(value: &Value) -> String {
    match value {
        Value::Id(s) | Value::Text(s) | Value::Category(s) | Value::Created(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Cost(c) => format!("{:.2}", c),
        Value::Measure { magnitude, unit } => format!("{} {}", magnitude, unit),
        Value::Modified(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Format a value for presentation, adding the currency symbol to costs
pub fn display(value: &Value, currency: &str) -> String {
    match value {
        Value::Cost(c) => format!("{}{:.2}", currency, c),
        other => format(other),
    }
}

/// Decode one stored cell into a slot value
///
/// Empty text is unset for every tag except `cat`, which falls back to the
/// first list entry. A measure with magnitude 0 is normalized to unset.
pub fn decode_cell(text: &str, tag: TypeTag) -> Result<Option<Value>, CoerceError> {
    if text.is_empty() && !matches!(tag, TypeTag::Category(_)) {
        return Ok(None);
    }
    let value = parse(text, tag)?;
    Ok(normalize(value))
}

/// Encode a slot value for storage; unset measures still write `"0 "`
pub fn encode_cell(value: Option<&Value>, tag: TypeTag) -> String {
    match (value, tag) {
        (Some(v), _) => format(v),
        (None, TypeTag::Measure) => format(&Value::Measure {
            magnitude: 0.0,
            unit: String::new(),
        }),
        (None, _) => String::new(),
    }
}

/// Drop values that only mean "unset"
pub fn normalize(value: Value) -> Option<Value> {
    if value.is_unset() {
        None
    } else {
        Some(value)
    }
}

/// Current local time truncated to whole seconds, so it survives a round trip
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn parse_int(text: &str) -> Result<u64, CoerceError> {
    let number: f64 = text
        .trim()
        .parse()
        .map_err(|_| CoerceError::invalid(text, TypeTag::Int, "not a number"))?;
    if !number.is_finite() {
        return Err(CoerceError::invalid(text, TypeTag::Int, "not a finite number"));
    }
    let rounded = number.round();
    if rounded < 0.0 {
        return Err(CoerceError::invalid(text, TypeTag::Int, "must not be negative"));
    }
    if rounded > u64::MAX as f64 {
        return Err(CoerceError::invalid(text, TypeTag::Int, "too large"));
    }
    Ok(rounded as u64)
}

fn parse_cost(text: &str) -> Result<f64, CoerceError> {
    let trimmed = text.trim().trim_start_matches(CURRENCY_SYMBOLS).trim();
    let number: f64 = trimmed
        .parse()
        .map_err(|_| CoerceError::invalid(text, TypeTag::Cost, "not a number"))?;
    if !number.is_finite() {
        return Err(CoerceError::invalid(text, TypeTag::Cost, "not a finite number"));
    }
    if number < 0.0 {
        return Err(CoerceError::invalid(text, TypeTag::Cost, "must not be negative"));
    }
    Ok((number * 100.0).round() / 100.0)
}

fn parse_measure(text: &str) -> Value {
    let text = text.trim_start();
    let (magnitude, unit) = text.split_once(' ').unwrap_or((text, ""));
    match magnitude.parse::<f64>() {
        Ok(magnitude) if magnitude.is_finite() => Value::Measure {
            magnitude,
            unit: unit.to_string(),
        },
        _ => Value::Measure {
            magnitude: 0.0,
            unit: String::new(),
        },
    }
}

fn parse_category(text: &str, choices: &[&str]) -> String {
    let wanted = text.trim();
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(wanted))
        .or_else(|| choices.first())
        .map(|choice| choice.to_string())
        .unwrap_or_else(|| wanted.to_string())
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, CoerceError> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            CoerceError::invalid(text, TypeTag::Modified, "expected YYYY-MM-DD HH:MM:SS")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATS: &[&str] = &["Component", "Tool", "Other"];

    #[test]
    fn test_int_rounds_through_float() {
        assert_eq!(parse("10", TypeTag::Int), Ok(Value::Int(10)));
        assert_eq!(parse("2.6", TypeTag::Int), Ok(Value::Int(3)));
        assert_eq!(parse(" 7.0 ", TypeTag::Int), Ok(Value::Int(7)));
    }

    #[test]
    fn test_int_rejects_bad_input() {
        assert!(parse("ten", TypeTag::Int).is_err());
        assert!(parse("-3", TypeTag::Int).is_err());
        assert!(parse("inf", TypeTag::Int).is_err());
        assert!(parse("", TypeTag::Int).is_err());
    }

    #[test]
    fn test_cost_parsing() {
        assert_eq!(parse("12.5", TypeTag::Cost), Ok(Value::Cost(12.5)));
        assert_eq!(parse("$0.333", TypeTag::Cost), Ok(Value::Cost(0.33)));
        assert_eq!(parse("€ 4", TypeTag::Cost), Ok(Value::Cost(4.0)));
        assert!(parse("-1", TypeTag::Cost).is_err());
        assert!(parse("cheap", TypeTag::Cost).is_err());
    }

    #[test]
    fn test_cost_format_and_display() {
        assert_eq!(format(&Value::Cost(3.0)), "3.00");
        assert_eq!(display(&Value::Cost(3.5), "€"), "€3.50");
        assert_eq!(display(&Value::Int(3), "€"), "3");
    }

    #[test]
    fn test_measure_splits_on_first_space() {
        assert_eq!(
            parse("4.7 kΩ", TypeTag::Measure),
            Ok(Value::Measure {
                magnitude: 4.7,
                unit: "kΩ".to_string()
            })
        );
        assert_eq!(
            parse("10 m s", TypeTag::Measure),
            Ok(Value::Measure {
                magnitude: 10.0,
                unit: "m s".to_string()
            })
        );
        assert_eq!(
            parse("5", TypeTag::Measure),
            Ok(Value::Measure {
                magnitude: 5.0,
                unit: String::new()
            })
        );
    }

    #[test]
    fn test_measure_bad_magnitude_defaults_to_zero() {
        let value = parse("lots V", TypeTag::Measure).unwrap();
        assert_eq!(
            value,
            Value::Measure {
                magnitude: 0.0,
                unit: String::new()
            }
        );
        assert!(value.is_unset());
    }

    #[test]
    fn test_measure_always_formats_with_unit_slot() {
        let value = Value::Measure {
            magnitude: 4.7,
            unit: "kΩ".to_string(),
        };
        assert_eq!(format(&value), "4.7 kΩ");
        assert_eq!(encode_cell(None, TypeTag::Measure), "0 ");
    }

    #[test]
    fn test_category_membership_and_fallback() {
        let tag = TypeTag::Category(CATS);
        assert_eq!(parse("tool", tag), Ok(Value::Category("Tool".to_string())));
        assert_eq!(parse("Gizmo", tag), Ok(Value::Category("Component".to_string())));
        assert_eq!(decode_cell("", tag), Ok(Some(Value::Category("Component".to_string()))));
    }

    #[test]
    fn test_id_and_created_pass_through() {
        assert_eq!(parse(" ab c", TypeTag::Id), Ok(Value::Id(" ab c".to_string())));
        assert_eq!(
            parse("yesterday", TypeTag::Created),
            Ok(Value::Created("yesterday".to_string()))
        );
    }

    #[test]
    fn test_modified_timestamp() {
        let value = parse("2024-03-01 12:30:05", TypeTag::Modified).unwrap();
        assert_eq!(format(&value), "2024-03-01 12:30:05");

        let date_only = parse("2024-03-01", TypeTag::Modified).unwrap();
        assert_eq!(format(&date_only), "2024-03-01 00:00:00");

        assert!(parse("March", TypeTag::Modified).is_err());
    }

    #[test]
    fn test_decode_cell_empty_is_unset() {
        assert_eq!(decode_cell("", TypeTag::Int), Ok(None));
        assert_eq!(decode_cell("", TypeTag::Text), Ok(None));
        assert_eq!(decode_cell("0 ", TypeTag::Measure), Ok(None));
        assert_eq!(decode_cell("3", TypeTag::Int), Ok(Some(Value::Int(3))));
    }

    #[test]
    fn test_encode_decode_cell_consistent() {
        let tag = TypeTag::Measure;
        let value = decode_cell("2.2 uF", tag).unwrap();
        assert_eq!(encode_cell(value.as_ref(), tag), "2.2 uF");
        assert_eq!(encode_cell(None, TypeTag::Text), "");
    }

    #[test]
    fn test_value_fits_tag() {
        assert!(Value::Int(1).fits(TypeTag::Int));
        assert!(!Value::Int(1).fits(TypeTag::Cost));
        assert!(Value::Category("Tool".into()).fits(TypeTag::Category(CATS)));
    }

    #[test]
    fn test_now_has_whole_seconds() {
        let ts = now();
        let text = format(&Value::Modified(ts));
        assert_eq!(parse(&text, TypeTag::Modified), Ok(Value::Modified(ts)));
    }
}
