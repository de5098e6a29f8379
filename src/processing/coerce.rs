//! Typed coercion of raw cells.

use crate::error::{TransformationError, TransformationResult};
use crate::types::{DataType, Value};

/// Coerce a raw cell into `data_type`.
///
/// Raw cells are text or [`Value::Null`]; null stays null. `row` is the source line used in error
/// messages.
pub(crate) fn coerce(row: usize, column: &str, data_type: DataType, value: &Value) -> TransformationResult<Value> {
    let Some(raw) = value.as_str() else {
        return Ok(Value::Null);
    };
    let trimmed = raw.trim();

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => parse_int(trimmed)
            .map(Value::Int64)
            .map_err(|message| parse_error(row, column, raw, message)),
        DataType::Float64 => parse_float(trimmed)
            .map(Value::Float64)
            .map_err(|message| parse_error(row, column, raw, message)),
    }
}

/// Integers may be written with an integral decimal part (`"39.0"`), as spreadsheet exports do.
fn parse_int(s: &str) -> Result<i64, String> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        Ok(_) => Err("expected an integer".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_float(s: &str) -> Result<f64, String> {
    let f = s.parse::<f64>().map_err(|e| e.to_string())?;
    if f.is_finite() {
        Ok(f)
    } else {
        Err("expected a finite number".to_string())
    }
}

fn parse_error(row: usize, column: &str, raw: &str, message: String) -> TransformationError {
    TransformationError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    }
}

pub(crate) fn as_int(v: Value) -> Option<i64> {
    match v {
        Value::Int64(i) => Some(i),
        _ => None,
    }
}

pub(crate) fn as_float(v: Value) -> Option<f64> {
    match v {
        Value::Float64(f) => Some(f),
        _ => None,
    }
}

pub(crate) fn as_text(v: Value) -> Option<String> {
    match v {
        Value::Utf8(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    #[test]
    fn null_stays_null_for_every_type() {
        for dt in [DataType::Int64, DataType::Float64, DataType::Utf8] {
            assert_eq!(coerce(2, "c", dt, &Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn integers_accept_integral_decimals() {
        assert_eq!(coerce(2, "age", DataType::Int64, &text("39")).unwrap(), Value::Int64(39));
        assert_eq!(coerce(2, "age", DataType::Int64, &text("39.0")).unwrap(), Value::Int64(39));
        let err = coerce(2, "age", DataType::Int64, &text("39.5")).unwrap_err();
        assert!(err.to_string().contains("expected an integer"), "got: {err}");
    }

    #[test]
    fn floats_accept_leading_dot_and_reject_nan() {
        assert_eq!(
            coerce(2, "fg_pct", DataType::Float64, &text(".512")).unwrap(),
            Value::Float64(0.512)
        );
        assert_eq!(coerce(2, "pts", DataType::Float64, &text("0")).unwrap(), Value::Float64(0.0));
        assert!(coerce(2, "pts", DataType::Float64, &text("NaN")).is_err());
    }

    #[test]
    fn parse_error_carries_location() {
        let err = coerce(7, "points", DataType::Float64, &text("twenty")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 7"), "got: {msg}");
        assert!(msg.contains("column 'points'"), "got: {msg}");
        assert!(msg.contains("raw='twenty'"), "got: {msg}");
    }
}
