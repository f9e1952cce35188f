//! # Typed Value Codec
//!
//! Conversion between a field's textual representation and its typed value.
//! Parsing never panics and never touches a record: a failure is returned as
//! [`InvalidFormat`] and the caller keeps the stored value untouched.

use std::fmt::Write;

use protoedit_schema::{EnumValue, FieldType, SchemaPool};

use crate::{InvalidFormat, Value};

/// Longest accepted run of digits for 32-bit integers
pub const MAX_INTEGER_DIGITS: usize = 10;

/// Bytes rendered per line by [`hex_dump`]
pub const HEX_BYTES_PER_LINE: usize = 64;

/// Parse text into a value of the given field type
pub fn parse(pool: &SchemaPool, field_type: &FieldType, text: &str) -> Result<Value, InvalidFormat> {
    match field_type {
        FieldType::Int32 => parse_int32(text).map(Value::Int32),
        FieldType::Uint32 => parse_uint32(text).map(Value::Uint32),
        FieldType::Float => parse_float(text).map(Value::Float),
        FieldType::Double => parse_double(text).map(Value::Double),
        FieldType::Bool => parse_bool(text).map(Value::Bool),
        FieldType::String => Ok(Value::String(text.to_string())),
        FieldType::Enum { index } => {
            resolve_enum(&pool.enumeration(*index).values, text).map(Value::Enum)
        }
        FieldType::Bytes => Err(InvalidFormat::new(text, "bytes value (bytes are replaced, not typed)")),
        FieldType::Message { .. } => Err(InvalidFormat::new(text, "scalar (field is a message)")),
        FieldType::Unsupported { name } => Err(InvalidFormat::new(text, name.as_str())),
    }
}

/// Canonical text of a value
///
/// Enums render as their declared name, or as the bare number when the
/// value is not declared. Bytes render as a read-only hex dump.
pub fn format(pool: &SchemaPool, field_type: &FieldType, value: &Value) -> String {
    match (value, field_type) {
        (Value::Enum(number), FieldType::Enum { index }) => pool
            .enumeration(*index)
            .value_by_number(*number)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| number.to_string()),
        _ => format_value(value),
    }
}

/// Schema-independent text of a value
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Int32(v) => v.to_string(),
        Value::Uint32(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bytes(v) => hex_dump(v),
        Value::Enum(v) => v.to_string(),
        Value::Message(id) => id.to_string(),
    }
}

/// Signed 32-bit integer: optional `-` then at most ten ASCII digits
pub fn parse_int32(text: &str) -> Result<i32, InvalidFormat> {
    let invalid = || InvalidFormat::new(text, "int32");
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = parse_digits(digits).ok_or_else(invalid)?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).map_err(|_| invalid())
}

/// Unsigned 32-bit integer: at most ten ASCII digits, no sign
pub fn parse_uint32(text: &str) -> Result<u32, InvalidFormat> {
    parse_digits(text)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| InvalidFormat::new(text, "uint32"))
}

fn parse_digits(digits: &str) -> Option<i64> {
    if digits.is_empty()
        || digits.len() > MAX_INTEGER_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    // Ten digits always fit in an i64
    digits.parse::<i64>().ok()
}

pub fn parse_float(text: &str) -> Result<f32, InvalidFormat> {
    text.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidFormat::new(text, "float"))
}

pub fn parse_double(text: &str) -> Result<f64, InvalidFormat> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidFormat::new(text, "double"))
}

pub fn parse_bool(text: &str) -> Result<bool, InvalidFormat> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(InvalidFormat::new(text, "bool")),
    }
}

/// Resolve a selected enum name (or a declared number) to its value
pub fn resolve_enum(values: &[EnumValue], text: &str) -> Result<i32, InvalidFormat> {
    values
        .iter()
        .find(|v| v.name == text)
        .or_else(|| {
            let number = parse_int32(text).ok()?;
            values.iter().find(|v| v.number == number)
        })
        .map(|v| v.number)
        .ok_or_else(|| InvalidFormat::new(text, "enum value"))
}

/// Two lowercase hex digits per byte, a line break after every 64 bytes
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + bytes.len() / HEX_BYTES_PER_LINE);
    for (i, byte) in bytes.iter().enumerate() {
        let _ = write!(out, "{:02x}", byte);
        if (i + 1) % HEX_BYTES_PER_LINE == 0 {
            out.push('\n');
        }
    }
    out
}
