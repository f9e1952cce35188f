use protoedit_schema::{FieldDescriptor, FieldType, SchemaPool};

use crate::record::MessageId;

/// A typed field value as stored in a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Uint32(u32),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Enum number (not necessarily a declared value)
    Enum(i32),
    /// Handle of a nested message instance
    Message(MessageId),
}

impl Value {
    /// Zero/empty default for a scalar or enum field
    ///
    /// Enums default to their first declared value. Message and unsupported
    /// fields have no scalar default and yield `None`.
    pub fn default_for(pool: &SchemaPool, field: &FieldDescriptor) -> Option<Value> {
        match &field.field_type {
            FieldType::Int32 => Some(Value::Int32(0)),
            FieldType::Uint32 => Some(Value::Uint32(0)),
            FieldType::Float => Some(Value::Float(0.0)),
            FieldType::Double => Some(Value::Double(0.0)),
            FieldType::Bool => Some(Value::Bool(false)),
            FieldType::String => Some(Value::String(String::new())),
            FieldType::Bytes => Some(Value::Bytes(Vec::new())),
            FieldType::Enum { index } => Some(Value::Enum(pool.enumeration(*index).first().number)),
            FieldType::Message { .. } | FieldType::Unsupported { .. } => None,
        }
    }

    /// Whether this value may be stored in a field of the given type
    pub fn matches(&self, field_type: &FieldType) -> bool {
        matches!(
            (self, field_type),
            (Value::Int32(_), FieldType::Int32)
                | (Value::Uint32(_), FieldType::Uint32)
                | (Value::Float(_), FieldType::Float)
                | (Value::Double(_), FieldType::Double)
                | (Value::Bool(_), FieldType::Bool)
                | (Value::String(_), FieldType::String)
                | (Value::Bytes(_), FieldType::Bytes)
                | (Value::Enum(_), FieldType::Enum { .. })
                | (Value::Message(_), FieldType::Message { .. })
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::Uint32(_) => "uint32",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
        }
    }

    pub fn as_message(&self) -> Option<MessageId> {
        match self {
            Value::Message(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<i32> {
        match self {
            Value::Enum(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}
