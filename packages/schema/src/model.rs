//! # Schema Model
//!
//! Immutable description of message shapes. Every message and enum lives in
//! the [`SchemaPool`] arena and is referenced by index, so self-referencing
//! and mutually recursive messages need no owning pointers.

use std::fmt;

use serde::Serialize;

/// Index of a message schema inside its [`SchemaPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageIndex(pub usize);

/// Index of an enum schema inside its [`SchemaPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EnumIndex(pub usize);

/// Multiplicity of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// Type tag of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    Int32,
    Uint32,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Enum { index: EnumIndex },
    Message { index: MessageIndex },
    /// Declared by the descriptor source but not dispatched by the engine
    Unsupported { name: String },
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Uint32 => "uint32",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Enum { .. } => "enum",
            FieldType::Message { .. } => "message",
            FieldType::Unsupported { name } => name,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message { .. })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a 32-bit integer field is laid out on the wire
///
/// The editing engine ignores this; only the document codec reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireEncoding {
    #[default]
    Varint,
    ZigZag,
    Fixed,
}

/// One field of a message schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Message this field belongs to
    pub owner: MessageIndex,

    /// Position in the owning message (declaration order)
    pub index: usize,

    /// Field number used by the wire format
    pub number: u32,

    pub name: String,

    pub field_type: FieldType,

    pub cardinality: Cardinality,

    /// Only ever true for singular fields
    pub required: bool,

    #[serde(skip_serializing_if = "is_varint")]
    pub encoding: WireEncoding,
}

fn is_varint(encoding: &WireEncoding) -> bool {
    *encoding == WireEncoding::Varint
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn message_type(&self) -> Option<MessageIndex> {
        match self.field_type {
            FieldType::Message { index } => Some(index),
            _ => None,
        }
    }

    pub fn enum_type(&self) -> Option<EnumIndex> {
        match self.field_type {
            FieldType::Enum { index } => Some(index),
            _ => None,
        }
    }
}

/// Ordered field list of one message type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSchema {
    pub index: MessageIndex,

    /// Short name (`Inner`)
    pub name: String,

    /// Fully-qualified name (`pkg.Outer.Inner`)
    pub full_name: String,

    pub fields: Vec<FieldDescriptor>,
}

impl MessageSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumSchema {
    pub index: EnumIndex,
    pub name: String,
    pub full_name: String,

    /// Declaration order; never empty
    pub values: Vec<EnumValue>,
}

impl EnumSchema {
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }

    pub fn first(&self) -> &EnumValue {
        &self.values[0]
    }
}

/// Arena holding every message and enum schema of a descriptor source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaPool {
    pub(crate) messages: Vec<MessageSchema>,
    pub(crate) enums: Vec<EnumSchema>,
}

impl SchemaPool {
    /// Get a message schema by index
    ///
    /// Panics on an index that was not produced by this pool.
    pub fn message(&self, index: MessageIndex) -> &MessageSchema {
        &self.messages[index.0]
    }

    pub fn enumeration(&self, index: EnumIndex) -> &EnumSchema {
        &self.enums[index.0]
    }

    pub fn messages(&self) -> &[MessageSchema] {
        &self.messages
    }

    pub fn enums(&self) -> &[EnumSchema] {
        &self.enums
    }

    /// Resolve a message by fully-qualified name (a leading `.` is accepted)
    pub fn message_by_name(&self, full_name: &str) -> Option<MessageIndex> {
        let name = full_name.trim_start_matches('.');
        self.messages
            .iter()
            .find(|m| m.full_name == name)
            .or_else(|| {
                // Fall back to the short name when it is unambiguous
                let mut matches = self.messages.iter().filter(|m| m.name == name);
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
            .map(|m| m.index)
    }

    /// Fields of a message in canonical traversal order
    pub fn fields_of(&self, message: MessageIndex) -> &[FieldDescriptor] {
        &self.message(message).fields
    }

    pub fn is_required(&self, field: &FieldDescriptor) -> bool {
        field.required
    }

    /// Enum values in declaration order, `None` for non-enum fields
    pub fn enum_values(&self, field: &FieldDescriptor) -> Option<&[EnumValue]> {
        field
            .enum_type()
            .map(|index| self.enumeration(index).values.as_slice())
    }

    /// Schema of a message-typed field, `None` for other fields
    pub fn nested_schema(&self, field: &FieldDescriptor) -> Option<&MessageSchema> {
        field.message_type().map(|index| self.message(index))
    }

    /// Check that a descriptor belongs to the schema it claims to
    pub fn owns(&self, message: MessageIndex, field: &FieldDescriptor) -> bool {
        field.owner == message
            && self
                .messages
                .get(message.0)
                .and_then(|m| m.fields.get(field.index))
                .map_or(false, |f| f.number == field.number && f.name == field.name)
    }
}
