//! # Document Codec
//!
//! Binary protobuf encoding of a message tree held in a [`MessageArena`].
//! Only used at load and save boundaries, never during a traversal pass.
//!
//! Fields the schema does not describe, and fields the engine does not edit
//! (64-bit integers, groups, repeated bytes), are carried through as raw
//! wire bytes so a load/save cycle does not drop them.

use std::fmt;

use prost::encoding::{self, DecodeContext, WireType};
use protoedit_schema::{FieldDescriptor, FieldType, MessageIndex, SchemaPool, WireEncoding};
use tracing::{debug, instrument};

use crate::record::{DynamicRecord, MessageId};
use crate::{EditorError, MessageArena, Value};

/// Deepest message nesting accepted on decode and encode
pub const MAX_NESTING_DEPTH: usize = 100;

/// Converts between document bytes and a message tree
pub trait DocumentCodec: fmt::Debug + Send + Sync {
    /// Decode `bytes` as a message of type `schema` into a new root
    ///
    /// Nothing is left in the arena when decoding fails.
    fn decode(
        &self,
        pool: &SchemaPool,
        arena: &mut MessageArena,
        schema: MessageIndex,
        bytes: &[u8],
    ) -> Result<MessageId, EditorError>;

    fn encode(&self, pool: &SchemaPool, arena: &MessageArena, root: MessageId) -> Result<Vec<u8>, EditorError>;
}

/// Protobuf binary wire format
///
/// Reads packed and unpacked repeated scalars, writes unpacked. Fields are
/// written in field-number order followed by preserved unknown bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct WireCodec;

impl WireCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentCodec for WireCodec {
    #[instrument(level = "debug", skip(self, pool, arena, bytes), fields(len = bytes.len()))]
    fn decode(
        &self,
        pool: &SchemaPool,
        arena: &mut MessageArena,
        schema: MessageIndex,
        bytes: &[u8],
    ) -> Result<MessageId, EditorError> {
        let root = arena.alloc(schema);
        if let Err(err) = decode_message(pool, arena, root, bytes, 0) {
            arena.free(root);
            return Err(err);
        }
        debug!(live = arena.live_messages(), "Decoded document");
        Ok(root)
    }

    fn encode(&self, pool: &SchemaPool, arena: &MessageArena, root: MessageId) -> Result<Vec<u8>, EditorError> {
        let mut buf = Vec::new();
        encode_message(pool, arena, root, &mut buf, 0)?;
        debug!(len = buf.len(), "Encoded document");
        Ok(buf)
    }
}

/// Fields decoded into typed values; everything else stays raw
fn is_editable(field: &FieldDescriptor) -> bool {
    match field.field_type {
        FieldType::Unsupported { .. } => false,
        FieldType::Bytes => !field.is_repeated(),
        _ => true,
    }
}

fn decode_message(
    pool: &SchemaPool,
    arena: &mut MessageArena,
    message: MessageId,
    mut buf: &[u8],
    depth: usize,
) -> Result<(), EditorError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(EditorError::Wire("message nesting too deep".to_string()));
    }
    let schema = pool.message(arena.schema_of(message)?);

    while !buf.is_empty() {
        let field_start = buf;
        let (tag, wire_type) = encoding::decode_key(&mut buf)?;

        let Some(field) = schema.field_by_number(tag).filter(|f| is_editable(f)) else {
            encoding::skip_field(wire_type, tag, &mut buf, DecodeContext::default())?;
            let consumed = field_start.len() - buf.len();
            arena.push_unknown(message, &field_start[..consumed])?;
            continue;
        };

        if field.field_type.is_message() {
            if wire_type != WireType::LengthDelimited {
                return Err(EditorError::Wire(format!(
                    "field {} of {} is not length-delimited",
                    field.name, schema.full_name
                )));
            }
            let len = usize::try_from(encoding::decode_varint(&mut buf)?)
                .map_err(|_| EditorError::Wire("message length overflows".to_string()))?;
            if len > buf.len() {
                return Err(EditorError::Wire(format!("field {} is truncated", field.name)));
            }
            let (body, rest) = buf.split_at(len);
            buf = rest;

            // A singular message seen twice merges into the first
            let child = if field.is_repeated() {
                arena.add_message(message, field)?
            } else {
                arena.mutable_message(message, field)?
            };
            decode_message(pool, arena, child, body, depth + 1)?;
            continue;
        }

        for value in decode_scalars(field, wire_type, &mut buf)? {
            if field.is_repeated() {
                arena.add(message, field, value)?;
            } else {
                // Last occurrence wins
                arena.set(message, field, value)?;
            }
        }
    }
    Ok(())
}

/// Decode one scalar occurrence, or a packed run of them
fn decode_scalars(field: &FieldDescriptor, wire_type: WireType, buf: &mut &[u8]) -> Result<Vec<Value>, EditorError> {
    macro_rules! merge {
        ($module:ident, $variant:path) => {{
            let mut values = Vec::new();
            encoding::$module::merge_repeated(wire_type, &mut values, buf, DecodeContext::default())?;
            values.into_iter().map($variant).collect()
        }};
    }

    let values: Vec<Value> = match (&field.field_type, field.encoding) {
        (FieldType::Int32, WireEncoding::ZigZag) => merge!(sint32, Value::Int32),
        (FieldType::Int32, WireEncoding::Fixed) => merge!(sfixed32, Value::Int32),
        (FieldType::Int32, _) => merge!(int32, Value::Int32),
        (FieldType::Uint32, WireEncoding::Fixed) => merge!(fixed32, Value::Uint32),
        (FieldType::Uint32, _) => merge!(uint32, Value::Uint32),
        (FieldType::Float, _) => merge!(float, Value::Float),
        (FieldType::Double, _) => merge!(double, Value::Double),
        (FieldType::Bool, _) => merge!(bool, Value::Bool),
        (FieldType::Enum { .. }, _) => merge!(int32, Value::Enum),
        (FieldType::String, _) => merge!(string, Value::String),
        (FieldType::Bytes, _) => merge!(bytes, Value::Bytes),
        (FieldType::Message { .. }, _) | (FieldType::Unsupported { .. }, _) => {
            return Err(EditorError::Wire(format!("field {} is not a scalar", field.name)))
        }
    };
    Ok(values)
}

fn encode_message(
    pool: &SchemaPool,
    arena: &MessageArena,
    message: MessageId,
    buf: &mut Vec<u8>,
    depth: usize,
) -> Result<(), EditorError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(EditorError::Wire("message nesting too deep".to_string()));
    }
    let mut fields: Vec<&FieldDescriptor> = pool.fields_of(arena.schema_of(message)?).iter().collect();
    fields.sort_by_key(|f| f.number);

    for field in fields {
        if field.is_repeated() {
            for index in 0..arena.size(message, field) {
                if let Some(value) = arena.get_at(message, field, index) {
                    encode_value(pool, arena, field, value, buf, depth)?;
                }
            }
        } else if let Some(value) = arena.get(message, field) {
            encode_value(pool, arena, field, value, buf, depth)?;
        }
    }

    buf.extend_from_slice(arena.unknown_fields(message));
    Ok(())
}

fn encode_value(
    pool: &SchemaPool,
    arena: &MessageArena,
    field: &FieldDescriptor,
    value: &Value,
    buf: &mut Vec<u8>,
    depth: usize,
) -> Result<(), EditorError> {
    let tag = field.number;
    match (value, field.encoding) {
        (Value::Int32(v), WireEncoding::ZigZag) => encoding::sint32::encode(tag, v, buf),
        (Value::Int32(v), WireEncoding::Fixed) => encoding::sfixed32::encode(tag, v, buf),
        (Value::Int32(v), _) => encoding::int32::encode(tag, v, buf),
        (Value::Uint32(v), WireEncoding::Fixed) => encoding::fixed32::encode(tag, v, buf),
        (Value::Uint32(v), _) => encoding::uint32::encode(tag, v, buf),
        (Value::Float(v), _) => encoding::float::encode(tag, v, buf),
        (Value::Double(v), _) => encoding::double::encode(tag, v, buf),
        (Value::Bool(v), _) => encoding::bool::encode(tag, v, buf),
        (Value::Enum(v), _) => encoding::int32::encode(tag, v, buf),
        (Value::String(v), _) => encoding::string::encode(tag, v, buf),
        (Value::Bytes(v), _) => encoding::bytes::encode(tag, v, buf),
        (Value::Message(child), _) => {
            let mut body = Vec::new();
            encode_message(pool, arena, *child, &mut body, depth + 1)?;
            encoding::encode_key(tag, WireType::LengthDelimited, buf);
            encoding::encode_varint(body.len() as u64, buf);
            buf.extend_from_slice(&body);
        }
    }
    Ok(())
}
