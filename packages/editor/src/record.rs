//! # Dynamic Record
//!
//! The reflective, in-place mutable view of a document that the engine
//! drives. Every call is addressed by a message handle plus the descriptor of
//! one of that message's fields; writes are visible to the next read.
//!
//! The engine only ever talks to this trait. [`MessageArena`](crate::MessageArena)
//! is the provided implementation.

use std::fmt;

use protoedit_schema::{FieldDescriptor, MessageIndex};
use serde::Serialize;
use thiserror::Error;

use crate::Value;

/// Stable handle of one message instance
///
/// The generation makes handles of freed messages detectable instead of
/// silently aliasing a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Message {0} does not exist")]
    UnknownMessage(MessageId),

    #[error("Field {field} does not belong to message {message}")]
    FieldMismatch { message: MessageId, field: String },

    #[error("Field {field} expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("Field {0} is not repeated")]
    NotRepeated(String),

    #[error("Field {0} is repeated")]
    NotSingular(String),

    #[error("Field {0} is not a message field")]
    NotMessage(String),

    #[error("Index {index} out of range for field {field} of size {size}")]
    IndexOutOfRange {
        field: String,
        index: usize,
        size: usize,
    },
}

/// Reflection contract over one document
pub trait DynamicRecord {
    /// Schema of a live message instance
    fn schema_of(&self, message: MessageId) -> Result<MessageIndex, RecordError>;

    /// Presence of a singular field
    fn has(&self, message: MessageId, field: &FieldDescriptor) -> bool;

    /// Element count of a repeated field
    fn size(&self, message: MessageId, field: &FieldDescriptor) -> usize;

    fn get(&self, message: MessageId, field: &FieldDescriptor) -> Option<&Value>;

    fn set(&mut self, message: MessageId, field: &FieldDescriptor, value: Value) -> Result<(), RecordError>;

    fn get_at(&self, message: MessageId, field: &FieldDescriptor, index: usize) -> Option<&Value>;

    fn set_at(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        index: usize,
        value: Value,
    ) -> Result<(), RecordError>;

    /// Append a scalar element to a repeated field
    fn add(&mut self, message: MessageId, field: &FieldDescriptor, value: Value) -> Result<(), RecordError>;

    fn swap(&mut self, message: MessageId, field: &FieldDescriptor, a: usize, b: usize) -> Result<(), RecordError>;

    /// Drop the last element, discarding it (and its subtree for messages)
    fn remove_last(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<(), RecordError>;

    /// Nested message of a singular field, materialized empty when absent
    fn mutable_message(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<MessageId, RecordError>;

    /// Append an empty nested message to a repeated field
    fn add_message(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<MessageId, RecordError>;

    fn message_at(&self, message: MessageId, field: &FieldDescriptor, index: usize) -> Option<MessageId>;

    /// Nested message of a singular field, without materializing it
    fn message(&self, message: MessageId, field: &FieldDescriptor) -> Option<MessageId> {
        self.get(message, field).and_then(Value::as_message)
    }

    /// Remove every value of the field, destroying owned subtrees
    fn clear(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<(), RecordError>;
}

/// Presence check: `size > 0` for repeated fields, `has` otherwise
pub fn is_set<R: DynamicRecord + ?Sized>(record: &R, message: MessageId, field: &FieldDescriptor) -> bool {
    if field.is_repeated() {
        record.size(message, field) > 0
    } else {
        record.has(message, field)
    }
}
