//! Arena-backed [`DynamicRecord`] implementation
//!
//! Every message instance of a document lives in one slot of the arena and
//! is addressed by a [`MessageId`]. Nested messages are stored as
//! `Value::Message` handles, so the tree has exactly one owner per node and
//! destroying a field destroys the subtree below it.

use protoedit_schema::{FieldDescriptor, MessageIndex};
use tracing::trace;

use crate::record::{DynamicRecord, MessageId, RecordError};
use crate::Value;

#[derive(Debug, Clone)]
enum Slot {
    Single(Value),
    List(Vec<Value>),
}

#[derive(Debug, Clone)]
struct Node {
    schema: MessageIndex,
    /// Indexed by field declaration position, grown on demand
    slots: Vec<Option<Slot>>,
    /// Raw wire bytes of fields the schema does not describe or the engine
    /// does not edit, kept so a load/save cycle does not lose them
    unknown: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// Owned store of message instances
#[derive(Debug, Clone, Default)]
pub struct MessageArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
}

impl MessageArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached, empty message (used for document roots)
    pub fn alloc(&mut self, schema: MessageIndex) -> MessageId {
        let node = Node {
            schema,
            slots: Vec::new(),
            unknown: Vec::new(),
        };

        if let Some(slot) = self.free.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.node = Some(node);
            MessageId {
                slot,
                generation: entry.generation,
            }
        } else {
            let slot = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                node: Some(node),
            });
            MessageId { slot, generation: 0 }
        }
    }

    /// Destroy a message and everything it owns
    pub fn free(&mut self, id: MessageId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(node) = self.take(id) else {
                continue;
            };
            for slot in node.slots.into_iter().flatten() {
                match slot {
                    Slot::Single(value) => pending.extend(value.as_message()),
                    Slot::List(values) => {
                        pending.extend(values.iter().filter_map(Value::as_message))
                    }
                }
            }
            self.free.push(id.slot);
        }
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live message instances
    pub fn live_messages(&self) -> usize {
        self.entries.iter().filter(|e| e.node.is_some()).count()
    }

    pub fn unknown_fields(&self, id: MessageId) -> &[u8] {
        self.node(id).map(|n| n.unknown.as_slice()).unwrap_or(&[])
    }

    pub fn push_unknown(&mut self, id: MessageId, raw: &[u8]) -> Result<(), RecordError> {
        self.node_mut(id)?.unknown.extend_from_slice(raw);
        Ok(())
    }

    fn take(&mut self, id: MessageId) -> Option<Node> {
        let entry = self.entries.get_mut(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.node.take()
    }

    fn node(&self, id: MessageId) -> Option<&Node> {
        self.entries
            .get(id.slot as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_ref())
    }

    fn node_mut(&mut self, id: MessageId) -> Result<&mut Node, RecordError> {
        self.entries
            .get_mut(id.slot as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_mut())
            .ok_or(RecordError::UnknownMessage(id))
    }

    fn slot(&self, id: MessageId, field: &FieldDescriptor) -> Option<&Slot> {
        let node = self.node(id)?;
        if node.schema != field.owner {
            return None;
        }
        node.slots.get(field.index).and_then(Option::as_ref)
    }

    /// Checked mutable access to a field slot
    fn slot_mut(&mut self, id: MessageId, field: &FieldDescriptor) -> Result<&mut Option<Slot>, RecordError> {
        let node = self.node_mut(id)?;
        if node.schema != field.owner {
            return Err(RecordError::FieldMismatch {
                message: id,
                field: field.name.clone(),
            });
        }
        if node.slots.len() <= field.index {
            node.slots.resize(field.index + 1, None);
        }
        Ok(&mut node.slots[field.index])
    }

    fn list_mut(&mut self, id: MessageId, field: &FieldDescriptor) -> Result<&mut Vec<Value>, RecordError> {
        if !field.is_repeated() {
            return Err(RecordError::NotRepeated(field.name.clone()));
        }
        let slot = self.slot_mut(id, field)?;
        if !matches!(slot, Some(Slot::List(_))) {
            *slot = Some(Slot::List(Vec::new()));
        }
        match slot {
            Some(Slot::List(values)) => Ok(values),
            _ => unreachable!("slot was just initialized as a list"),
        }
    }

    fn list(&self, id: MessageId, field: &FieldDescriptor) -> &[Value] {
        match self.slot(id, field) {
            Some(Slot::List(values)) => values,
            _ => &[],
        }
    }

    fn release(&mut self, value: Value) {
        if let Value::Message(child) = value {
            self.free(child);
        }
    }
}

/// Scalar writes go through `set`/`add`; nested messages are only created by
/// the arena itself so ownership stays single.
fn check_scalar(field: &FieldDescriptor, value: &Value) -> Result<(), RecordError> {
    if matches!(value, Value::Message(_)) || !value.matches(&field.field_type) {
        return Err(RecordError::TypeMismatch {
            field: field.name.clone(),
            expected: field.field_type.to_string(),
            found: value.kind(),
        });
    }
    Ok(())
}

fn nested_schema(field: &FieldDescriptor) -> Result<MessageIndex, RecordError> {
    field
        .message_type()
        .ok_or_else(|| RecordError::NotMessage(field.name.clone()))
}

impl DynamicRecord for MessageArena {
    fn schema_of(&self, message: MessageId) -> Result<MessageIndex, RecordError> {
        self.node(message)
            .map(|n| n.schema)
            .ok_or(RecordError::UnknownMessage(message))
    }

    fn has(&self, message: MessageId, field: &FieldDescriptor) -> bool {
        match self.slot(message, field) {
            Some(Slot::Single(_)) => true,
            Some(Slot::List(values)) => !values.is_empty(),
            None => false,
        }
    }

    fn size(&self, message: MessageId, field: &FieldDescriptor) -> usize {
        match self.slot(message, field) {
            Some(Slot::List(values)) => values.len(),
            Some(Slot::Single(_)) => 1,
            None => 0,
        }
    }

    fn get(&self, message: MessageId, field: &FieldDescriptor) -> Option<&Value> {
        match self.slot(message, field) {
            Some(Slot::Single(value)) => Some(value),
            _ => None,
        }
    }

    fn set(&mut self, message: MessageId, field: &FieldDescriptor, value: Value) -> Result<(), RecordError> {
        if field.is_repeated() {
            return Err(RecordError::NotSingular(field.name.clone()));
        }
        check_scalar(field, &value)?;
        let slot = self.slot_mut(message, field)?;
        let previous = slot.replace(Slot::Single(value));
        if let Some(Slot::Single(old)) = previous {
            self.release(old);
        }
        Ok(())
    }

    fn get_at(&self, message: MessageId, field: &FieldDescriptor, index: usize) -> Option<&Value> {
        self.list(message, field).get(index)
    }

    fn set_at(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        index: usize,
        value: Value,
    ) -> Result<(), RecordError> {
        check_scalar(field, &value)?;
        let values = self.list_mut(message, field)?;
        let size = values.len();
        let target = values.get_mut(index).ok_or_else(|| RecordError::IndexOutOfRange {
            field: field.name.clone(),
            index,
            size,
        })?;
        *target = value;
        Ok(())
    }

    fn add(&mut self, message: MessageId, field: &FieldDescriptor, value: Value) -> Result<(), RecordError> {
        check_scalar(field, &value)?;
        self.list_mut(message, field)?.push(value);
        Ok(())
    }

    fn swap(&mut self, message: MessageId, field: &FieldDescriptor, a: usize, b: usize) -> Result<(), RecordError> {
        let values = self.list_mut(message, field)?;
        let size = values.len();
        for index in [a, b] {
            if index >= size {
                return Err(RecordError::IndexOutOfRange {
                    field: field.name.clone(),
                    index,
                    size,
                });
            }
        }
        values.swap(a, b);
        Ok(())
    }

    fn remove_last(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<(), RecordError> {
        let values = self.list_mut(message, field)?;
        let removed = values.pop().ok_or_else(|| RecordError::IndexOutOfRange {
            field: field.name.clone(),
            index: 0,
            size: 0,
        })?;
        self.release(removed);
        Ok(())
    }

    fn mutable_message(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<MessageId, RecordError> {
        if field.is_repeated() {
            return Err(RecordError::NotSingular(field.name.clone()));
        }
        let schema = nested_schema(field)?;
        if let Some(existing) = self.get(message, field).and_then(Value::as_message) {
            return Ok(existing);
        }

        // Validate the parent before allocating so a failure leaks nothing
        self.slot_mut(message, field)?;
        let child = self.alloc(schema);
        *self.slot_mut(message, field)? = Some(Slot::Single(Value::Message(child)));
        trace!(parent = %message, field = %field.name, child = %child, "Materialized message");
        Ok(child)
    }

    fn add_message(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<MessageId, RecordError> {
        let schema = nested_schema(field)?;
        self.list_mut(message, field)?;
        let child = self.alloc(schema);
        self.list_mut(message, field)?.push(Value::Message(child));
        Ok(child)
    }

    fn message_at(&self, message: MessageId, field: &FieldDescriptor, index: usize) -> Option<MessageId> {
        self.get_at(message, field, index).and_then(Value::as_message)
    }

    fn clear(&mut self, message: MessageId, field: &FieldDescriptor) -> Result<(), RecordError> {
        let previous = self.slot_mut(message, field)?.take();
        match previous {
            Some(Slot::Single(value)) => self.release(value),
            Some(Slot::List(values)) => {
                for value in values {
                    self.release(value);
                }
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoedit_schema::{FieldSpec, FieldType, SchemaBuilder, SchemaPool};

    fn pool() -> (SchemaPool, MessageIndex) {
        let mut builder = SchemaBuilder::new();
        let node = builder.message("test.Node");
        builder
            .field(node, FieldSpec::new("value", FieldType::Int32))
            .field(node, FieldSpec::new("tags", FieldType::String).repeated())
            .field(node, FieldSpec::message("child", node))
            .field(node, FieldSpec::message("children", node).repeated());
        (builder.build().unwrap(), node)
    }

    #[test]
    fn test_set_and_get_singular() {
        let (pool, node) = pool();
        let value = &pool.fields_of(node)[0];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        assert!(!arena.has(root, value));
        arena.set(root, value, Value::Int32(7)).unwrap();
        assert!(arena.has(root, value));
        assert_eq!(arena.get(root, value), Some(&Value::Int32(7)));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let (pool, node) = pool();
        let value = &pool.fields_of(node)[0];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        let err = arena.set(root, value, Value::Bool(true)).unwrap_err();
        assert!(matches!(err, RecordError::TypeMismatch { .. }));
        assert!(!arena.has(root, value));
    }

    #[test]
    fn test_clear_frees_subtree() {
        let (pool, node) = pool();
        let child = &pool.fields_of(node)[2];
        let children = &pool.fields_of(node)[3];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        let inner = arena.mutable_message(root, child).unwrap();
        arena.add_message(inner, children).unwrap();
        arena.add_message(inner, children).unwrap();
        assert_eq!(arena.live_messages(), 4);

        arena.clear(root, child).unwrap();
        assert_eq!(arena.live_messages(), 1);
        assert!(!arena.contains(inner));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let (pool, node) = pool();
        let child = &pool.fields_of(node)[2];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        let first = arena.mutable_message(root, child).unwrap();
        arena.clear(root, child).unwrap();
        let second = arena.mutable_message(root, child).unwrap();

        assert_eq!(first.slot, second.slot);
        assert!(!arena.contains(first));
        assert!(arena.contains(second));
    }

    #[test]
    fn test_mutable_message_returns_existing() {
        let (pool, node) = pool();
        let child = &pool.fields_of(node)[2];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        let a = arena.mutable_message(root, child).unwrap();
        let b = arena.mutable_message(root, child).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_last_on_empty_field_fails() {
        let (pool, node) = pool();
        let tags = &pool.fields_of(node)[1];
        let mut arena = MessageArena::new();
        let root = arena.alloc(node);

        assert!(matches!(
            arena.remove_last(root, tags),
            Err(RecordError::IndexOutOfRange { .. })
        ));
    }
}
