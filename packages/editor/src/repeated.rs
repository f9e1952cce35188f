//! # Repeated-Field Editor
//!
//! Index-based editing of list-valued fields.
//!
//! Removal is expressed as adjacent swaps followed by dropping the last
//! slot, so it works on records that only offer `swap` and `remove_last`
//! and keeps the relative order of the remaining elements.
//!
//! The bulk mode edits all values of a scalar list at once as one
//! comma-separated text. Consecutive separators collapse, so a stray double
//! comma never creates an empty element.

use protoedit_schema::{FieldDescriptor, FieldType, SchemaPool};
use serde::Serialize;
use tracing::debug;

use crate::record::{DynamicRecord, MessageId, RecordError};
use crate::{codec, completion, EditorError, EditorOptions, InvalidFormat, Value};

/// Separator of the bulk text form
pub const BULK_DELIMITER: char = ',';

/// Split bulk text into element texts, dropping empty tokens
pub fn split_bulk(text: &str) -> Vec<&str> {
    text.split(BULK_DELIMITER).filter(|t| !t.is_empty()).collect()
}

/// A bulk slot whose text failed to parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidSlot {
    pub index: usize,
    pub text: String,
    pub message: String,
}

/// Result of a bulk reconcile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub previous_len: usize,
    pub len: usize,
    /// Slots left at their previous (or default) value
    pub invalid: Vec<InvalidSlot>,
}

impl BulkOutcome {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Editor over one repeated field of one message
pub struct RepeatedEditor<'a, R: DynamicRecord + ?Sized> {
    pool: &'a SchemaPool,
    record: &'a mut R,
    message: MessageId,
    field: &'a FieldDescriptor,
    options: &'a EditorOptions,
}

impl<'a, R: DynamicRecord + ?Sized> RepeatedEditor<'a, R> {
    pub fn new(
        pool: &'a SchemaPool,
        record: &'a mut R,
        message: MessageId,
        field: &'a FieldDescriptor,
        options: &'a EditorOptions,
    ) -> Result<Self, EditorError> {
        if !field.is_repeated() {
            return Err(RecordError::NotRepeated(field.name.clone()).into());
        }
        Ok(Self {
            pool,
            record,
            message,
            field,
            options,
        })
    }

    pub fn len(&self) -> usize {
        self.record.size(self.message, self.field)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.record.get_at(self.message, self.field, index)
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), EditorError> {
        self.record.set_at(self.message, self.field, index, value)?;
        Ok(())
    }

    /// Parse `text` and store it at `index`; the slot is untouched on failure
    pub fn set_text(&mut self, index: usize, text: &str) -> Result<Result<(), InvalidFormat>, EditorError> {
        match codec::parse(self.pool, &self.field.field_type, text) {
            Ok(value) => {
                self.set(index, value)?;
                Ok(Ok(()))
            }
            Err(invalid) => Ok(Err(invalid)),
        }
    }

    /// Append one default element; message elements are completed
    pub fn append_default(&mut self) -> Result<usize, EditorError> {
        match &self.field.field_type {
            FieldType::Message { .. } => {
                completion::append_message(self.pool, self.record, self.message, self.field, self.options)?;
            }
            FieldType::Unsupported { name } => {
                return Err(EditorError::UnsupportedFieldType {
                    field: self.field.name.clone(),
                    kind: name.clone(),
                })
            }
            _ => {
                let default = Value::default_for(self.pool, self.field).ok_or_else(|| {
                    EditorError::UnsupportedFieldType {
                        field: self.field.name.clone(),
                        kind: self.field.field_type.to_string(),
                    }
                })?;
                self.record.add(self.message, self.field, default)?;
            }
        }
        Ok(self.len() - 1)
    }

    /// Remove element `index`, keeping the order of the others
    pub fn remove(&mut self, index: usize) -> Result<(), EditorError> {
        let size = self.len();
        if index >= size {
            return Err(RecordError::IndexOutOfRange {
                field: self.field.name.clone(),
                index,
                size,
            }
            .into());
        }

        for k in index..size - 1 {
            self.record.swap(self.message, self.field, k, k + 1)?;
        }
        self.record.remove_last(self.message, self.field)?;
        debug!(field = %self.field.name, index, size, "Removed repeated element");
        Ok(())
    }

    /// Canonical text of every element
    pub fn texts(&self) -> Vec<String> {
        (0..self.len())
            .filter_map(|k| self.get(k))
            .map(|v| codec::format(self.pool, &self.field.field_type, v))
            .collect()
    }

    /// Current values as one bulk text
    pub fn joined_text(&self) -> String {
        self.texts().join(&BULK_DELIMITER.to_string())
    }

    /// Reconcile the field with bulk text
    pub fn reconcile_text(&mut self, text: &str) -> Result<BulkOutcome, EditorError> {
        self.reconcile(&split_bulk(text))
    }

    /// Make the field hold exactly `texts.len()` elements, element `i`
    /// parsed from `texts[i]`
    ///
    /// Missing slots are appended with defaults and surplus slots are dropped
    /// from the tail before parsing. A slot whose text is invalid keeps its
    /// previous value and is reported.
    pub fn reconcile<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<BulkOutcome, EditorError> {
        match &self.field.field_type {
            FieldType::Message { .. } | FieldType::Bytes | FieldType::Unsupported { .. } => {
                return Err(EditorError::NotBulkEditable(self.field.name.clone()));
            }
            _ => {}
        }

        let previous_len = self.len();
        let wanted = texts.len();
        for _ in previous_len..wanted {
            self.append_default()?;
        }
        for _ in wanted..previous_len {
            self.record.remove_last(self.message, self.field)?;
        }

        let mut invalid = Vec::new();
        for (index, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            if let Err(err) = self.set_text(index, text)? {
                invalid.push(InvalidSlot {
                    index,
                    text: text.to_string(),
                    message: err.to_string(),
                });
            }
        }

        debug!(
            field = %self.field.name,
            previous_len,
            len = wanted,
            invalid = invalid.len(),
            "Reconciled bulk edit"
        );
        Ok(BulkOutcome {
            previous_len,
            len: wanted,
            invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageArena;
    use protoedit_schema::{FieldSpec, MessageIndex, SchemaBuilder};

    fn fixture() -> (SchemaPool, MessageIndex) {
        let mut builder = SchemaBuilder::new();
        let msg = builder.message("test.Lists");
        builder
            .field(msg, FieldSpec::new("ints", FieldType::Int32).repeated())
            .field(msg, FieldSpec::new("names", FieldType::String).repeated())
            .field(msg, FieldSpec::new("ratios", FieldType::Float).repeated())
            .field(msg, FieldSpec::new("single", FieldType::Int32));
        (builder.build().unwrap(), msg)
    }

    fn ints(arena: &MessageArena, root: MessageId, field: &FieldDescriptor) -> Vec<i32> {
        (0..arena.size(root, field))
            .map(|k| match arena.get_at(root, field, k) {
                Some(Value::Int32(v)) => *v,
                other => panic!("unexpected {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[0];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        for v in [1, 2, 3] {
            arena.add(root, field, Value::Int32(v)).unwrap();
        }

        RepeatedEditor::new(&pool, &mut arena, root, field, &options)
            .unwrap()
            .remove(1)
            .unwrap();

        assert_eq!(ints(&arena, root, field), vec![1, 3]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[0];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        assert!(matches!(
            editor.remove(0),
            Err(EditorError::Record(RecordError::IndexOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_editor_requires_repeated_field() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[3];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);

        assert!(RepeatedEditor::new(&pool, &mut arena, root, field, &options).is_err());
    }

    #[test]
    fn test_bulk_grows_string_list() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[1];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        arena.add(root, field, Value::from("x")).unwrap();
        arena.add(root, field, Value::from("y")).unwrap();

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        let outcome = editor.reconcile_text("a,b,c").unwrap();

        assert_eq!(outcome.previous_len, 2);
        assert_eq!(outcome.len, 3);
        assert!(outcome.is_clean());
        assert_eq!(editor.texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bulk_shrinks_from_tail() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[0];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        for v in [5, 6, 7, 8] {
            arena.add(root, field, Value::Int32(v)).unwrap();
        }

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        editor.reconcile_text("9,,10").unwrap();

        assert_eq!(ints(&arena, root, field), vec![9, 10]);
    }

    #[test]
    fn test_bulk_invalid_slot_keeps_previous_value() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[2];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        arena.add(root, field, Value::Float(1.5)).unwrap();
        arena.add(root, field, Value::Float(2.5)).unwrap();

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        let outcome = editor.reconcile_text("3,oops,4").unwrap();

        assert_eq!(outcome.invalid.len(), 1);
        assert_eq!(outcome.invalid[0].index, 1);
        assert_eq!(outcome.invalid[0].text, "oops");
        assert_eq!(editor.get(0), Some(&Value::Float(3.0)));
        assert_eq!(editor.get(1), Some(&Value::Float(2.5)));
        assert_eq!(editor.get(2), Some(&Value::Float(4.0)));
    }

    #[test]
    fn test_bulk_empty_text_clears() {
        let (pool, msg) = fixture();
        let field = &pool.fields_of(msg)[1];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        arena.add(root, field, Value::from("keep")).unwrap();

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        editor.reconcile_text(",,").unwrap();
        assert!(editor.is_empty());
    }

    #[test]
    fn test_split_collapses_runs() {
        assert_eq!(split_bulk("a,,b,"), vec!["a", "b"]);
        assert!(split_bulk("").is_empty());
    }
}
