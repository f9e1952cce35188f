//! # Required-Field Completion
//!
//! Every message that exists in a record must already hold a value for each
//! required field reachable from it through required fields. Completion
//! establishes that right after a message is created.
//!
//! The required closure of a message type is checked on the schema before
//! the record is touched, so an unsatisfiable closure fails without leaving
//! a half-filled message behind.

use std::collections::HashSet;

use protoedit_schema::{FieldDescriptor, FieldType, MessageIndex, SchemaPool};
use tracing::{debug, instrument, warn};

use crate::record::{DynamicRecord, MessageId};
use crate::{EditorError, EditorOptions, Value};

/// Fill every absent required field of `message`, recursing into required
/// nested messages
#[instrument(level = "debug", skip(pool, record, options))]
pub fn complete<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    message: MessageId,
    options: &EditorOptions,
) -> Result<(), EditorError> {
    let schema = record.schema_of(message)?;
    check_required_closure(pool, schema, options.max_completion_depth)?;
    fill(pool, record, message)
}

/// Verify that filling `schema` terminates
///
/// Fails when a chain of required singular message fields leads back to a
/// message type already on the chain (no finite instance can exist), or when
/// the chain is deeper than `max_depth`.
pub fn check_required_closure(
    pool: &SchemaPool,
    schema: MessageIndex,
    max_depth: usize,
) -> Result<(), EditorError> {
    let mut chain = Vec::new();
    let mut verified = HashSet::new();
    walk_closure(pool, schema, max_depth, &mut chain, &mut verified)
}

fn walk_closure(
    pool: &SchemaPool,
    schema: MessageIndex,
    max_depth: usize,
    chain: &mut Vec<(MessageIndex, String)>,
    verified: &mut HashSet<MessageIndex>,
) -> Result<(), EditorError> {
    if verified.contains(&schema) {
        return Ok(());
    }

    let unsatisfiable = |chain: &[(MessageIndex, String)], reason: &str| {
        let path: Vec<&str> = chain.iter().map(|(_, field)| field.as_str()).collect();
        let root = chain.first().map_or(schema, |(index, _)| *index);
        EditorError::RequiredClosureUnsatisfiable {
            message: pool.message(root).full_name.clone(),
            reason: format!("{} via '{}'", reason, path.join(".")),
        }
    };

    if chain.iter().any(|(index, _)| *index == schema) {
        let err = unsatisfiable(chain, "required fields form a cycle");
        warn!(error = %err, "Required closure is cyclic");
        return Err(err);
    }
    if chain.len() >= max_depth {
        return Err(unsatisfiable(chain, "required nesting exceeds the depth limit"));
    }

    for field in pool.fields_of(schema).iter().filter(|f| f.required) {
        if let FieldType::Message { index } = field.field_type {
            chain.push((schema, field.name.clone()));
            let result = walk_closure(pool, index, max_depth, chain, verified);
            chain.pop();
            result?;
        }
    }

    verified.insert(schema);
    Ok(())
}

fn fill<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    message: MessageId,
) -> Result<(), EditorError> {
    let schema = record.schema_of(message)?;
    for field in pool.fields_of(schema) {
        if !field.required || record.has(message, field) {
            continue;
        }
        fill_field(pool, record, message, field)?;
    }
    Ok(())
}

fn fill_field<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    message: MessageId,
    field: &FieldDescriptor,
) -> Result<(), EditorError> {
    match &field.field_type {
        FieldType::Message { .. } => {
            let child = record.mutable_message(message, field)?;
            debug!(field = %field.name, "Materialized required message");
            fill(pool, record, child)
        }
        FieldType::Unsupported { name } => Err(EditorError::UnsupportedFieldType {
            field: field.name.clone(),
            kind: name.clone(),
        }),
        _ => {
            let default = Value::default_for(pool, field).ok_or_else(|| {
                EditorError::UnsupportedFieldType {
                    field: field.name.clone(),
                    kind: field.field_type.to_string(),
                }
            })?;
            record.set(message, field, default)?;
            Ok(())
        }
    }
}

/// Materialize a singular message field and complete it
///
/// On failure the field is cleared again, so no partially completed message
/// stays in the record.
pub fn materialize_message<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    parent: MessageId,
    field: &FieldDescriptor,
    options: &EditorOptions,
) -> Result<MessageId, EditorError> {
    let existed = record.has(parent, field);
    let child = record.mutable_message(parent, field)?;
    if let Err(err) = complete(pool, record, child, options) {
        if !existed {
            record.clear(parent, field)?;
        }
        return Err(err);
    }
    Ok(child)
}

/// Append a new element to a repeated message field and complete it
///
/// On failure the new element is dropped again.
pub fn append_message<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    parent: MessageId,
    field: &FieldDescriptor,
    options: &EditorOptions,
) -> Result<MessageId, EditorError> {
    let child = record.add_message(parent, field)?;
    if let Err(err) = complete(pool, record, child, options) {
        record.remove_last(parent, field)?;
        return Err(err);
    }
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageArena;
    use protoedit_schema::{FieldSpec, SchemaBuilder};

    #[test]
    fn test_required_scalars_get_defaults() {
        let mut builder = SchemaBuilder::new();
        let color = builder.enumeration("test.Color", [("GREEN", 3), ("RED", 1)]);
        let msg = builder.message("test.Msg");
        builder
            .field(msg, FieldSpec::new("a", FieldType::Uint32).required())
            .field(msg, FieldSpec::new("b", FieldType::String).required())
            .field(msg, FieldSpec::enumeration("c", color).required())
            .field(msg, FieldSpec::new("d", FieldType::Double));
        let pool = builder.build().unwrap();

        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        complete(&pool, &mut arena, root, &EditorOptions::default()).unwrap();

        let fields = pool.fields_of(msg);
        assert_eq!(arena.get(root, &fields[0]), Some(&Value::Uint32(0)));
        assert_eq!(arena.get(root, &fields[1]), Some(&Value::String(String::new())));
        assert_eq!(arena.get(root, &fields[2]), Some(&Value::Enum(3)));
        assert!(!arena.has(root, &fields[3]));
    }

    #[test]
    fn test_existing_values_are_kept() {
        let mut builder = SchemaBuilder::new();
        let msg = builder.message("test.Msg");
        builder.field(msg, FieldSpec::new("a", FieldType::Int32).required());
        let pool = builder.build().unwrap();
        let a = &pool.fields_of(msg)[0];

        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        arena.set(root, a, Value::Int32(12)).unwrap();
        complete(&pool, &mut arena, root, &EditorOptions::default()).unwrap();

        assert_eq!(arena.get(root, a), Some(&Value::Int32(12)));
    }

    #[test]
    fn test_cycle_through_optional_field_is_fine() {
        let mut builder = SchemaBuilder::new();
        let node = builder.message("test.Node");
        builder
            .field(node, FieldSpec::new("id", FieldType::Int32).required())
            .field(node, FieldSpec::message("next", node));
        let pool = builder.build().unwrap();

        let mut arena = MessageArena::new();
        let root = arena.alloc(node);
        complete(&pool, &mut arena, root, &EditorOptions::default()).unwrap();

        assert!(arena.has(root, &pool.fields_of(node)[0]));
        assert!(!arena.has(root, &pool.fields_of(node)[1]));
    }

    #[test]
    fn test_required_cycle_fails_without_touching_record() {
        let mut builder = SchemaBuilder::new();
        let a = builder.message("test.A");
        let b = builder.message("test.B");
        builder
            .field(a, FieldSpec::new("x", FieldType::Int32).required())
            .field(a, FieldSpec::message("b", b).required());
        builder.field(b, FieldSpec::message("a", a).required());
        let pool = builder.build().unwrap();

        let mut arena = MessageArena::new();
        let root = arena.alloc(a);
        let err = complete(&pool, &mut arena, root, &EditorOptions::default()).unwrap_err();

        assert!(matches!(err, EditorError::RequiredClosureUnsatisfiable { .. }));
        assert!(!arena.has(root, &pool.fields_of(a)[0]));
        assert_eq!(arena.live_messages(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut builder = SchemaBuilder::new();
        let levels: Vec<MessageIndex> = (0..5).map(|i| builder.message(format!("test.L{}", i))).collect();
        for pair in levels.windows(2) {
            builder.field(pair[0], FieldSpec::message("next", pair[1]).required());
        }
        let pool = builder.build().unwrap();

        assert!(check_required_closure(&pool, levels[0], 8).is_ok());
        assert!(matches!(
            check_required_closure(&pool, levels[0], 3),
            Err(EditorError::RequiredClosureUnsatisfiable { .. })
        ));
    }

    #[test]
    fn test_failed_materialize_rolls_back() {
        let mut builder = SchemaBuilder::new();
        let root_type = builder.message("test.Root");
        let bad = builder.message("test.Bad");
        builder.field(root_type, FieldSpec::message("bad", bad));
        builder.field(root_type, FieldSpec::message("bads", bad).repeated());
        builder.field(bad, FieldSpec::message("again", bad).required());
        let pool = builder.build().unwrap();
        let fields = pool.fields_of(root_type);

        let mut arena = MessageArena::new();
        let root = arena.alloc(root_type);
        let options = EditorOptions::default();

        assert!(materialize_message(&pool, &mut arena, root, &fields[0], &options).is_err());
        assert!(!arena.has(root, &fields[0]));
        assert!(append_message(&pool, &mut arena, root, &fields[1], &options).is_err());
        assert_eq!(arena.size(root, &fields[1]), 0);
        assert_eq!(arena.live_messages(), 1);
    }
}
