//! Property-based tests for the editing invariants using proptest
//!
//! Covers removal order, codec round-trips, bulk reconcile sizing,
//! non-destructive validation and required closure over random chains.

use proptest::prelude::*;

use protoedit_editor::codec::{self, format_value};
use protoedit_editor::completion::complete;
use protoedit_editor::{DynamicRecord, EditorOptions, MessageArena, RepeatedEditor, Value};
use protoedit_schema::{FieldSpec, FieldType, MessageIndex, SchemaBuilder, SchemaPool};

// ============================================================================
// FIXTURES
// ============================================================================

fn lists() -> (SchemaPool, MessageIndex) {
    let mut builder = SchemaBuilder::new();
    let msg = builder.message("prop.Lists");
    builder
        .field(msg, FieldSpec::new("ints", FieldType::Int32).repeated())
        .field(msg, FieldSpec::new("words", FieldType::String).repeated())
        .field(msg, FieldSpec::new("count", FieldType::Uint32));
    (builder.build().unwrap(), msg)
}

/// Bulk tokens never contain the delimiter and are never empty
fn arb_word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{1,12}"
}

// ============================================================================
// REMOVAL ORDER
// ============================================================================

proptest! {
    #[test]
    fn prop_remove_excises_exactly_one_element(
        values in prop::collection::vec(any::<i32>(), 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let (pool, msg) = lists();
        let field = &pool.fields_of(msg)[0];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        for v in &values {
            arena.add(root, field, Value::Int32(*v)).unwrap();
        }
        let k = pick.index(values.len());

        RepeatedEditor::new(&pool, &mut arena, root, field, &options)
            .unwrap()
            .remove(k)
            .unwrap();

        let mut expected = values.clone();
        expected.remove(k);
        let actual: Vec<Value> = (0..arena.size(root, field))
            .map(|i| arena.get_at(root, field, i).cloned().unwrap())
            .collect();
        prop_assert_eq!(actual, expected.into_iter().map(Value::Int32).collect::<Vec<_>>());
    }
}

// ============================================================================
// CODEC ROUND-TRIP
// ============================================================================

proptest! {
    #[test]
    fn prop_int32_round_trip(v in any::<i32>()) {
        prop_assert_eq!(codec::parse_int32(&format_value(&Value::Int32(v))), Ok(v));
    }

    #[test]
    fn prop_uint32_round_trip(v in any::<u32>()) {
        prop_assert_eq!(codec::parse_uint32(&format_value(&Value::Uint32(v))), Ok(v));
    }

    #[test]
    fn prop_float_round_trip(v in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
        prop_assert_eq!(codec::parse_float(&format_value(&Value::Float(v))), Ok(v));
    }

    #[test]
    fn prop_double_round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        prop_assert_eq!(codec::parse_double(&format_value(&Value::Double(v))), Ok(v));
    }

    #[test]
    fn prop_bool_round_trip(v in any::<bool>()) {
        prop_assert_eq!(codec::parse_bool(&format_value(&Value::Bool(v))), Ok(v));
    }

    #[test]
    fn prop_string_round_trip(v in ".*") {
        let pool = SchemaBuilder::new().build().unwrap();
        let text = codec::format(&pool, &FieldType::String, &Value::String(v.clone()));
        prop_assert_eq!(codec::parse(&pool, &FieldType::String, &text), Ok(Value::String(v)));
    }

    #[test]
    fn prop_long_digit_runs_are_rejected(digits in "[0-9]{11,20}") {
        prop_assert!(codec::parse_uint32(&digits).is_err());
        prop_assert!(codec::parse_int32(&digits).is_err());
    }
}

// ============================================================================
// BULK RECONCILE SIZING
// ============================================================================

proptest! {
    #[test]
    fn prop_bulk_sets_exact_size_and_values(
        initial in prop::collection::vec(arb_word(), 0..10),
        desired in prop::collection::vec(arb_word(), 0..10),
    ) {
        let (pool, msg) = lists();
        let field = &pool.fields_of(msg)[1];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        for word in &initial {
            arena.add(root, field, Value::from(word.as_str())).unwrap();
        }

        let outcome = RepeatedEditor::new(&pool, &mut arena, root, field, &options)
            .unwrap()
            .reconcile(&desired)
            .unwrap();

        prop_assert_eq!(outcome.previous_len, initial.len());
        prop_assert!(outcome.is_clean());
        prop_assert_eq!(arena.size(root, field), desired.len());
        for (i, word) in desired.iter().enumerate() {
            prop_assert_eq!(arena.get_at(root, field, i), Some(&Value::from(word.as_str())));
        }
    }

    #[test]
    fn prop_bulk_text_matches_token_count(
        values in prop::collection::vec(any::<i32>(), 0..10),
        separators in prop::collection::vec(1..3usize, 0..10),
    ) {
        let (pool, msg) = lists();
        let field = &pool.fields_of(msg)[0];
        let options = EditorOptions::default();
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);

        // Joined with runs of one or two commas
        let mut text = String::new();
        for (i, v) in values.iter().enumerate() {
            text.push_str(&v.to_string());
            let run = separators.get(i).copied().unwrap_or(1);
            text.push_str(&",".repeat(run));
        }

        let mut editor = RepeatedEditor::new(&pool, &mut arena, root, field, &options).unwrap();
        editor.reconcile_text(&text).unwrap();
        prop_assert_eq!(editor.len(), values.len());
    }
}

// ============================================================================
// VALIDATION NON-DESTRUCTIVENESS
// ============================================================================

proptest! {
    #[test]
    fn prop_invalid_text_leaves_value(stored in any::<u32>(), junk in "[^0-9]+") {
        let (pool, msg) = lists();
        let field = &pool.fields_of(msg)[2];
        let mut arena = MessageArena::new();
        let root = arena.alloc(msg);
        arena.set(root, field, Value::Uint32(stored)).unwrap();
        let before = arena.get(root, field).cloned();

        if let Ok(value) = codec::parse(&pool, &field.field_type, &junk) {
            arena.set(root, field, value).unwrap();
        }

        prop_assert_eq!(arena.get(root, field).cloned(), before);
    }
}

// ============================================================================
// REQUIRED CLOSURE
// ============================================================================

proptest! {
    /// A chain of `depth` messages linked by required fields, each carrying a
    /// required scalar, is fully populated by one `complete` call.
    #[test]
    fn prop_complete_fills_required_chain(depth in 1..12usize, optional_every in 2..5usize) {
        let mut builder = SchemaBuilder::new();
        let levels: Vec<MessageIndex> = (0..depth)
            .map(|i| builder.message(format!("prop.L{}", i)))
            .collect();
        for (i, level) in levels.iter().enumerate() {
            builder.field(*level, FieldSpec::new("value", FieldType::Double).required());
            if let Some(next) = levels.get(i + 1) {
                let link = FieldSpec::message("next", *next);
                let link = if i % optional_every == 0 { link } else { link.required() };
                builder.field(*level, link);
            }
        }
        let pool = builder.build().unwrap();

        let mut arena = MessageArena::new();
        let root = arena.alloc(levels[0]);
        complete(&pool, &mut arena, root, &EditorOptions::default()).unwrap();

        // Walk the materialized chain and check every message it reaches
        let mut current = Some(root);
        while let Some(message) = current {
            let schema = arena.schema_of(message).unwrap();
            for field in pool.fields_of(schema).iter().filter(|f| f.required) {
                prop_assert!(arena.has(message, field));
            }
            current = pool
                .fields_of(schema)
                .iter()
                .find(|f| f.name == "next")
                .and_then(|f| arena.message(message, f));
        }
    }
}
