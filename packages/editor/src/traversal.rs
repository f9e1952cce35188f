//! # Traversal Controller
//!
//! One pass walks the fields of a message in declaration order and
//! dispatches on `(type, cardinality)`:
//!
//! ```text
//! scalar/enum singular  → create | codec round-trip | remove
//! scalar/enum repeated  → bulk | per-element edit + remove | append
//! message singular      → create (+ completion) | remove | recurse
//! message repeated      → per-element remove | recurse | append (+ completion)
//! bytes singular        → create | hex view | whole-value replace | remove
//! ```
//!
//! The pass mutates the record only when the front-end commits an
//! affordance, so repeated passes over unchanged state are idempotent.
//! A failing field is logged and reported; its siblings are still visited.

use protoedit_common::{ByteSource, Clipboard};
use protoedit_schema::{Cardinality, FieldDescriptor, FieldType, SchemaPool};
use tracing::{debug, error, instrument};

use crate::completion::materialize_message;
use crate::frontend::{child_path, element_path, EditFrontend, FieldView, TextEdit};
use crate::record::{DynamicRecord, MessageId, RecordError};
use crate::repeated::RepeatedEditor;
use crate::report::{Diagnostic, FieldOutcome, VisitReport};
use crate::{codec, EditorError, EditorOptions, InvalidFormat, Value};

/// Collaborators of one traversal pass
pub struct Services<'a> {
    pub frontend: &'a mut dyn EditFrontend,
    pub clipboard: &'a mut dyn Clipboard,
    pub bytes: &'a dyn ByteSource,
}

/// Run one traversal pass over the message tree rooted at `root`
///
/// Only a missing root fails the pass; field failures end up in the
/// report's diagnostics.
#[instrument(level = "debug", skip_all, fields(root = %root))]
pub fn visit_document<R: DynamicRecord + ?Sized>(
    pool: &SchemaPool,
    record: &mut R,
    root: MessageId,
    services: Services<'_>,
    options: &EditorOptions,
) -> Result<VisitReport, EditorError> {
    record.schema_of(root)?;

    let mut traversal = Traversal {
        pool,
        record,
        services,
        options,
        report: VisitReport::new(),
    };
    traversal.visit_message(root, "")?;

    let report = traversal.report;
    debug!(
        events = report.events.len(),
        diagnostics = report.diagnostics.len(),
        changed = report.changed(),
        "Traversal pass finished"
    );
    Ok(report)
}

/// Front-end answer to a value affordance
enum Edit {
    Keep,
    Commit(Value),
    /// Text that failed to parse, already reported
    Rejected,
}

struct Traversal<'a, 's, R: DynamicRecord + ?Sized> {
    pool: &'a SchemaPool,
    record: &'a mut R,
    services: Services<'s>,
    options: &'a EditorOptions,
    report: VisitReport,
}

impl<'a, 's, R: DynamicRecord + ?Sized> Traversal<'a, 's, R> {
    fn visit_message(&mut self, message: MessageId, prefix: &str) -> Result<(), EditorError> {
        let pool = self.pool;
        let schema = self.record.schema_of(message)?;

        for field in pool.fields_of(schema) {
            let path = child_path(prefix, &field.name);
            if let Err(err) = self.visit_field(message, field, &path) {
                self.fail(&path, err);
            }
        }
        Ok(())
    }

    fn visit_field(&mut self, message: MessageId, field: &FieldDescriptor, path: &str) -> Result<(), EditorError> {
        match (&field.field_type, field.cardinality) {
            (FieldType::Unsupported { name }, _) => Err(EditorError::UnsupportedFieldType {
                field: field.name.clone(),
                kind: name.clone(),
            }),
            (FieldType::Bytes, Cardinality::Repeated) => Err(EditorError::UnsupportedFieldType {
                field: field.name.clone(),
                kind: "repeated bytes".to_string(),
            }),
            (FieldType::Bytes, Cardinality::Singular) => self.visit_bytes(message, field, path),
            (FieldType::Message { .. }, Cardinality::Singular) => {
                self.visit_singular_message(message, field, path)
            }
            (FieldType::Message { .. }, Cardinality::Repeated) => {
                self.visit_repeated_message(message, field, path)
            }
            (_, Cardinality::Singular) => self.visit_singular_scalar(message, field, path),
            (_, Cardinality::Repeated) => self.visit_repeated_scalar(message, field, path),
        }
    }

    fn visit_singular_scalar(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        path: &str,
    ) -> Result<(), EditorError> {
        let view = FieldView::new(path, field, None);
        let present = self.record.has(message, field);

        // An accepted create is only written once the edit riding on it
        // succeeds, so a failed edit leaves the field absent
        let creating = !field.required && !present;
        if creating && !self.services.frontend.offer_create(&view) {
            self.report.record(path, FieldOutcome::NoOp);
            return Ok(());
        }

        // A required field missing from a loaded document shows its default
        // and is written on the first accepted edit
        let current = match self.record.get(message, field) {
            Some(value) => value.clone(),
            None => self.default_value(field)?,
        };

        let mut outcome = FieldOutcome::NoOp;
        match self.edit_value(&view, &current)? {
            Edit::Commit(value) if value != current || !present => {
                self.record.set(message, field, value)?;
                outcome = if creating { FieldOutcome::Created } else { FieldOutcome::ValueChanged };
            }
            Edit::Keep if creating => {
                self.record.set(message, field, current)?;
                outcome = FieldOutcome::Created;
            }
            Edit::Rejected if creating => debug!(path, "Create dropped after rejected edit"),
            Edit::Commit(_) | Edit::Keep | Edit::Rejected => {}
        }
        if outcome == FieldOutcome::Created {
            debug!(path, "Created field");
        }

        if !field.required && self.record.has(message, field) && self.services.frontend.offer_remove(&view) {
            self.record.clear(message, field)?;
            outcome = FieldOutcome::Removed;
            debug!(path, "Removed field");
        }

        self.report.record(path, outcome);
        Ok(())
    }

    fn visit_repeated_scalar(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        path: &str,
    ) -> Result<(), EditorError> {
        let pool = self.pool;
        let options = self.options;
        let view = FieldView::new(path, field, None);

        let joined = RepeatedEditor::new(pool, &mut *self.record, message, field, options)?.joined_text();
        if let Some(text) = self.services.frontend.edit_bulk(&view, &joined) {
            if text != joined {
                let outcome = RepeatedEditor::new(pool, &mut *self.record, message, field, options)?
                    .reconcile_text(&text)?;
                for slot in &outcome.invalid {
                    let slot_path = element_path(path, slot.index);
                    self.warn(&slot_path, slot.message.clone());
                }
                self.report.record(path, FieldOutcome::ValueChanged);
                return Ok(());
            }
        }

        let size = self.record.size(message, field);
        for index in 0..size {
            let element = element_path(path, index);
            let element_view = FieldView::new(&element, field, Some(index));
            let current = self
                .record
                .get_at(message, field, index)
                .cloned()
                .ok_or_else(|| out_of_range(field, index, size))?;

            let mut outcome = FieldOutcome::NoOp;
            if let Edit::Commit(value) = self.edit_value(&element_view, &current)? {
                if value != current {
                    self.record.set_at(message, field, index, value)?;
                    outcome = FieldOutcome::ValueChanged;
                }
            }

            if self.services.frontend.offer_remove(&element_view) {
                RepeatedEditor::new(pool, &mut *self.record, message, field, options)?.remove(index)?;
                self.report.record(element, FieldOutcome::Removed);
                // Later indices have shifted; they are visited next pass
                return Ok(());
            }
            self.report.record(element, outcome);
        }

        let outcome = self.offer_append(message, field, &view)?;
        self.report.record(path, outcome);
        Ok(())
    }

    fn visit_singular_message(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        path: &str,
    ) -> Result<(), EditorError> {
        let view = FieldView::new(path, field, None);

        let child = match self.record.message(message, field) {
            Some(child) => child,
            None => {
                if !field.required && !self.services.frontend.offer_create(&view) {
                    self.report.record(path, FieldOutcome::NoOp);
                    return Ok(());
                }
                let child = materialize_message(self.pool, &mut *self.record, message, field, self.options)?;
                self.report.record(path, FieldOutcome::Created);
                debug!(path, "Created message");
                child
            }
        };

        if !field.required && self.services.frontend.offer_remove(&view) {
            self.record.clear(message, field)?;
            self.report.record(path, FieldOutcome::Removed);
            debug!(path, "Removed message");
            return Ok(());
        }

        self.enter(child, &view)
    }

    fn visit_repeated_message(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        path: &str,
    ) -> Result<(), EditorError> {
        let pool = self.pool;
        let options = self.options;
        let view = FieldView::new(path, field, None);

        let size = self.record.size(message, field);
        for index in 0..size {
            let element = element_path(path, index);
            let child = self
                .record
                .message_at(message, field, index)
                .ok_or_else(|| out_of_range(field, index, size))?;
            let title = self.element_title(child);
            let element_view = FieldView::new(&element, field, Some(index)).with_title(title.as_deref());

            if self.services.frontend.offer_remove(&element_view) {
                RepeatedEditor::new(pool, &mut *self.record, message, field, options)?.remove(index)?;
                self.report.record(element, FieldOutcome::Removed);
                return Ok(());
            }
            self.enter(child, &element_view)?;
        }

        let outcome = self.offer_append(message, field, &view)?;
        self.report.record(path, outcome);
        Ok(())
    }

    fn visit_bytes(&mut self, message: MessageId, field: &FieldDescriptor, path: &str) -> Result<(), EditorError> {
        let view = FieldView::new(path, field, None);
        let present = self.record.has(message, field);

        let creating = !field.required && !present;
        if creating && !self.services.frontend.offer_create(&view) {
            self.report.record(path, FieldOutcome::NoOp);
            return Ok(());
        }

        let current = self
            .record
            .get(message, field)
            .and_then(Value::as_bytes)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        self.services.frontend.show_bytes(&view, &codec::hex_dump(&current));

        let mut outcome = FieldOutcome::NoOp;
        let replacement = match self.services.frontend.replace_bytes(&view) {
            // A failed read leaves the field as it was, absent included
            Some(source) => {
                let data = self.services.bytes.read_all(&source)?;
                debug!(path, source = %source, bytes = data.len(), "Replaced bytes");
                Some(data)
            }
            None => None,
        };
        match replacement {
            Some(data) if data != current || !present => {
                self.record.set(message, field, Value::Bytes(data))?;
                outcome = if creating { FieldOutcome::Created } else { FieldOutcome::ValueChanged };
            }
            Some(_) => {}
            None if creating => {
                self.record.set(message, field, Value::Bytes(current))?;
                outcome = FieldOutcome::Created;
            }
            None => {}
        }

        if !field.required && self.record.has(message, field) && self.services.frontend.offer_remove(&view) {
            self.record.clear(message, field)?;
            outcome = FieldOutcome::Removed;
        }

        self.report.record(path, outcome);
        Ok(())
    }

    fn enter(&mut self, child: MessageId, view: &FieldView<'_>) -> Result<(), EditorError> {
        self.services.frontend.enter_message(view);
        self.report.record(view.path, FieldOutcome::Entered);
        let result = self.visit_message(child, view.path);
        self.services.frontend.leave_message(view);
        result
    }

    fn offer_append(
        &mut self,
        message: MessageId,
        field: &FieldDescriptor,
        view: &FieldView<'_>,
    ) -> Result<FieldOutcome, EditorError> {
        if !self.services.frontend.offer_append(view) {
            return Ok(FieldOutcome::NoOp);
        }
        let index = RepeatedEditor::new(self.pool, &mut *self.record, message, field, self.options)?
            .append_default()?;
        debug!(path = view.path, index, "Appended element");
        Ok(FieldOutcome::Created)
    }

    /// Ask the front-end for a new value of a scalar, enum or bool
    ///
    /// Invalid text is reported and yields [`Edit::Rejected`], leaving the
    /// stored value as it was.
    fn edit_value(&mut self, view: &FieldView<'_>, current: &Value) -> Result<Edit, EditorError> {
        let pool = self.pool;
        let field_type = &view.field.field_type;

        match (field_type, current) {
            (FieldType::Bool, Value::Bool(flag)) => {
                if self.services.frontend.toggle_bool(view, *flag) {
                    Ok(Edit::Commit(Value::Bool(!flag)))
                } else {
                    Ok(Edit::Keep)
                }
            }
            (FieldType::Enum { index }, _) => {
                let values = &pool.enumeration(*index).values;
                let name = codec::format(pool, field_type, current);
                let Some(selected) = self.services.frontend.select_enum(view, values, &name) else {
                    return Ok(Edit::Keep);
                };
                match codec::resolve_enum(values, &selected) {
                    Ok(number) => Ok(Edit::Commit(Value::Enum(number))),
                    Err(invalid) => {
                        self.invalid(view.path, invalid);
                        Ok(Edit::Rejected)
                    }
                }
            }
            _ => {
                let text = codec::format(pool, field_type, current);
                let edited = match self.services.frontend.edit_text(view, &text) {
                    TextEdit::Keep => return Ok(Edit::Keep),
                    TextEdit::Copy => {
                        self.services.clipboard.copy(&text)?;
                        return Ok(Edit::Keep);
                    }
                    TextEdit::Replace(edited) => edited,
                    TextEdit::Paste => self.services.clipboard.paste()?,
                };
                match codec::parse(pool, field_type, &edited) {
                    Ok(value) => Ok(Edit::Commit(value)),
                    Err(invalid) => {
                        self.invalid(view.path, invalid);
                        Ok(Edit::Rejected)
                    }
                }
            }
        }
    }

    /// Value of a message's `name` string field, if it has one
    fn element_title(&self, child: MessageId) -> Option<String> {
        let schema = self.record.schema_of(child).ok()?;
        let name = self.pool.message(schema).field("name")?;
        match self.record.get(child, name)? {
            Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn default_value(&self, field: &FieldDescriptor) -> Result<Value, EditorError> {
        Value::default_for(self.pool, field).ok_or_else(|| EditorError::UnsupportedFieldType {
            field: field.name.clone(),
            kind: field.field_type.to_string(),
        })
    }

    fn invalid(&mut self, path: &str, invalid: InvalidFormat) {
        debug!(path, text = %invalid.text, "Rejected invalid text");
        self.warn(path, invalid.to_string());
    }

    fn warn(&mut self, path: &str, message: String) {
        let diagnostic = Diagnostic::warning(path, message);
        self.services.frontend.report(&diagnostic);
        self.report.diagnostics.push(diagnostic);
    }

    fn fail(&mut self, path: &str, err: EditorError) {
        error!(path, error = %err, "Field visit failed");
        let diagnostic = Diagnostic::error(path, err.to_string());
        self.services.frontend.report(&diagnostic);
        self.report.diagnostics.push(diagnostic);
    }
}

fn out_of_range(field: &FieldDescriptor, index: usize, size: usize) -> EditorError {
    RecordError::IndexOutOfRange {
        field: field.name.clone(),
        index,
        size,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{EditCommand, ScriptedFrontend};
    use crate::report::DiagnosticLevel;
    use crate::MessageArena;
    use protoedit_common::{MemoryByteSource, MemoryClipboard};
    use protoedit_schema::{FieldSpec, MessageIndex, SchemaBuilder};

    struct Fixture {
        pool: SchemaPool,
        root_type: MessageIndex,
        arena: MessageArena,
        root: MessageId,
        clipboard: MemoryClipboard,
        bytes: MemoryByteSource,
    }

    impl Fixture {
        fn new() -> Self {
            let mut builder = SchemaBuilder::new();
            let mode = builder.enumeration("test.Mode", [("FAST", 0), ("SLOW", 1)]);
            let inner = builder.message("test.Inner");
            let root_type = builder.message("test.Root");
            builder.field(inner, FieldSpec::new("count", FieldType::Int32).required());
            builder
                .field(root_type, FieldSpec::new("id", FieldType::Uint32))
                .field(root_type, FieldSpec::new("flag", FieldType::Bool))
                .field(root_type, FieldSpec::enumeration("mode", mode))
                .field(root_type, FieldSpec::new("tags", FieldType::String).repeated())
                .field(root_type, FieldSpec::message("inner", inner))
                .field(root_type, FieldSpec::message("items", inner).repeated())
                .field(root_type, FieldSpec::new("blob", FieldType::Bytes))
                .field(
                    root_type,
                    FieldSpec::new("wide", FieldType::Unsupported { name: "int64".to_string() }),
                );
            let pool = builder.build().unwrap();

            let mut arena = MessageArena::new();
            let root = arena.alloc(root_type);
            Self {
                pool,
                root_type,
                arena,
                root,
                clipboard: MemoryClipboard::new(),
                bytes: MemoryByteSource::new(),
            }
        }

        fn field(&self, name: &str) -> &FieldDescriptor {
            self.pool.message(self.root_type).field(name).unwrap()
        }

        fn pass(&mut self, frontend: &mut dyn EditFrontend) -> VisitReport {
            let services = Services {
                frontend,
                clipboard: &mut self.clipboard,
                bytes: &self.bytes,
            };
            visit_document(&self.pool, &mut self.arena, self.root, services, &EditorOptions::default()).unwrap()
        }
    }

    fn set(path: &str, value: &str) -> EditCommand {
        EditCommand::Set {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_idle_pass_changes_nothing() {
        let mut fixture = Fixture::new();
        let report = fixture.pass(&mut crate::frontend::NoopFrontend);

        assert!(!report.changed());
        assert_eq!(report.outcome_of("id"), Some(FieldOutcome::NoOp));
        assert!(!fixture.arena.has(fixture.root, fixture.field("id")));
    }

    #[test]
    fn test_unsupported_field_is_reported_and_siblings_continue() {
        let mut fixture = Fixture::new();
        let report = fixture.pass(&mut crate::frontend::NoopFrontend);

        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "wide");
        assert_eq!(report.outcome_of("blob"), Some(FieldOutcome::NoOp));
    }

    #[test]
    fn test_set_creates_and_writes() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![set("id", "42")]);
        let report = fixture.pass(&mut frontend);

        assert_eq!(report.outcome_of("id"), Some(FieldOutcome::Created));
        assert_eq!(
            fixture.arena.get(fixture.root, fixture.field("id")),
            Some(&Value::Uint32(42))
        );
        assert!(frontend.is_done());
    }

    #[test]
    fn test_invalid_text_keeps_value() {
        let mut fixture = Fixture::new();
        let id = fixture.field("id").clone();
        fixture.arena.set(fixture.root, &id, Value::Uint32(5)).unwrap();

        let mut frontend = ScriptedFrontend::new(vec![set("id", "-3")]);
        let report = fixture.pass(&mut frontend);

        assert_eq!(fixture.arena.get(fixture.root, &id), Some(&Value::Uint32(5)));
        assert_eq!(report.diagnostics[0].level, DiagnosticLevel::Warning);
        assert_eq!(report.diagnostics[0].message, "-3 is not a valid uint32");
    }

    #[test]
    fn test_bool_toggle_and_enum_select() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![set("flag", "true"), set("mode", "SLOW")]);
        fixture.pass(&mut frontend);

        assert_eq!(
            fixture.arena.get(fixture.root, fixture.field("flag")),
            Some(&Value::Bool(true))
        );
        assert_eq!(
            fixture.arena.get(fixture.root, fixture.field("mode")),
            Some(&Value::Enum(1))
        );
    }

    #[test]
    fn test_unknown_enum_name_is_reported() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![set("mode", "MEDIUM")]);
        let report = fixture.pass(&mut frontend);

        assert!(!fixture.arena.has(fixture.root, fixture.field("mode")));
        assert_eq!(report.outcome_of("mode"), Some(FieldOutcome::NoOp));
        assert_eq!(report.diagnostics.len(), 2);
    }

    #[test]
    fn test_failed_edits_leave_absent_fields_absent() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![
            set("id", "99999999999"),
            set("flag", "yes"),
            EditCommand::Embed {
                path: "blob".to_string(),
                source: "missing".to_string(),
            },
        ]);
        let report = fixture.pass(&mut frontend);

        for name in ["id", "flag", "blob"] {
            assert!(!fixture.arena.has(fixture.root, fixture.field(name)), "{} was written", name);
        }
        assert!(!report.changed());
        assert!(report.errors().any(|d| d.path == "blob"));
        assert_eq!(frontend.rejected().len(), 1);
        assert!(frontend.is_done());
    }

    #[test]
    fn test_failed_paste_leaves_field_absent() {
        struct Unavailable;

        impl Clipboard for Unavailable {
            fn copy(&mut self, _text: &str) -> protoedit_common::CommonResult<()> {
                Ok(())
            }

            fn paste(&mut self) -> protoedit_common::CommonResult<String> {
                Err(protoedit_common::CommonError::NotFound("clipboard".to_string()))
            }
        }

        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![EditCommand::Paste { path: "id".to_string() }]);
        let services = Services {
            frontend: &mut frontend,
            clipboard: &mut Unavailable,
            bytes: &fixture.bytes,
        };
        let report =
            visit_document(&fixture.pool, &mut fixture.arena, fixture.root, services, &EditorOptions::default())
                .unwrap();

        assert!(!fixture.arena.has(fixture.root, fixture.field("id")));
        assert!(!report.changed());
        assert!(report.errors().any(|d| d.path == "id"));
    }

    #[test]
    fn test_create_without_edit_writes_default() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![
            EditCommand::Create { path: "id".to_string() },
            EditCommand::Create { path: "blob".to_string() },
        ]);
        let report = fixture.pass(&mut frontend);

        assert_eq!(report.outcome_of("id"), Some(FieldOutcome::Created));
        assert_eq!(fixture.arena.get(fixture.root, fixture.field("id")), Some(&Value::Uint32(0)));
        assert_eq!(
            fixture.arena.get(fixture.root, fixture.field("blob")),
            Some(&Value::Bytes(Vec::new()))
        );
    }

    #[test]
    fn test_nested_set_materializes_completed_parent() {
        let mut fixture = Fixture::new();
        let mut frontend = ScriptedFrontend::new(vec![set("inner.count", "9")]);
        let report = fixture.pass(&mut frontend);

        assert_eq!(report.outcome_of("inner"), Some(FieldOutcome::Created));
        let inner = fixture.arena.message(fixture.root, fixture.field("inner")).unwrap();
        let count = &fixture.pool.fields_of(fixture.pool.message_by_name("test.Inner").unwrap())[0];
        assert_eq!(fixture.arena.get(inner, count), Some(&Value::Int32(9)));
    }

    #[test]
    fn test_append_then_remove_message_element() {
        let mut fixture = Fixture::new();
        let items = fixture.field("items").clone();

        let mut frontend = ScriptedFrontend::new(vec![
            EditCommand::Append { path: "items".to_string() },
            EditCommand::Append { path: "items".to_string() },
        ]);
        fixture.pass(&mut frontend);
        fixture.pass(&mut frontend);
        assert_eq!(fixture.arena.size(fixture.root, &items), 2);
        assert_eq!(fixture.arena.live_messages(), 3);

        let mut frontend = ScriptedFrontend::new(vec![EditCommand::RemoveAt {
            path: "items".to_string(),
            index: 0,
        }]);
        let report = fixture.pass(&mut frontend);
        assert_eq!(report.outcome_of("items[0]"), Some(FieldOutcome::Removed));
        assert_eq!(fixture.arena.size(fixture.root, &items), 1);
        assert_eq!(fixture.arena.live_messages(), 2);
    }

    #[test]
    fn test_bulk_unchanged_text_is_noop() {
        let mut fixture = Fixture::new();
        let tags = fixture.field("tags").clone();
        fixture.arena.add(fixture.root, &tags, Value::from("a")).unwrap();
        fixture.arena.add(fixture.root, &tags, Value::from("b")).unwrap();

        let mut frontend = ScriptedFrontend::new(vec![EditCommand::Bulk {
            path: "tags".to_string(),
            text: "a,b".to_string(),
        }]);
        let report = fixture.pass(&mut frontend);

        assert!(!report.changed());
        assert!(frontend.is_done());
    }

    #[test]
    fn test_copy_then_paste_through_clipboard() {
        let mut fixture = Fixture::new();
        let tags = fixture.field("tags").clone();
        fixture.arena.add(fixture.root, &tags, Value::from("first")).unwrap();
        fixture.arena.add(fixture.root, &tags, Value::from("second")).unwrap();

        let mut frontend = ScriptedFrontend::new(vec![
            EditCommand::Copy { path: "tags[0]".to_string() },
            EditCommand::Paste { path: "tags[1]".to_string() },
        ]);
        fixture.pass(&mut frontend);

        assert_eq!(fixture.clipboard.contents(), "first");
        assert_eq!(fixture.arena.get_at(fixture.root, &tags, 1), Some(&Value::from("first")));
    }

    #[test]
    fn test_embed_bytes_and_missing_source() {
        let mut fixture = Fixture::new();
        fixture.bytes.add("payload", vec![0xca, 0xfe]);
        let blob = fixture.field("blob").clone();

        let mut frontend = ScriptedFrontend::new(vec![EditCommand::Embed {
            path: "blob".to_string(),
            source: "payload".to_string(),
        }]);
        fixture.pass(&mut frontend);
        assert_eq!(
            fixture.arena.get(fixture.root, &blob),
            Some(&Value::Bytes(vec![0xca, 0xfe]))
        );

        let mut frontend = ScriptedFrontend::new(vec![EditCommand::Embed {
            path: "blob".to_string(),
            source: "nowhere".to_string(),
        }]);
        let report = fixture.pass(&mut frontend);
        assert!(report.errors().any(|d| d.path == "blob"));
        assert_eq!(
            fixture.arena.get(fixture.root, &blob),
            Some(&Value::Bytes(vec![0xca, 0xfe]))
        );
    }
}
