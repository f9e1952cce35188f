//! # Front-end Contract
//!
//! The traversal never draws anything itself. For every affordance it offers
//! (create, remove, edit, append, ...) it asks an [`EditFrontend`], which
//! answers with the user's intent for the current pass. Every callback has a
//! "no interaction" default, so a front-end only implements what it renders.
//!
//! [`ScriptedFrontend`] answers from a list of path-addressed commands and is
//! what the CLI and the tests drive the engine with.

use protoedit_schema::{EnumValue, FieldDescriptor, FieldType};
use serde::{Deserialize, Serialize};

use crate::report::Diagnostic;

/// The field (or repeated element) an affordance is about
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    /// Dotted path such as `items[2].name`
    pub path: &'a str,
    pub field: &'a FieldDescriptor,
    /// Element index for repeated elements
    pub index: Option<usize>,
    /// Display name of a message element, taken from its `name` string field
    pub title: Option<&'a str>,
}

impl<'a> FieldView<'a> {
    pub fn new(path: &'a str, field: &'a FieldDescriptor, index: Option<usize>) -> Self {
        Self {
            path,
            field,
            index,
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }

    pub fn is_element(&self) -> bool {
        self.index.is_some()
    }
}

/// Intent returned for a text-edited value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Keep,
    /// New text, parsed by the field's codec before it is stored
    Replace(String),
    /// Put the current text on the clipboard
    Copy,
    /// Take the clipboard text as the new text
    Paste,
}

/// Callbacks the traversal drives, one per affordance
#[allow(unused_variables)]
pub trait EditFrontend {
    /// Absent optional field; `true` creates it with its default
    fn offer_create(&mut self, view: &FieldView<'_>) -> bool {
        false
    }

    /// Present optional field or repeated element; `true` removes it
    fn offer_remove(&mut self, view: &FieldView<'_>) -> bool {
        false
    }

    /// Text-edited scalar (numbers, strings)
    fn edit_text(&mut self, view: &FieldView<'_>, current: &str) -> TextEdit {
        TextEdit::Keep
    }

    /// Boolean checkbox; `true` flips the value
    fn toggle_bool(&mut self, view: &FieldView<'_>, current: bool) -> bool {
        false
    }

    /// Enum selector; returns the selected value name
    fn select_enum(&mut self, view: &FieldView<'_>, values: &[EnumValue], current: &str) -> Option<String> {
        None
    }

    /// Repeated field; `true` appends one default element
    fn offer_append(&mut self, view: &FieldView<'_>) -> bool {
        false
    }

    /// All values of a repeated scalar field as one delimited text
    fn edit_bulk(&mut self, view: &FieldView<'_>, current: &str) -> Option<String> {
        None
    }

    /// Read-only hex rendering of a bytes field
    fn show_bytes(&mut self, view: &FieldView<'_>, hex: &str) {}

    /// Identifier of a byte source whose content replaces the bytes value
    fn replace_bytes(&mut self, view: &FieldView<'_>) -> Option<String> {
        None
    }

    fn enter_message(&mut self, view: &FieldView<'_>) {}

    fn leave_message(&mut self, view: &FieldView<'_>) {}

    /// A diagnostic raised while visiting a field
    fn report(&mut self, diagnostic: &Diagnostic) {}
}

/// A front-end that never interacts
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFrontend;

impl EditFrontend for NoopFrontend {}

/// One scripted edit, addressed by field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditCommand {
    /// Create an absent optional field
    Create { path: String },
    /// Set a scalar, enum or bool field (or element); creates it if absent
    Set { path: String, value: String },
    /// Remove an optional field or an element path such as `items[1]`
    Remove { path: String },
    Append { path: String },
    RemoveAt { path: String, index: usize },
    /// Replace all values of a repeated scalar field
    Bulk { path: String, text: String },
    /// Replace a bytes field with the content of a byte source
    Embed { path: String, source: String },
    Copy { path: String },
    Paste { path: String },
}

impl EditCommand {
    /// Path of the field or element the command applies to
    pub fn target(&self) -> String {
        match self {
            EditCommand::RemoveAt { path, index } => element_path(path, *index),
            EditCommand::Create { path }
            | EditCommand::Set { path, .. }
            | EditCommand::Remove { path }
            | EditCommand::Append { path }
            | EditCommand::Bulk { path, .. }
            | EditCommand::Embed { path, .. }
            | EditCommand::Copy { path }
            | EditCommand::Paste { path } => path.clone(),
        }
    }

    /// Commands that need their field to exist first
    fn implies_create(&self) -> bool {
        matches!(
            self,
            EditCommand::Set { .. } | EditCommand::Embed { .. } | EditCommand::Paste { .. }
        )
    }
}

/// Path of element `index` of the repeated field at `path`
pub fn element_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

/// Path of `name` inside the message at `prefix`
pub fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Whether `path` lies strictly below the message at `parent`
fn is_below(path: &str, parent: &str) -> bool {
    path.strip_prefix(parent)
        .map_or(false, |rest| rest.starts_with('.') || rest.starts_with('['))
}

/// Front-end answering from a command list
///
/// Every command is consumed at most once. Commands that cannot apply in a
/// pass (an element that does not exist yet, say) stay pending, so callers
/// run passes until [`consumed_count`](Self::consumed_count) stops growing.
#[derive(Debug, Default, Clone)]
pub struct ScriptedFrontend {
    commands: Vec<EditCommand>,
    consumed: Vec<bool>,
    /// Commands consumed but refused, with the reason
    rejected: Vec<(EditCommand, String)>,
}

impl ScriptedFrontend {
    pub fn new(commands: Vec<EditCommand>) -> Self {
        let consumed = vec![false; commands.len()];
        Self {
            commands,
            consumed,
            rejected: Vec::new(),
        }
    }

    pub fn push(&mut self, command: EditCommand) {
        self.commands.push(command);
        self.consumed.push(false);
    }

    pub fn commands(&self) -> &[EditCommand] {
        &self.commands
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.iter().filter(|c| **c).count()
    }

    /// Commands not applied yet
    pub fn pending(&self) -> impl Iterator<Item = &EditCommand> {
        self.commands
            .iter()
            .zip(&self.consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(command, _)| command)
    }

    pub fn is_done(&self) -> bool {
        self.consumed.iter().all(|c| *c)
    }

    pub fn rejected(&self) -> &[(EditCommand, String)] {
        &self.rejected
    }

    /// Consume the first pending command matching `predicate`
    fn take(&mut self, predicate: impl Fn(&EditCommand) -> bool) -> Option<EditCommand> {
        let position = self
            .commands
            .iter()
            .zip(&self.consumed)
            .position(|(command, consumed)| !consumed && predicate(command))?;
        self.consumed[position] = true;
        Some(self.commands[position].clone())
    }

    fn any_pending(&self, predicate: impl Fn(&EditCommand) -> bool) -> bool {
        self.pending().any(predicate)
    }

    fn reject_bool(&mut self, command: EditCommand) {
        if let EditCommand::Set { value, .. } = &command {
            let reason = format!("{} is not a valid bool", value);
            self.rejected.push((command, reason));
        }
    }
}

fn bool_text(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl EditFrontend for ScriptedFrontend {
    fn offer_create(&mut self, view: &FieldView<'_>) -> bool {
        if self
            .take(|c| matches!(c, EditCommand::Create { path } if path == view.path))
            .is_some()
        {
            return true;
        }
        // A bool set that toggling cannot express must not create the field
        if matches!(view.field.field_type, FieldType::Bool) {
            let invalid = self.take(|c| {
                matches!(c, EditCommand::Set { path, value } if path == view.path && bool_text(value).is_none())
            });
            if let Some(command) = invalid {
                self.reject_bool(command);
            }
        }
        // Edits of the field itself, or of anything inside it, need it present
        self.any_pending(|c| {
            let target = c.target();
            let removal = matches!(c, EditCommand::Remove { .. } | EditCommand::RemoveAt { .. });
            (c.implies_create() && target == view.path) || (!removal && is_below(&target, view.path))
        })
    }

    fn offer_remove(&mut self, view: &FieldView<'_>) -> bool {
        self.take(|c| match c {
            EditCommand::Remove { path } => path == view.path,
            EditCommand::RemoveAt { .. } => c.target() == view.path,
            _ => false,
        })
        .is_some()
    }

    fn edit_text(&mut self, view: &FieldView<'_>, _current: &str) -> TextEdit {
        let command = self.take(|c| match c {
            EditCommand::Set { path, .. } | EditCommand::Copy { path } | EditCommand::Paste { path } => {
                path == view.path
            }
            _ => false,
        });
        match command {
            Some(EditCommand::Set { value, .. }) => TextEdit::Replace(value),
            Some(EditCommand::Copy { .. }) => TextEdit::Copy,
            Some(EditCommand::Paste { .. }) => TextEdit::Paste,
            _ => TextEdit::Keep,
        }
    }

    fn toggle_bool(&mut self, view: &FieldView<'_>, current: bool) -> bool {
        let Some(command) = self.take(|c| matches!(c, EditCommand::Set { path, .. } if path == view.path)) else {
            return false;
        };
        let EditCommand::Set { value, .. } = &command else {
            return false;
        };
        match bool_text(value) {
            Some(wanted) => wanted != current,
            None => {
                self.reject_bool(command);
                false
            }
        }
    }

    fn select_enum(&mut self, view: &FieldView<'_>, _values: &[EnumValue], _current: &str) -> Option<String> {
        match self.take(|c| matches!(c, EditCommand::Set { path, .. } if path == view.path))? {
            EditCommand::Set { value, .. } => Some(value),
            _ => None,
        }
    }

    fn offer_append(&mut self, view: &FieldView<'_>) -> bool {
        self.take(|c| matches!(c, EditCommand::Append { path } if path == view.path))
            .is_some()
    }

    fn edit_bulk(&mut self, view: &FieldView<'_>, _current: &str) -> Option<String> {
        match self.take(|c| matches!(c, EditCommand::Bulk { path, .. } if path == view.path))? {
            EditCommand::Bulk { text, .. } => Some(text),
            _ => None,
        }
    }

    fn replace_bytes(&mut self, view: &FieldView<'_>) -> Option<String> {
        match self.take(|c| matches!(c, EditCommand::Embed { path, .. } if path == view.path))? {
            EditCommand::Embed { source, .. } => Some(source),
            _ => None,
        }
    }
}
