use colored::Colorize;
use protoedit_editor::{EditFrontend, FieldView, TextEdit};
use protoedit_schema::{EnumValue, FieldType};

/// Front-end that renders one pass as an indented tree
///
/// Every affordance is declined. The pass may still materialize a required
/// message missing from a loaded document, as any pass does; `show` never
/// saves, so that repair stays in memory.
#[derive(Debug, Default)]
pub struct TreeRenderer {
    lines: Vec<String>,
    depth: usize,
    show_unset: bool,
    /// Repeated message fields whose header is open
    open_lists: Vec<String>,
}

impl TreeRenderer {
    pub fn new(show_unset: bool) -> Self {
        Self {
            show_unset,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn label(view: &FieldView<'_>) -> String {
        match (view.index, view.title) {
            (Some(index), Some(title)) => format!("[{}] {}", index, title),
            (Some(index), None) => format!("[{}]", index),
            (None, _) => view.field.name.clone(),
        }
    }

    fn push(&mut self, view: &FieldView<'_>, value: String) {
        let line = format!("{}{}: {}", "  ".repeat(self.depth), Self::label(view).bold(), value);
        self.lines.push(line);
    }
}

impl EditFrontend for TreeRenderer {
    fn offer_create(&mut self, view: &FieldView<'_>) -> bool {
        if self.show_unset {
            self.push(view, "(unset)".dimmed().to_string());
        }
        false
    }

    fn edit_text(&mut self, view: &FieldView<'_>, current: &str) -> TextEdit {
        // Repeated scalars are rendered whole by edit_bulk
        if !view.is_element() {
            let value = match view.field.field_type {
                FieldType::String => format!("{:?}", current),
                _ => current.to_string(),
            };
            self.push(view, value.green().to_string());
        }
        TextEdit::Keep
    }

    fn toggle_bool(&mut self, view: &FieldView<'_>, current: bool) -> bool {
        if !view.is_element() {
            self.push(view, current.to_string().green().to_string());
        }
        false
    }

    fn select_enum(&mut self, view: &FieldView<'_>, _values: &[EnumValue], current: &str) -> Option<String> {
        if !view.is_element() {
            self.push(view, current.cyan().to_string());
        }
        None
    }

    fn edit_bulk(&mut self, view: &FieldView<'_>, current: &str) -> Option<String> {
        if !current.is_empty() || self.show_unset {
            self.push(view, format!("[{}]", current).green().to_string());
        }
        None
    }

    fn show_bytes(&mut self, view: &FieldView<'_>, hex: &str) {
        let value = if hex.is_empty() { "(empty)".to_string() } else { hex.to_string() };
        self.push(view, value.yellow().to_string());
    }

    fn offer_append(&mut self, view: &FieldView<'_>) -> bool {
        if self.open_lists.last().map(String::as_str) == Some(view.path) {
            self.open_lists.pop();
            self.depth = self.depth.saturating_sub(1);
        }
        false
    }

    fn enter_message(&mut self, view: &FieldView<'_>) {
        if view.index == Some(0) {
            let header = format!("{}{}:", "  ".repeat(self.depth), view.field.name.bold());
            self.lines.push(header);
            self.open_lists.push(list_path(view.path).to_string());
            self.depth += 1;
        }
        let line = format!("{}{}:", "  ".repeat(self.depth), Self::label(view).bold());
        self.lines.push(line);
        self.depth += 1;
    }

    fn leave_message(&mut self, _view: &FieldView<'_>) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// `items[0]` → `items`
fn list_path(element: &str) -> &str {
    element.rfind('[').map_or(element, |at| &element[..at])
}
