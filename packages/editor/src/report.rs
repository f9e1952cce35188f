use serde::{Deserialize, Serialize};

/// What a traversal pass did to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldOutcome {
    NoOp,
    Created,
    ValueChanged,
    Removed,
    /// A nested message was visited
    Entered,
}

impl FieldOutcome {
    pub fn is_change(self) -> bool {
        matches!(
            self,
            FieldOutcome::Created | FieldOutcome::ValueChanged | FieldOutcome::Removed
        )
    }
}

/// Outcome of one visited field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEvent {
    /// Dotted path such as `items[2].name`
    pub path: String,
    pub outcome: FieldOutcome,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A message surfaced to the user during a traversal pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,

    /// Path of the field the diagnostic is about
    pub path: String,

    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of one traversal pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitReport {
    pub events: Vec<FieldEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

impl VisitReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<String>, outcome: FieldOutcome) {
        self.events.push(FieldEvent {
            path: path.into(),
            outcome,
        });
    }

    /// Whether the pass mutated the record
    pub fn changed(&self) -> bool {
        self.events.iter().any(|e| e.outcome.is_change())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }

    /// Most significant outcome recorded for `path`
    ///
    /// A field can produce several events in one pass (an element edit
    /// followed by a removal, say); changes win over `Entered`/`NoOp`.
    pub fn outcome_of(&self, path: &str) -> Option<FieldOutcome> {
        let mut found = None;
        for event in self.events.iter().filter(|e| e.path == path) {
            match found {
                Some(current) if FieldOutcome::is_change(current) => {}
                _ => found = Some(event.outcome),
            }
        }
        found
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_detection() {
        let mut report = VisitReport::new();
        report.record("a", FieldOutcome::NoOp);
        report.record("b", FieldOutcome::Entered);
        assert!(!report.changed());

        report.record("c", FieldOutcome::Created);
        assert!(report.changed());
    }

    #[test]
    fn test_outcome_of_prefers_changes() {
        let mut report = VisitReport::new();
        report.record("items", FieldOutcome::ValueChanged);
        report.record("items", FieldOutcome::NoOp);
        assert_eq!(report.outcome_of("items"), Some(FieldOutcome::ValueChanged));
        assert_eq!(report.outcome_of("missing"), None);
    }

    #[test]
    fn test_report_serializes_camel_case_outcomes() {
        let mut report = VisitReport::new();
        report.record("x", FieldOutcome::ValueChanged);
        report.diagnostics.push(Diagnostic::error("x", "bad"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["events"][0]["outcome"], "valueChanged");
        assert_eq!(json["diagnostics"][0]["level"], "Error");
        assert!(report.has_errors());
    }
}
