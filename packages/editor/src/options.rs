use serde::{Deserialize, Serialize};

/// Default bound on chains of required nested messages
pub const DEFAULT_MAX_COMPLETION_DEPTH: usize = 64;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    /// Longest chain of required message fields completion will follow
    #[serde(default = "default_max_completion_depth")]
    pub max_completion_depth: usize,
}

fn default_max_completion_depth() -> usize {
    DEFAULT_MAX_COMPLETION_DEPTH
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_completion_depth: DEFAULT_MAX_COMPLETION_DEPTH,
        }
    }
}
