//! Shared task types
//!
//! Types handed from the orchestrator to capabilities. They live in the SDK so
//! that capability crates do not need to depend on the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a detected task
///
/// Ordering follows the rank: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric rank used for sorting (high = 3, medium = 2, low = 1)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context handed to a capability alongside the case text
///
/// Each capability receives its own copy; nothing in it is shared with
/// sibling invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Task category that triggered this invocation (e.g. "records_analysis")
    pub task_type: String,

    /// Priority of the triggering task
    pub priority: Priority,

    /// Free-form note describing why the task was detected
    pub context: String,
}

impl TaskContext {
    /// Create a new task context
    pub fn new(task_type: impl Into<String>, priority: Priority, context: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            priority,
            context: context.into(),
        }
    }
}
