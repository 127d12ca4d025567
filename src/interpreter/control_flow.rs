// File: src/interpreter/control_flow.rs
//
// Execution status threaded through statement execution.
//
// Every statement reports whether execution should carry on with the next
// statement or unwind to the caller because a `return` was executed. The
// interpreter checks this after each statement of a block instead of using
// exceptions for early exit.

use super::value::Value;

/// Outcome of executing a statement or a statement list
#[derive(Debug, Clone)]
pub(crate) enum ExecStatus {
    /// Normal execution, continue with the next statement
    Continue,
    /// `return` executed: stop at every level up to the activation
    Return(Value),
}

impl ExecStatus {
    /// Value produced by an activation body; Nil when it never returned
    pub(crate) fn into_value(self) -> Value {
        match self {
            ExecStatus::Continue => Value::Nil,
            ExecStatus::Return(value) => value,
        }
    }
}
