//! Interrupts: non-local control flow through the execution stack

use crate::error::EvalError;
use crate::Value;

/// Control signal raised by `return`, `break`, `continue` or `throw`.
///
/// A raised interrupt is held by the machine and offered to the topmost
/// stack frame on the next step. Frames that do not handle it are
/// discarded until one does.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// Return from the enclosing function with a value.
    Return {
        /// Value the call produces
        value: Value,
        /// Line of the `return`
        line: usize,
    },

    /// Leave the innermost loop.
    Break {
        /// Line of the `break`
        line: usize,
    },

    /// Skip to the next iteration of the innermost loop.
    Continue {
        /// Line of the `continue`
        line: usize,
    },

    /// Unwind to the innermost `try`.
    Exception {
        /// Value bound in the handler
        value: Value,
        /// Line that raised it
        line: usize,
    },
}

impl Interrupt {
    /// Create a return.
    pub fn return_value(value: Value, line: usize) -> Self {
        Interrupt::Return { value, line }
    }

    /// Create a break.
    pub fn break_loop(line: usize) -> Self {
        Interrupt::Break { line }
    }

    /// Create a continue.
    pub fn continue_loop(line: usize) -> Self {
        Interrupt::Continue { line }
    }

    /// Create an exception.
    pub fn exception(value: Value, line: usize) -> Self {
        Interrupt::Exception { value, line }
    }

    /// Line that raised the interrupt.
    pub fn line(&self) -> usize {
        match self {
            Interrupt::Return { line, .. }
            | Interrupt::Break { line }
            | Interrupt::Continue { line }
            | Interrupt::Exception { line, .. } => *line,
        }
    }

    /// Keyword that raised the interrupt.
    pub fn name(&self) -> &'static str {
        match self {
            Interrupt::Return { .. } => "return",
            Interrupt::Break { .. } => "break",
            Interrupt::Continue { .. } => "continue",
            Interrupt::Exception { .. } => "throw",
        }
    }

    /// Error reported when no frame handles this interrupt.
    pub fn into_unhandled(self) -> EvalError {
        match self {
            Interrupt::Exception { value, line } => EvalError::UncaughtException {
                value: value.to_display(false),
                line,
            },
            other => EvalError::UnhandledInterrupt {
                kind: other.name(),
                line: other.line(),
            },
        }
    }
}

impl PartialEq for Interrupt {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Interrupt::Return {
                    value: v1,
                    line: l1,
                },
                Interrupt::Return {
                    value: v2,
                    line: l2,
                },
            )
            | (
                Interrupt::Exception {
                    value: v1,
                    line: l1,
                },
                Interrupt::Exception {
                    value: v2,
                    line: l2,
                },
            ) => v1 == v2 && l1 == l2,
            (Interrupt::Break { line: l1 }, Interrupt::Break { line: l2 })
            | (Interrupt::Continue { line: l1 }, Interrupt::Continue { line: l2 }) => l1 == l2,
            _ => false,
        }
    }
}
