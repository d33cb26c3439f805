//! Error types for CWScript lexing, parsing and evaluation

use std::fmt;

use thiserror::Error;

use crate::value::ValueType;

// ═══════════════════════════════════════════════════════════════════════
// Host-facing errors
// ═══════════════════════════════════════════════════════════════════════

/// Broad class of a [`ScriptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tokenization failure
    Lex,
    /// Structural failure while building the AST
    Parse,
    /// Failure while evaluating a well-formed program
    Runtime,
    /// Anything else (internal logic errors, output failures)
    Misc,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex => "Lex",
            ErrorKind::Parse => "Parse",
            ErrorKind::Runtime => "Runtime",
            ErrorKind::Misc => "Misc",
        };
        f.write_str(name)
    }
}

/// A fatal error reported to the host.
///
/// Carries the kind tag, a message, the 0-based source line when known,
/// and optionally the text of that line for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// Error class
    pub kind: ErrorKind,

    /// Human-readable message
    pub message: String,

    /// 0-based source line, if known
    pub line: Option<usize>,

    /// Source text of the offending line, filled in by the host
    pub context: Option<String>,
}

impl ScriptError {
    /// Create an error with no location.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            context: None,
        }
    }

    /// Create a lex error at a line.
    pub fn lex(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Lex, message).at_line(line)
    }

    /// Create a parse error at a line.
    pub fn parse(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Parse, message).at_line(line)
    }

    /// Attach a line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Fill in the context snippet from the program source.
    ///
    /// Does nothing when the error has no line or the line is past the end
    /// of `source`.
    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(line) = self.line {
            self.context = source.lines().nth(line).map(|l| l.trim().to_string());
        }
        self
    }

    /// Convert an evaluation failure, attributing it to `line`.
    ///
    /// Interrupt failures carry their own originating line, which wins.
    pub fn from_eval(err: &EvalError, line: usize) -> Self {
        Self::new(err.kind(), err.to_string()).at_line(err.line().unwrap_or(line))
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line + 1)?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n    {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ScriptError {}

// ═══════════════════════════════════════════════════════════════════════
// Catchable (domain) errors
// ═══════════════════════════════════════════════════════════════════════

/// Tag of a [`CatchableError`], visible to scripts as the `kind` field of
/// a caught exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchableKind {
    /// Division, modulus or negative power with a zero divisor
    ZeroDivision,
    /// Logarithm or square root outside the function's domain
    MathDomain,
    /// Container index out of range in `pop`
    InvalidIndex,
}

impl CatchableKind {
    /// Short tag used in messages and exception objects.
    pub fn tag(&self) -> &'static str {
        match self {
            CatchableKind::ZeroDivision => "zero_division",
            CatchableKind::MathDomain => "math_domain",
            CatchableKind::InvalidIndex => "invalid_index",
        }
    }
}

/// A domain error that a script can intercept with `try`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {message}", kind.tag())]
pub struct CatchableError {
    /// Error tag
    pub kind: CatchableKind,

    /// Description of what went wrong
    pub message: String,
}

impl CatchableError {
    /// Division by zero.
    pub fn zero_division() -> Self {
        Self {
            kind: CatchableKind::ZeroDivision,
            message: "division by zero".to_string(),
        }
    }

    /// Argument outside a math function's domain.
    pub fn math_domain(message: impl Into<String>) -> Self {
        Self {
            kind: CatchableKind::MathDomain,
            message: message.into(),
        }
    }

    /// Container index out of range.
    pub fn invalid_index(message: impl Into<String>) -> Self {
        Self {
            kind: CatchableKind::InvalidIndex,
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Evaluation errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised by the evaluation core.
///
/// These carry no line information; the driver attributes them to the
/// line that was executing when they surfaced.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A value did not satisfy the type an operation required
    #[error("Type assertion of type {expected} failed for value: {got}")]
    TypeAssertion {
        /// Required type
        expected: ValueType,
        /// Display form of the offending value
        got: String,
    },

    /// Operand combination an operator does not support
    #[error("Unsupported operand types for '{op}': {left} and {right}")]
    UnsupportedOperands {
        /// Operator symbol
        op: &'static str,
        /// Type of the left operand
        left: &'static str,
        /// Type of the right operand
        right: &'static str,
    },

    /// List or string index outside `[-len, len)`
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Length of the container
        len: usize,
    },

    /// Read of a key or variable that does not exist
    #[error("Invalid variable '{name}'")]
    MissingKey {
        /// Key or variable name
        name: String,
    },

    /// Function called with the wrong number of arguments
    #[error("Wrong number of arguments for function call: expected {expected}, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Too many nested function or object scopes
    #[error("Maximum recursion depth of {max} exceeded")]
    RecursionLimit {
        /// Configured limit
        max: usize,
    },

    /// An interrupt reached the bottom of the stack
    #[error("Unhandled interrupt: {kind}")]
    UnhandledInterrupt {
        /// `return`, `break` or `continue`
        kind: &'static str,
        /// Line that raised the interrupt
        line: usize,
    },

    /// `break` or `continue` reached a function or object boundary
    #[error("Invalid use of {0}")]
    InvalidInterrupt(&'static str),

    /// A catchable error that no `try` intercepted
    #[error(transparent)]
    Catchable(#[from] CatchableError),

    /// A thrown value that no `try` intercepted
    #[error("Uncaught exception: {value}")]
    UncaughtException {
        /// Display form of the thrown value
        value: String,
        /// Line of the `throw`
        line: usize,
    },

    /// Integer arithmetic overflowed 64 bits
    #[error("Integer overflow in '{0}'")]
    Overflow(&'static str),

    /// Other invalid runtime values (bad range step, bad conversion, ...)
    #[error("{0}")]
    Invalid(String),

    /// Writing `print` output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Broken internal invariant; never caused by a valid script
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Build a type assertion failure for `value`.
    pub fn type_assertion(expected: ValueType, value: &crate::Value) -> Self {
        EvalError::TypeAssertion {
            expected,
            got: value.to_display(false),
        }
    }

    /// Host-facing class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Output(_) | EvalError::Internal(_) => ErrorKind::Misc,
            _ => ErrorKind::Runtime,
        }
    }

    /// Line carried by the error itself, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            EvalError::UnhandledInterrupt { line, .. }
            | EvalError::UncaughtException { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type alias for evaluation.
pub type Result<T> = std::result::Result<T, EvalError>;
