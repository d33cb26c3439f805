//! # CWScript
//!
//! A resumable interpreter for CWScript, a small dynamically typed
//! scripting language.
//!
//! Programs are parsed into an immutable AST and run on an explicit
//! execution stack rather than the host call stack. Every call to
//! [`Program::advance`] performs one micro-step, so a host can single-step,
//! enforce step budgets or interleave several scripts.
//!
//! ## Architecture
//!
//! - **Frontend**: source text to [`ast::Block`]
//! - **Values**: scalars plus shared, identity-carrying containers
//! - **Machine**: the frame stack, interrupts (`return`, `break`,
//!   `continue`, `throw`) and scope chain
//! - **Program**: host-facing driver and error reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod frontend;
pub mod program;
pub mod value;

// Re-export main types
pub use ast::{ArgSpec, Block, Node, NodeKind, NodeRef, Op};
pub use context::EvalContext;
pub use environment::ScopeChain;
pub use error::{CatchableError, CatchableKind, ErrorKind, EvalError, Result, ScriptError};
pub use eval::{Interrupt, Machine};
pub use program::{OutputBuffer, Program};
pub use value::{
    Container, FieldKey, FunctionValue, IdGenerator, ListRef, Number, ObjectRef, Value, ValueId,
    ValueType, VariableRef,
};

/// CWScript version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
