//! Function calls and object literals: the constructs that own a scope

use std::rc::Rc;

use tracing::debug;

use super::control::Interrupt;
use super::frame::{expect_value, Step};
use super::State;
use crate::ast::{ArgSpec, Block, NodeRef};
use crate::error::{EvalError, Result};
use crate::value::{FunctionValue, ObjectRef, ValueType};
use crate::Value;

// ═══════════════════════════════════════════════════════════════════════
// Function Call
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum CallPhase {
    Start,
    /// Waiting for the function value
    Callee,
    /// Waiting for the argument list
    Args(FunctionValue),
    /// Body running in its own scope
    Body { returned: Option<Value> },
}

/// `call(callee, [args])`.
///
/// Binds the arguments in a fresh scope, runs the body and yields the
/// value of the first `return` reached, or null.
#[derive(Debug)]
pub(crate) struct CallFrame {
    callee: NodeRef,
    args: NodeRef,
    phase: CallPhase,
}

impl CallFrame {
    pub(crate) fn new(callee: &NodeRef, args: &NodeRef) -> Self {
        Self {
            callee: Rc::clone(callee),
            args: Rc::clone(args),
            phase: CallPhase::Start,
        }
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>, st: &mut State) -> Result<Step> {
        match std::mem::replace(&mut self.phase, CallPhase::Start) {
            CallPhase::Start => {
                self.phase = CallPhase::Callee;
                Ok(Step::Eval(
                    Rc::clone(&self.callee),
                    ArgSpec::value(ValueType::Function),
                ))
            }
            CallPhase::Callee => {
                let func = expect_value(incoming, "call")?.as_function()?.clone();
                self.phase = CallPhase::Args(func);
                Ok(Step::Eval(
                    Rc::clone(&self.args),
                    ArgSpec::value(ValueType::List),
                ))
            }
            CallPhase::Args(func) => {
                let args = expect_value(incoming, "call")?.as_list()?.snapshot();
                if args.len() != func.arity() {
                    return Err(EvalError::ArityMismatch {
                        expected: func.arity(),
                        got: args.len(),
                    });
                }
                let scope = st.push_scope()?;
                for (name, value) in func.params().iter().zip(args) {
                    scope.set(name.clone(), value);
                }
                self.phase = CallPhase::Body { returned: None };
                Ok(Step::Run(Rc::clone(func.body())))
            }
            CallPhase::Body { returned } => {
                st.scopes.pop();
                Ok(Step::Done(returned.unwrap_or(Value::Null)))
            }
        }
    }

    /// Catches `return` from the body; loop signals reaching a function
    /// boundary are errors.
    pub(crate) fn handle_interrupt(&mut self, interrupt: &Interrupt) -> Result<bool> {
        if !matches!(self.phase, CallPhase::Body { .. }) {
            return Ok(false);
        }
        match interrupt {
            Interrupt::Return { value, .. } => {
                self.phase = CallPhase::Body {
                    returned: Some(value.clone()),
                };
                Ok(true)
            }
            Interrupt::Break { .. } | Interrupt::Continue { .. } => {
                Err(EvalError::InvalidInterrupt(interrupt.name()))
            }
            Interrupt::Exception { .. } => Ok(false),
        }
    }

    pub(crate) fn discard(self, st: &mut State) {
        if let CallPhase::Body { .. } = self.phase {
            debug!(depth = st.scopes.depth(), "unwinding function scope");
            st.scopes.pop();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Object Literal
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum ObjectPhase {
    Start,
    Body(ObjectRef),
}

/// `object {body}`: runs the body with a fresh scope and yields that
/// scope as an object.
#[derive(Debug)]
pub(crate) struct ObjectFrame {
    body: Rc<Block>,
    phase: ObjectPhase,
}

impl ObjectFrame {
    pub(crate) fn new(body: &Rc<Block>) -> Self {
        Self {
            body: Rc::clone(body),
            phase: ObjectPhase::Start,
        }
    }

    pub(crate) fn resume(&mut self, st: &mut State) -> Result<Step> {
        match &self.phase {
            ObjectPhase::Start => {
                let scope = st.push_scope()?;
                self.phase = ObjectPhase::Body(scope);
                Ok(Step::Run(Rc::clone(&self.body)))
            }
            ObjectPhase::Body(scope) => {
                st.scopes.pop();
                Ok(Step::Done(Value::Object(scope.clone())))
            }
        }
    }

    /// Swallows `return` (the object is still the result); loop signals
    /// are errors.
    pub(crate) fn handle_interrupt(&mut self, interrupt: &Interrupt) -> Result<bool> {
        if matches!(self.phase, ObjectPhase::Start) {
            return Ok(false);
        }
        match interrupt {
            Interrupt::Return { .. } => Ok(true),
            Interrupt::Break { .. } | Interrupt::Continue { .. } => {
                Err(EvalError::InvalidInterrupt(interrupt.name()))
            }
            Interrupt::Exception { .. } => Ok(false),
        }
    }

    pub(crate) fn discard(self, st: &mut State) {
        if let ObjectPhase::Body(_) = self.phase {
            debug!(depth = st.scopes.depth(), "unwinding object scope");
            st.scopes.pop();
        }
    }
}
