//! Resumable, explicit-stack evaluation
//!
//! The [`Machine`] never recurses on the host stack for script-level
//! evaluation. Each call to [`Machine::step`] performs one unit of work on
//! the active frame (the topmost frame that is not already a value) and
//! returns, so a host can interleave scripts, enforce step budgets or
//! single-step for debugging.

pub mod control;

mod binary;
mod branch;
mod builtins;
mod call;
mod frame;
mod loops;
mod try_expr;
mod unary;

pub use control::Interrupt;

use std::io::Write;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::ast::{ArgSpec, Block};
use crate::environment::ScopeChain;
use crate::error::{CatchableError, EvalError, Result};
use crate::value::{IdGenerator, ObjectRef};
use crate::{EvalContext, Value};

use frame::{finalize, produce, Frame, Produced, Step};

/// Mutable state shared by all frames of one run.
pub(crate) struct State {
    /// Global scope plus one scope per active call/object literal
    pub(crate) scopes: ScopeChain,

    /// Identity source for new shared values
    pub(crate) ids: IdGenerator,

    /// Generator behind `random` / `random_int`
    pub(crate) rng: StdRng,

    /// Interrupt waiting to be offered to the top frame
    pub(crate) pending: Option<Interrupt>,

    /// Sink for `print`
    pub(crate) out: Box<dyn Write>,

    /// Line of the most recently started node
    pub(crate) line: usize,

    /// Number of `try` frames currently running their body
    pub(crate) guards: usize,
}

impl State {
    /// Set `interrupt` pending. Raising while another is pending is an
    /// internal error.
    pub(crate) fn raise(&mut self, interrupt: Interrupt) -> Result<()> {
        if let Some(pending) = &self.pending {
            return Err(EvalError::Internal(format!(
                "'{}' raised while '{}' is pending",
                interrupt.name(),
                pending.name()
            )));
        }
        debug!(kind = interrupt.name(), line = interrupt.line(), "interrupt raised");
        self.pending = Some(interrupt);
        Ok(())
    }

    /// Push a fresh scope and return it.
    pub(crate) fn push_scope(&mut self) -> Result<ObjectRef> {
        let scope = self.ids.empty_object();
        self.scopes.push(scope.clone())?;
        Ok(scope)
    }

    /// Exception payload for a catchable error: `{kind, message}`.
    fn exception_payload(&mut self, err: &CatchableError) -> Value {
        let payload = self.ids.empty_object();
        payload.set("kind", Value::string(err.kind.tag()));
        payload.set("message", Value::string(err.message.as_str()));
        Value::Object(payload)
    }
}

/// The execution stack plus the state it operates on.
pub struct Machine {
    stack: Vec<Frame>,
    state: State,
    trace: bool,
}

impl Machine {
    /// Prepare to run `root`, writing `print` output to `out`.
    pub fn new(root: Rc<Block>, ctx: &EvalContext, out: Box<dyn Write>) -> Self {
        let mut ids = IdGenerator::new();
        let global = ids.empty_object();
        let rng = match ctx.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let line = root.line;
        Self {
            stack: vec![Frame::block(root)],
            state: State {
                scopes: ScopeChain::new(global, ctx.max_call_depth),
                ids,
                rng,
                pending: None,
                out,
                line,
                guards: 0,
            },
            trace: ctx.trace,
        }
    }

    /// Whether any work remains: false once the stack holds only the final
    /// program result.
    pub fn has_work(&self) -> bool {
        if self.state.pending.is_some() {
            return true;
        }
        match self.stack.as_slice() {
            [] | [Frame::Value(_)] => false,
            _ => true,
        }
    }

    /// Line of the most recently started node.
    pub fn current_line(&self) -> usize {
        self.state.line
    }

    /// The global scope.
    pub fn global_scope(&self) -> &ObjectRef {
        self.state.scopes.global()
    }

    /// Number of frames on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Value left by the finished program (null for a block).
    pub fn result(&self) -> Option<&Value> {
        match self.stack.as_slice() {
            [Frame::Value(value)] => Some(value),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Stepping
    // ═══════════════════════════════════════════════════════════════════

    /// Perform one micro-step. Returns whether work remains.
    ///
    /// A pending interrupt is offered to the topmost frame instead of
    /// normal evaluation. A catchable error becomes an exception interrupt
    /// when some `try` is running its body; otherwise it is returned.
    pub fn step(&mut self) -> Result<bool> {
        if let Some(interrupt) = self.state.pending.take() {
            self.dispatch(interrupt)?;
            return Ok(self.has_work());
        }
        if !self.has_work() {
            return Ok(false);
        }

        match self.step_frame() {
            Ok(()) => {}
            Err(EvalError::Catchable(err)) if self.state.guards > 0 => {
                debug!(kind = err.kind.tag(), line = self.state.line, "catchable error raised as exception");
                let payload = self.state.exception_payload(&err);
                let interrupt = Interrupt::exception(payload, self.state.line);
                self.state.raise(interrupt)?;
            }
            Err(err) => return Err(err),
        }
        Ok(self.has_work())
    }

    /// Offer `interrupt` to the top frame; discard the frame if it does not
    /// handle it.
    fn dispatch(&mut self, interrupt: Interrupt) -> Result<()> {
        let Some(top) = self.stack.last_mut() else {
            return Err(interrupt.into_unhandled());
        };
        if top.handle_interrupt(&interrupt, &mut self.state)? {
            debug!(kind = interrupt.name(), frame = top.kind_name(), "interrupt handled");
            return Ok(());
        }
        if let Some(frame) = self.stack.pop() {
            frame.discard(&mut self.state);
        }
        if self.stack.is_empty() {
            return Err(interrupt.into_unhandled());
        }
        self.state.pending = Some(interrupt);
        Ok(())
    }

    fn step_frame(&mut self) -> Result<()> {
        let active = self
            .stack
            .iter()
            .rposition(|frame| !frame.is_value())
            .ok_or_else(|| EvalError::Internal("no frame to advance".into()))?;
        let produced = self.stack.len() - active - 1;

        if self.trace {
            trace!(
                depth = self.stack.len(),
                frame = self.stack[active].kind_name(),
                produced,
                line = self.state.line,
                "step"
            );
        }

        match &mut self.stack[active] {
            Frame::Value(_) => Err(EvalError::Internal("value frame selected as active".into())),

            Frame::Request { node, spec } => {
                let (node, spec) = (Rc::clone(node), *spec);
                self.state.line = node.line;
                match produce(&node, &mut self.state)? {
                    Produced::Value(value) => {
                        self.stack[active] = Frame::Value(finalize(value, spec)?);
                    }
                    Produced::Frame(frame) => {
                        self.stack[active] = Frame::Finish { spec };
                        self.stack.push(frame);
                    }
                }
                Ok(())
            }

            Frame::Finish { spec } => {
                let spec = *spec;
                let value = self.take_produced(active, 1)?.pop().unwrap_or(Value::Null);
                self.stack[active] = Frame::Value(finalize(value, spec)?);
                Ok(())
            }

            Frame::Operation { op, args, line } => {
                let (op, line) = (*op, *line);
                if produced < op.arity() {
                    let node = Rc::clone(&args[produced]);
                    let spec = op.args()[produced];
                    self.stack.push(Frame::Request { node, spec });
                    return Ok(());
                }
                let values = self.take_produced(active, op.arity())?;
                self.stack.truncate(active);
                self.state.line = line;
                let result = builtins::apply(op, values, &mut self.state)?;
                self.stack.push(Frame::Value(result));
                Ok(())
            }

            Frame::List { items } => {
                if produced < items.len() {
                    let node = Rc::clone(&items[produced]);
                    self.stack.push(Frame::Request {
                        node,
                        spec: ArgSpec::ANY,
                    });
                    return Ok(());
                }
                let count = items.len();
                let values = self.take_produced(active, count)?;
                self.stack[active] = Frame::Value(self.state.ids.list_value(values));
                Ok(())
            }

            Frame::Block(cursor) => {
                let next = cursor.next_statement();
                // Statement results are discarded.
                self.stack.truncate(active + 1);
                match next {
                    Some(stmt) => {
                        self.state.line = stmt.line;
                        self.stack.push(Frame::Request {
                            node: stmt,
                            spec: ArgSpec::ANY,
                        });
                    }
                    None => self.stack[active] = Frame::Value(Value::Null),
                }
                Ok(())
            }

            Frame::Control { line, .. } => {
                let line = *line;
                let incoming = match produced {
                    0 => None,
                    _ => self.take_produced(active, 1)?.pop(),
                };
                self.state.line = line;
                let Frame::Control { control, .. } = &mut self.stack[active] else {
                    return Err(EvalError::Internal("control frame moved".into()));
                };
                match control.resume(incoming, &mut self.state)? {
                    Step::Eval(node, spec) => self.stack.push(Frame::Request { node, spec }),
                    Step::Run(block) => self.stack.push(Frame::block(block)),
                    Step::Done(value) => self.stack[active] = Frame::Value(value),
                }
                Ok(())
            }
        }
    }

    /// Pop exactly `count` values produced above the frame at `active`.
    fn take_produced(&mut self, active: usize, count: usize) -> Result<Vec<Value>> {
        if self.stack.len() - active - 1 != count {
            return Err(EvalError::Internal(format!(
                "expected {} produced values, found {}",
                count,
                self.stack.len() - active - 1
            )));
        }
        self.stack
            .drain(active + 1..)
            .map(|frame| match frame {
                Frame::Value(value) => Ok(value),
                other => Err(EvalError::Internal(format!(
                    "{} frame above its consumer",
                    other.kind_name()
                ))),
            })
            .collect()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("depth", &self.stack.len())
            .field("line", &self.state.line)
            .field("pending", &self.state.pending)
            .finish()
    }
}
