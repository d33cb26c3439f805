//! Loop evaluation: while and for

use std::rc::Rc;

use super::control::Interrupt;
use super::frame::{expect_value, Step};
use crate::ast::{ArgSpec, Block, NodeRef};
use crate::error::Result;
use crate::value::{ValueType, VariableRef};
use crate::Value;

// ═══════════════════════════════════════════════════════════════════════
// While Loop
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhilePhase {
    /// Evaluate the condition next
    Check,
    /// Waiting for the condition value
    Condition,
    /// Waiting for the body to finish
    Body,
    /// Stopped by `break`
    Broken,
}

/// `while cond {body}`.
#[derive(Debug)]
pub(crate) struct WhileFrame {
    cond: NodeRef,
    body: Rc<Block>,
    phase: WhilePhase,
    ran: bool,
}

impl WhileFrame {
    pub(crate) fn new(cond: &NodeRef, body: &Rc<Block>) -> Self {
        Self {
            cond: Rc::clone(cond),
            body: Rc::clone(body),
            phase: WhilePhase::Check,
            ran: false,
        }
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>) -> Result<Step> {
        match self.phase {
            WhilePhase::Check | WhilePhase::Body => {
                self.phase = WhilePhase::Condition;
                Ok(Step::Eval(Rc::clone(&self.cond), ArgSpec::ANY))
            }
            WhilePhase::Condition => {
                if expect_value(incoming, "while")?.to_bool() {
                    self.ran = true;
                    self.phase = WhilePhase::Body;
                    Ok(Step::Run(Rc::clone(&self.body)))
                } else {
                    Ok(Step::Done(Value::Bool(self.ran)))
                }
            }
            WhilePhase::Broken => Ok(Step::Done(Value::Bool(self.ran))),
        }
    }

    /// Catches `break` (stop) and `continue` (re-check the condition).
    pub(crate) fn handle_interrupt(&mut self, interrupt: &Interrupt) -> bool {
        match interrupt {
            Interrupt::Break { .. } => {
                self.phase = WhilePhase::Broken;
                true
            }
            Interrupt::Continue { .. } => {
                self.phase = WhilePhase::Check;
                true
            }
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// For Loop
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum ForPhase {
    Start,
    /// Waiting for the loop variable reference
    Target,
    /// Waiting for the source list
    Source(VariableRef),
    /// Iterating over a snapshot of the source
    Iterate {
        target: VariableRef,
        items: Vec<Value>,
        next: usize,
    },
    /// Stopped by `break`
    Broken,
}

/// `for target source {body}`.
///
/// The source list is snapshotted once; mutating it inside the body does
/// not change the number of iterations.
#[derive(Debug)]
pub(crate) struct ForFrame {
    target: NodeRef,
    source: NodeRef,
    body: Rc<Block>,
    phase: ForPhase,
    ran: bool,
}

impl ForFrame {
    pub(crate) fn new(target: &NodeRef, source: &NodeRef, body: &Rc<Block>) -> Self {
        Self {
            target: Rc::clone(target),
            source: Rc::clone(source),
            body: Rc::clone(body),
            phase: ForPhase::Start,
            ran: false,
        }
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>) -> Result<Step> {
        match std::mem::replace(&mut self.phase, ForPhase::Broken) {
            ForPhase::Start => {
                self.phase = ForPhase::Target;
                Ok(Step::Eval(Rc::clone(&self.target), ArgSpec::TARGET))
            }
            ForPhase::Target => {
                let target = expect_value(incoming, "for")?.as_variable()?.clone();
                self.phase = ForPhase::Source(target);
                Ok(Step::Eval(
                    Rc::clone(&self.source),
                    ArgSpec::value(ValueType::List),
                ))
            }
            ForPhase::Source(target) => {
                let items = expect_value(incoming, "for")?.as_list()?.snapshot();
                self.next_iteration(target, items, 0)
            }
            ForPhase::Iterate {
                target,
                items,
                next,
            } => self.next_iteration(target, items, next),
            ForPhase::Broken => Ok(Step::Done(Value::Bool(self.ran))),
        }
    }

    fn next_iteration(
        &mut self,
        target: VariableRef,
        items: Vec<Value>,
        next: usize,
    ) -> Result<Step> {
        let Some(item) = items.get(next) else {
            return Ok(Step::Done(Value::Bool(self.ran)));
        };
        target.set(item.clone())?;
        self.ran = true;
        self.phase = ForPhase::Iterate {
            target,
            items,
            next: next + 1,
        };
        Ok(Step::Run(Rc::clone(&self.body)))
    }

    /// Catches `break` (stop) and `continue` (move to the next element).
    ///
    /// A `continue` raised while the target or source is still being
    /// evaluated restarts that evaluation, as `while` re-checks its
    /// condition.
    pub(crate) fn handle_interrupt(&mut self, interrupt: &Interrupt) -> bool {
        match interrupt {
            Interrupt::Break { .. } => {
                self.phase = ForPhase::Broken;
                true
            }
            Interrupt::Continue { .. } => {
                // The iterate phase already points at the next element.
                if matches!(self.phase, ForPhase::Target | ForPhase::Source(_)) {
                    self.phase = ForPhase::Start;
                }
                true
            }
            _ => false,
        }
    }
}
