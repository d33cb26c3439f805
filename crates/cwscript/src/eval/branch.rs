//! Conditional evaluation: `if` and the short-circuit operators

use std::rc::Rc;

use super::frame::{expect_value, Step};
use crate::ast::{ArgSpec, Block, NodeRef};
use crate::error::Result;
use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Condition,
    Body,
}

/// `if cond {body}`.
///
/// Yields `true` iff the body ran, so that `if (a) {..} else if (b) {..}
/// else {..}` chains through `||`.
#[derive(Debug)]
pub(crate) struct IfFrame {
    cond: NodeRef,
    body: Rc<Block>,
    phase: Phase,
}

impl IfFrame {
    pub(crate) fn new(cond: &NodeRef, body: &Rc<Block>) -> Self {
        Self {
            cond: Rc::clone(cond),
            body: Rc::clone(body),
            phase: Phase::Start,
        }
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>) -> Result<Step> {
        match self.phase {
            Phase::Start => {
                self.phase = Phase::Condition;
                Ok(Step::Eval(Rc::clone(&self.cond), ArgSpec::ANY))
            }
            Phase::Condition => {
                if expect_value(incoming, "if")?.to_bool() {
                    self.phase = Phase::Body;
                    Ok(Step::Run(Rc::clone(&self.body)))
                } else {
                    Ok(Step::Done(Value::Bool(false)))
                }
            }
            Phase::Body => Ok(Step::Done(Value::Bool(true))),
        }
    }
}

/// Shared state of `&&` and `||`: evaluate the left side, maybe the
/// right side, and yield a boolean.
#[derive(Debug)]
struct ShortCircuit {
    left: NodeRef,
    right: NodeRef,
    phase: Phase,
}

impl ShortCircuit {
    fn new(left: &NodeRef, right: &NodeRef) -> Self {
        Self {
            left: Rc::clone(left),
            right: Rc::clone(right),
            phase: Phase::Start,
        }
    }

    /// `stop_on` is the left-side truthiness that decides the result
    /// without evaluating the right side.
    fn resume(&mut self, incoming: Option<Value>, stop_on: bool, who: &str) -> Result<Step> {
        match self.phase {
            Phase::Start => {
                self.phase = Phase::Condition;
                Ok(Step::Eval(Rc::clone(&self.left), ArgSpec::ANY))
            }
            Phase::Condition => {
                if expect_value(incoming, who)?.to_bool() == stop_on {
                    Ok(Step::Done(Value::Bool(stop_on)))
                } else {
                    self.phase = Phase::Body;
                    Ok(Step::Eval(Rc::clone(&self.right), ArgSpec::ANY))
                }
            }
            Phase::Body => Ok(Step::Done(Value::Bool(expect_value(incoming, who)?.to_bool()))),
        }
    }
}

/// `left && right`.
#[derive(Debug)]
pub(crate) struct AndFrame(ShortCircuit);

impl AndFrame {
    pub(crate) fn new(left: &NodeRef, right: &NodeRef) -> Self {
        Self(ShortCircuit::new(left, right))
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>) -> Result<Step> {
        self.0.resume(incoming, false, "&&")
    }
}

/// `left || right`.
#[derive(Debug)]
pub(crate) struct OrFrame(ShortCircuit);

impl OrFrame {
    pub(crate) fn new(left: &NodeRef, right: &NodeRef) -> Self {
        Self(ShortCircuit::new(left, right))
    }

    pub(crate) fn resume(&mut self, incoming: Option<Value>) -> Result<Step> {
        self.0.resume(incoming, true, "||")
    }
}
