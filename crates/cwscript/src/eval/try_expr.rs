//! `try {body} .name {handler}`

use std::rc::Rc;

use tracing::debug;

use super::control::Interrupt;
use super::frame::Step;
use super::State;
use crate::ast::Block;
use crate::error::Result;
use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Body,
    Caught,
    Handler,
}

/// Runs `body`; an exception escaping it is bound to `name` in the current
/// scope and `handler` runs. Yields whether an exception was caught.
#[derive(Debug)]
pub(crate) struct TryFrame {
    body: Rc<Block>,
    name: String,
    handler: Rc<Block>,
    phase: Phase,
}

impl TryFrame {
    pub(crate) fn new(body: &Rc<Block>, name: &str, handler: &Rc<Block>) -> Self {
        Self {
            body: Rc::clone(body),
            name: name.to_string(),
            handler: Rc::clone(handler),
            phase: Phase::Start,
        }
    }

    pub(crate) fn resume(&mut self, st: &mut State) -> Result<Step> {
        match self.phase {
            Phase::Start => {
                st.guards += 1;
                self.phase = Phase::Body;
                Ok(Step::Run(Rc::clone(&self.body)))
            }
            Phase::Body => {
                st.guards -= 1;
                Ok(Step::Done(Value::Bool(false)))
            }
            Phase::Caught => {
                self.phase = Phase::Handler;
                Ok(Step::Run(Rc::clone(&self.handler)))
            }
            Phase::Handler => Ok(Step::Done(Value::Bool(true))),
        }
    }

    /// Catches exceptions raised while the body runs.
    pub(crate) fn handle_interrupt(&mut self, interrupt: &Interrupt, st: &mut State) -> bool {
        match (self.phase, interrupt) {
            (Phase::Body, Interrupt::Exception { value, line }) => {
                debug!(line, name = %self.name, "exception caught");
                st.guards -= 1;
                st.scopes.current().set(self.name.clone(), value.clone());
                self.phase = Phase::Caught;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn discard(self, st: &mut State) {
        if self.phase == Phase::Body {
            st.guards -= 1;
        }
    }
}
