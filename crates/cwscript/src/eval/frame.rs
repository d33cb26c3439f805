//! Execution stack frames

use std::rc::Rc;

use super::branch::{AndFrame, IfFrame, OrFrame};
use super::call::{CallFrame, ObjectFrame};
use super::control::Interrupt;
use super::loops::{ForFrame, WhileFrame};
use super::try_expr::TryFrame;
use super::State;
use crate::ast::{ArgSpec, Block, NodeKind, NodeRef, Op};
use crate::error::{EvalError, Result};
use crate::Value;

/// One entry of the execution stack.
#[derive(Debug)]
pub(crate) enum Frame {
    /// Fully reduced result, consumed by the nearest non-value frame below
    Value(Value),

    /// Unevaluated node and the constraint its result must meet
    Request {
        /// Node to evaluate
        node: NodeRef,
        /// Constraint on the result
        spec: ArgSpec,
    },

    /// A request whose node expanded into a frame; finalizes that frame's
    /// result against `spec`
    Finish {
        /// Constraint on the result
        spec: ArgSpec,
    },

    /// Fixed-arity operation collecting its arguments above itself
    Operation {
        /// Operation to apply
        op: Op,
        /// Argument nodes
        args: Rc<[NodeRef]>,
        /// Line of the operation
        line: usize,
    },

    /// Multi-step construct with its own state
    Control {
        /// Line of the construct
        line: usize,
        /// Construct state
        control: ControlFrame,
    },

    /// Position within a block
    Block(BlockFrame),

    /// List literal collecting its elements above itself
    List {
        /// Element nodes
        items: Rc<[NodeRef]>,
    },
}

impl Frame {
    /// Frame for running `block`.
    pub(crate) fn block(block: Rc<Block>) -> Self {
        Frame::Block(BlockFrame::new(block))
    }

    pub(crate) fn is_value(&self) -> bool {
        matches!(self, Frame::Value(_))
    }

    /// Short name for tracing.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Frame::Value(_) => "value",
            Frame::Request { .. } => "request",
            Frame::Finish { .. } => "finish",
            Frame::Operation { .. } => "operation",
            Frame::Control { control, .. } => control.name(),
            Frame::Block(_) => "block",
            Frame::List { .. } => "list",
        }
    }

    /// Offer an interrupt. Only control frames can handle one.
    pub(crate) fn handle_interrupt(
        &mut self,
        interrupt: &Interrupt,
        st: &mut State,
    ) -> Result<bool> {
        match self {
            Frame::Control { control, .. } => control.handle_interrupt(interrupt, st),
            _ => Ok(false),
        }
    }

    /// Release anything the frame holds on the scope chain before it is
    /// dropped during unwinding.
    pub(crate) fn discard(self, st: &mut State) {
        if let Frame::Control { control, .. } = self {
            control.discard(st);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Blocks
// ═══════════════════════════════════════════════════════════════════════

/// Cursor into a block's statements.
#[derive(Debug)]
pub(crate) struct BlockFrame {
    block: Rc<Block>,
    next: usize,
}

impl BlockFrame {
    fn new(block: Rc<Block>) -> Self {
        Self { block, next: 0 }
    }

    /// Next statement to run, advancing the cursor.
    pub(crate) fn next_statement(&mut self) -> Option<NodeRef> {
        let stmt = self.block.statements.get(self.next).cloned();
        if stmt.is_some() {
            self.next += 1;
        }
        stmt
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Control frames
// ═══════════════════════════════════════════════════════════════════════

/// What a control frame wants next.
#[derive(Debug)]
pub(crate) enum Step {
    /// Evaluate a node; its value comes back on the next resume
    Eval(NodeRef, ArgSpec),
    /// Run a block; resumes with null once it is exhausted
    Run(Rc<Block>),
    /// Finished; replace the frame with this value
    Done(Value),
}

/// State of a multi-step construct.
#[derive(Debug)]
pub(crate) enum ControlFrame {
    If(IfFrame),
    While(WhileFrame),
    For(ForFrame),
    Call(CallFrame),
    Object(ObjectFrame),
    And(AndFrame),
    Or(OrFrame),
    Try(TryFrame),
}

impl ControlFrame {
    fn name(&self) -> &'static str {
        match self {
            ControlFrame::If(_) => "if",
            ControlFrame::While(_) => "while",
            ControlFrame::For(_) => "for",
            ControlFrame::Call(_) => "call",
            ControlFrame::Object(_) => "object",
            ControlFrame::And(_) => "and",
            ControlFrame::Or(_) => "or",
            ControlFrame::Try(_) => "try",
        }
    }

    /// Advance the construct, given the value produced by its last
    /// request (if any).
    pub(crate) fn resume(&mut self, incoming: Option<Value>, st: &mut State) -> Result<Step> {
        match self {
            ControlFrame::If(f) => f.resume(incoming),
            ControlFrame::While(f) => f.resume(incoming),
            ControlFrame::For(f) => f.resume(incoming),
            ControlFrame::Call(f) => f.resume(incoming, st),
            ControlFrame::Object(f) => f.resume(st),
            ControlFrame::And(f) => f.resume(incoming),
            ControlFrame::Or(f) => f.resume(incoming),
            ControlFrame::Try(f) => f.resume(st),
        }
    }

    fn handle_interrupt(&mut self, interrupt: &Interrupt, st: &mut State) -> Result<bool> {
        match self {
            ControlFrame::While(f) => Ok(f.handle_interrupt(interrupt)),
            ControlFrame::For(f) => Ok(f.handle_interrupt(interrupt)),
            ControlFrame::Call(f) => f.handle_interrupt(interrupt),
            ControlFrame::Object(f) => f.handle_interrupt(interrupt),
            ControlFrame::Try(f) => Ok(f.handle_interrupt(interrupt, st)),
            ControlFrame::If(_) | ControlFrame::And(_) | ControlFrame::Or(_) => Ok(false),
        }
    }

    fn discard(self, st: &mut State) {
        match self {
            ControlFrame::Call(f) => f.discard(st),
            ControlFrame::Object(f) => f.discard(st),
            ControlFrame::Try(f) => f.discard(st),
            _ => {}
        }
    }
}

/// Take the value a control frame asked for.
pub(crate) fn expect_value(incoming: Option<Value>, who: &str) -> Result<Value> {
    incoming.ok_or_else(|| EvalError::Internal(format!("{} resumed without a value", who)))
}

// ═══════════════════════════════════════════════════════════════════════
// Node production
// ═══════════════════════════════════════════════════════════════════════

/// Result of asking a node for its next step.
pub(crate) enum Produced {
    /// The node reduced immediately
    Value(Value),
    /// The node needs a frame of its own
    Frame(Frame),
}

/// Ask `node` to produce either a value or a frame that computes one.
pub(crate) fn produce(node: &NodeRef, st: &mut State) -> Result<Produced> {
    let value = match &node.kind {
        NodeKind::Null => Value::Null,
        NodeKind::Bool(b) => Value::Bool(*b),
        NodeKind::Int(n) => Value::Int(*n),
        NodeKind::Float(x) => Value::Float(*x),
        NodeKind::Str(s) => Value::String(s.clone()),
        NodeKind::Variable { global, path } => {
            Value::Variable(st.scopes.resolve(*global, path, &mut st.ids)?)
        }
        NodeKind::List(items) if items.is_empty() => st.ids.list_value(Vec::new()),
        NodeKind::List(items) => {
            return Ok(Produced::Frame(Frame::List {
                items: Rc::clone(items),
            }))
        }
        NodeKind::Block(block) => return Ok(Produced::Frame(Frame::block(Rc::clone(block)))),
        NodeKind::Function { params, body } => {
            Value::Function(st.ids.function(Rc::clone(params), Rc::clone(body)))
        }
        NodeKind::Op { op, args } => {
            return Ok(Produced::Frame(Frame::Operation {
                op: *op,
                args: Rc::clone(args),
                line: node.line,
            }))
        }
        _ => {
            return Ok(Produced::Frame(Frame::Control {
                line: node.line,
                control: control_for(node)?,
            }))
        }
    };
    Ok(Produced::Value(value))
}

fn control_for(node: &NodeRef) -> Result<ControlFrame> {
    let control = match &node.kind {
        NodeKind::If { cond, body } => ControlFrame::If(IfFrame::new(cond, body)),
        NodeKind::While { cond, body } => ControlFrame::While(WhileFrame::new(cond, body)),
        NodeKind::For {
            target,
            source,
            body,
        } => ControlFrame::For(ForFrame::new(target, source, body)),
        NodeKind::Call { callee, args } => ControlFrame::Call(CallFrame::new(callee, args)),
        NodeKind::Object(body) => ControlFrame::Object(ObjectFrame::new(body)),
        NodeKind::And(left, right) => ControlFrame::And(AndFrame::new(left, right)),
        NodeKind::Or(left, right) => ControlFrame::Or(OrFrame::new(left, right)),
        NodeKind::Try {
            body,
            name,
            handler,
        } => ControlFrame::Try(TryFrame::new(body, name, handler)),
        other => {
            return Err(EvalError::Internal(format!(
                "node {:?} has no control frame",
                other
            )))
        }
    };
    Ok(control)
}

/// Apply a request's constraint to a produced value.
pub(crate) fn finalize(value: Value, spec: ArgSpec) -> Result<Value> {
    let value = if spec.deref { value.deref()? } else { value };
    if spec.want.matches(&value) {
        Ok(value)
    } else {
        Err(EvalError::type_assertion(spec.want, &value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{IdGenerator, ValueType};

    #[test]
    fn test_finalize_derefs_and_checks() {
        let mut ids = IdGenerator::new();
        let scope = ids.empty_object();
        scope.set("x", Value::Int(3));
        let var = Value::Variable(ids.variable(
            crate::value::Container::Object(scope),
            crate::value::FieldKey::Name("x".into()),
        ));

        let kept = finalize(var.clone(), ArgSpec::TARGET).unwrap();
        assert!(matches!(kept, Value::Variable(_)));

        let read = finalize(var.clone(), ArgSpec::value(ValueType::Numeric)).unwrap();
        assert!(matches!(read, Value::Int(3)));

        assert!(matches!(
            finalize(var, ArgSpec::value(ValueType::String)),
            Err(EvalError::TypeAssertion {
                expected: ValueType::String,
                ..
            })
        ));
    }

    #[test]
    fn test_target_rejects_plain_value() {
        assert!(matches!(
            finalize(Value::Int(1), ArgSpec::TARGET),
            Err(EvalError::TypeAssertion {
                expected: ValueType::Variable,
                ..
            })
        ));
    }

    #[test]
    fn test_block_cursor() {
        let block = Rc::new(Block::new(0, vec![crate::ast::Node::int(1, 1)]));
        let mut cursor = BlockFrame::new(block);
        assert!(cursor.next_statement().is_some());
        assert!(cursor.next_statement().is_none());
        assert!(cursor.next_statement().is_none());
    }
}
