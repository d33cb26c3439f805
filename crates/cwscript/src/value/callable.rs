//! Function values

use std::rc::Rc;

use super::ValueId;
use crate::ast::Block;

/// A script function: ordered parameter names plus a shared body.
///
/// Functions compare by identity only.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    id: ValueId,
    params: Rc<[String]>,
    body: Rc<Block>,
}

impl FunctionValue {
    pub(crate) fn new(id: ValueId, params: Rc<[String]>, body: Rc<Block>) -> Self {
        Self { id, params, body }
    }

    /// Identity of this function.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Body block, shared with the AST.
    pub fn body(&self) -> &Rc<Block> {
        &self.body
    }
}
