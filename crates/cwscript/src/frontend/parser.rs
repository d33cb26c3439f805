//! Precedence-climbing parser producing [`Block`] trees

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{Block, Node, NodeKind, NodeRef, Op};
use crate::error::ScriptError;

use super::lexer::{Token, TokenKind};

/// Binary operator levels, loosest first. Assignment sits below all of
/// them and is right-associative.
const LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &[">", "<", ">=", "<=", "==", "!="],
    &["+", "-"],
    &["*", "/", "//", "%"],
    &["**"],
];

const ASSIGNMENTS: &[&str] = &["=", "+=", "-=", "*=", "/=", "//=", "%=", "**="];

/// Shape of one argument to a keyword or built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Any expression
    Value,
    /// `{ ... }`
    Block,
    /// Single local variable name
    Param,
    /// List of local variable names
    ParamList,
}

use Shape::{Block as B, Param as P, ParamList as L, Value as V};

/// Keywords that build dedicated node kinds.
fn keyword(name: &str) -> Option<&'static [Shape]> {
    let shapes: &'static [Shape] = match name {
        "if" | "while" => &[V, B],
        "for" => &[V, V, B],
        "call" => &[V, V],
        "object" => &[B],
        "function" => &[L, B],
        "try" => &[B, P, B],
        _ => return None,
    };
    Some(shapes)
}

/// Parsed argument before it is placed into a node.
enum Arg {
    Node(NodeRef),
    Block(Rc<Block>),
    Param(String),
    Params(Vec<String>),
}

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(super) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token stream as the program root.
    pub(super) fn parse_program(mut self) -> Result<Block, ScriptError> {
        let statements = self.statements()?;
        if let Some(token) = self.peek() {
            return Err(ScriptError::parse(
                format!("Unexpected {}", describe(&token.kind)),
                token.line,
            ));
        }
        Ok(Block::new(0, statements))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Token access
    // ═══════════════════════════════════════════════════════════════════

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_op(&self) -> Option<&'static str> {
        match self.peek_kind() {
            Some(TokenKind::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Line of the next token, or of the last one at end of input.
    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::parse(message, self.line())
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ScriptError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(ScriptError::parse(
                format!("Expected {}, found {}", what, describe(&token.kind)),
                token.line,
            )),
            None => Err(self.error(format!("Expected {}, found end of input", what))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    /// Statements up to a closing `}` or end of input.
    fn statements(&mut self) -> Result<Vec<NodeRef>, ScriptError> {
        let mut statements = Vec::new();
        loop {
            match self.peek_kind() {
                None | Some(TokenKind::Close('}')) => return Ok(statements),
                Some(TokenKind::Semicolon) => return Err(self.error("Empty statement")),
                _ => {}
            }
            let statement = self.expression()?;
            match self.peek_kind() {
                Some(TokenKind::Semicolon) => {
                    self.pos += 1;
                }
                _ => {
                    return Err(ScriptError::parse(
                        "Statement does not end with semicolon",
                        statement.line,
                    ))
                }
            }
            statements.push(statement);
        }
    }

    fn block(&mut self) -> Result<Rc<Block>, ScriptError> {
        let open = self.expect(TokenKind::Open('{'), "'{'")?;
        let statements = self.statements()?;
        self.expect(TokenKind::Close('}'), "'}'")?;
        Ok(Rc::new(Block::new(open.line, statements)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    pub(super) fn expression(&mut self) -> Result<NodeRef, ScriptError> {
        let target = self.binary(0)?;
        let Some(symbol) = self.peek_op().filter(|op| ASSIGNMENTS.contains(op)) else {
            return Ok(target);
        };
        let line = self.line();
        self.pos += 1;
        let value = self.expression()?;
        let op = Op::binary(symbol)
            .ok_or_else(|| ScriptError::parse(format!("Unknown operator '{}'", symbol), line))?;
        Ok(Node::op(line, op, vec![target, value]))
    }

    fn binary(&mut self, level: usize) -> Result<NodeRef, ScriptError> {
        let Some(symbols) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut left = self.binary(level + 1)?;
        while let Some(symbol) = self.peek_op().filter(|op| symbols.contains(op)) {
            let line = self.line();
            self.pos += 1;
            let right = self.binary(level + 1)?;
            let kind = match symbol {
                "&&" => NodeKind::And(left, right),
                "||" => NodeKind::Or(left, right),
                _ => {
                    let op = Op::binary(symbol).ok_or_else(|| {
                        ScriptError::parse(format!("Unknown operator '{}'", symbol), line)
                    })?;
                    NodeKind::Op {
                        op,
                        args: vec![left, right].into(),
                    }
                }
            };
            left = Node::new(line, kind);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<NodeRef, ScriptError> {
        let Some(op) = self.peek_op().and_then(Op::prefix) else {
            return self.postfix();
        };
        let line = self.line();
        self.pos += 1;
        let operand = self.unary()?;
        if op == Op::Neg {
            // Negative literals fold at parse time.
            let folded = match operand.kind {
                NodeKind::Int(n) => n.checked_neg().map(NodeKind::Int),
                NodeKind::Float(x) => Some(NodeKind::Float(-x)),
                NodeKind::Bool(b) => Some(NodeKind::Int(-i64::from(b))),
                _ => None,
            };
            if let Some(kind) = folded {
                return Ok(Node::new(line, kind));
            }
        }
        Ok(Node::op(line, op, vec![operand]))
    }

    fn postfix(&mut self) -> Result<NodeRef, ScriptError> {
        let mut node = self.primary()?;
        loop {
            let line = self.line();
            match self.peek_op() {
                Some(":") => {
                    self.pos += 1;
                    let key = match self.peek_op().and_then(Op::prefix) {
                        Some(_) => self.unary()?,
                        None => self.primary()?,
                    };
                    node = Node::op(line, Op::Index, vec![node, key]);
                }
                Some("->") => {
                    self.pos += 1;
                    let args = self.primary()?;
                    node = Node::new(line, NodeKind::Call { callee: node, args });
                }
                _ => return Ok(node),
            }
        }
    }

    fn primary(&mut self) -> Result<NodeRef, ScriptError> {
        let Some(token) = self.advance() else {
            return Err(self.error("Unexpected end of input"));
        };
        let line = token.line;
        let kind = match token.kind {
            TokenKind::Int(n) => NodeKind::Int(n),
            TokenKind::Float(x) => NodeKind::Float(x),
            TokenKind::Str(s) => NodeKind::Str(s),
            TokenKind::Variable { global, path } => NodeKind::Variable { global, path },
            TokenKind::Word(word) => return self.word(word, line),
            TokenKind::Open('(') => {
                let inner = self.expression()?;
                self.expect(TokenKind::Close(')'), "')'")?;
                return Ok(inner);
            }
            TokenKind::Open('[') => {
                let items = self.comma_list(']')?;
                NodeKind::List(items.into())
            }
            TokenKind::Open('{') => {
                self.pos -= 1;
                NodeKind::Block(self.block()?)
            }
            other => {
                return Err(ScriptError::parse(
                    format!("Unexpected {}", describe(&other)),
                    line,
                ))
            }
        };
        Ok(Node::new(line, kind))
    }

    /// Comma-separated expressions after an opening bracket, through the
    /// matching `close`.
    fn comma_list(&mut self, close: char) -> Result<Vec<NodeRef>, ScriptError> {
        let mut items = Vec::new();
        if self.peek_kind() == Some(&TokenKind::Close(close)) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => {}
                Some(Token {
                    kind: TokenKind::Close(c),
                    ..
                }) if c == close => return Ok(items),
                Some(token) => {
                    return Err(ScriptError::parse(
                        format!("Expected ',' or '{}', found {}", close, describe(&token.kind)),
                        token.line,
                    ))
                }
                None => return Err(self.error(format!("Unclosed '{}'", close))),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Words: literals, keywords, built-ins and bare locals
    // ═══════════════════════════════════════════════════════════════════

    fn word(&mut self, word: String, line: usize) -> Result<NodeRef, ScriptError> {
        let literal = match word.as_str() {
            "null" => Some(NodeKind::Null),
            "true" => Some(NodeKind::Bool(true)),
            "false" => Some(NodeKind::Bool(false)),
            _ => None,
        };
        if let Some(kind) = literal {
            return Ok(Node::new(line, kind));
        }

        if let Some(shapes) = keyword(&word) {
            let args = self.arguments(&word, shapes)?;
            return Ok(Node::new(line, keyword_node(&word, args, line)?));
        }

        if let Some(op) = Op::builtin(&word) {
            let shapes = vec![Shape::Value; op.arity()];
            let args = self
                .arguments(&word, &shapes)?
                .into_iter()
                .map(|arg| node_arg(Some(arg), line))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Node::op(line, op, args));
        }

        Ok(Node::local(line, word))
    }

    /// Arguments for a keyword or built-in, in call form `name(a, b)` or
    /// juxtaposed form `name a b`. A parenthesized single argument followed
    /// by juxtaposed ones is also accepted: `if (x) { ... }`.
    fn arguments(&mut self, name: &str, shapes: &[Shape]) -> Result<Vec<Arg>, ScriptError> {
        let opens_group = self.peek_kind() == Some(&TokenKind::Open('('));
        if shapes.is_empty() {
            let closes = self.tokens.get(self.pos + 1).map(|t| &t.kind);
            if opens_group && closes == Some(&TokenKind::Close(')')) {
                self.pos += 2;
            }
            return Ok(Vec::new());
        }

        let mut args = Vec::with_capacity(shapes.len());
        if opens_group {
            let line = self.line();
            self.pos += 1;
            let grouped = self.comma_list(')')?;
            if grouped.len() == shapes.len() {
                return grouped
                    .into_iter()
                    .zip(shapes)
                    .map(|(node, shape)| convert(node, *shape))
                    .collect();
            }
            if grouped.len() != 1 {
                return Err(ScriptError::parse(
                    format!(
                        "'{}' takes {} arguments, got {}",
                        name,
                        shapes.len(),
                        grouped.len()
                    ),
                    line,
                ));
            }
            for node in grouped {
                args.push(convert(node, shapes[0])?);
            }
        }

        let last_value = shapes.iter().rposition(|s| *s == Shape::Value);
        for (index, shape) in shapes.iter().enumerate().skip(args.len()) {
            let arg = match shape {
                Shape::Value if Some(index) == last_value => Arg::Node(self.expression()?),
                Shape::Value => Arg::Node(self.unary()?),
                Shape::Block => Arg::Block(self.block()?),
                Shape::Param => convert(self.primary()?, Shape::Param)?,
                Shape::ParamList => convert(self.primary()?, Shape::ParamList)?,
            };
            args.push(arg);
        }
        Ok(args)
    }
}

/// Check a parsed expression against the shape an argument requires.
fn convert(node: NodeRef, shape: Shape) -> Result<Arg, ScriptError> {
    match shape {
        Shape::Value => Ok(Arg::Node(node)),
        Shape::Block => match &node.kind {
            NodeKind::Block(block) => Ok(Arg::Block(Rc::clone(block))),
            _ => Err(ScriptError::parse("Expected a block", node.line)),
        },
        Shape::Param => param_name(&node)
            .map(Arg::Param)
            .ok_or_else(|| ScriptError::parse("Invalid parameter name", node.line)),
        Shape::ParamList => {
            let NodeKind::List(items) = &node.kind else {
                return Err(ScriptError::parse("Invalid parameter list", node.line));
            };
            let mut seen = HashSet::new();
            let mut names = Vec::with_capacity(items.len());
            for item in items.iter() {
                let name = param_name(item)
                    .ok_or_else(|| ScriptError::parse("Invalid parameter name", item.line))?;
                if !seen.insert(name.clone()) {
                    return Err(ScriptError::parse("Duplicate function parameter", item.line));
                }
                names.push(name);
            }
            Ok(Arg::Params(names))
        }
    }
}

fn param_name(node: &NodeRef) -> Option<String> {
    match &node.kind {
        NodeKind::Variable {
            global: false,
            path,
        } if path.len() == 1 => path.first().cloned(),
        _ => None,
    }
}

fn keyword_node(word: &str, args: Vec<Arg>, line: usize) -> Result<NodeKind, ScriptError> {
    let mut args = args.into_iter();
    let kind = match word {
        "if" => NodeKind::If {
            cond: node_arg(args.next(), line)?,
            body: block_arg(args.next(), line)?,
        },
        "while" => NodeKind::While {
            cond: node_arg(args.next(), line)?,
            body: block_arg(args.next(), line)?,
        },
        "for" => NodeKind::For {
            target: node_arg(args.next(), line)?,
            source: node_arg(args.next(), line)?,
            body: block_arg(args.next(), line)?,
        },
        "call" => NodeKind::Call {
            callee: node_arg(args.next(), line)?,
            args: node_arg(args.next(), line)?,
        },
        "object" => NodeKind::Object(block_arg(args.next(), line)?),
        "function" => {
            let Some(Arg::Params(params)) = args.next() else {
                return Err(ScriptError::parse("Invalid parameter list", line));
            };
            NodeKind::Function {
                params: params.into(),
                body: block_arg(args.next(), line)?,
            }
        }
        "try" => {
            let body = block_arg(args.next(), line)?;
            let Some(Arg::Param(name)) = args.next() else {
                return Err(ScriptError::parse("Invalid parameter name", line));
            };
            NodeKind::Try {
                body,
                name,
                handler: block_arg(args.next(), line)?,
            }
        }
        other => return Err(ScriptError::parse(format!("Unknown keyword '{}'", other), line)),
    };
    Ok(kind)
}

fn node_arg(arg: Option<Arg>, line: usize) -> Result<NodeRef, ScriptError> {
    match arg {
        Some(Arg::Node(node)) => Ok(node),
        _ => Err(ScriptError::parse("Invalid argument", line)),
    }
}

fn block_arg(arg: Option<Arg>, line: usize) -> Result<Rc<Block>, ScriptError> {
    match arg {
        Some(Arg::Block(block)) => Ok(block),
        _ => Err(ScriptError::parse("Expected a block", line)),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Int(n) => format!("'{}'", n),
        TokenKind::Float(x) => format!("'{}'", x),
        TokenKind::Str(_) => "string literal".into(),
        TokenKind::Variable { path, .. } => format!("variable '.{}'", path.join(".")),
        TokenKind::Word(word) => format!("'{}'", word),
        TokenKind::Op(op) => format!("'{}'", op),
        TokenKind::Open(c) | TokenKind::Close(c) => format!("'{}'", c),
        TokenKind::Comma => "','".into(),
        TokenKind::Semicolon => "';'".into(),
    }
}
