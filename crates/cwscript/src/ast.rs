//! Abstract syntax tree consumed by the evaluator
//!
//! The tree is immutable once built and shared through `Rc`, so frames on
//! the execution stack can hold on to the nodes they still need to run
//! without borrowing the program.

use std::rc::Rc;

use crate::value::ValueType;

/// Shared pointer to a node.
pub type NodeRef = Rc<Node>;

/// A node plus its 0-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Source line
    pub line: usize,

    /// What the node does
    pub kind: NodeKind,
}

/// An ordered sequence of statements.
///
/// Blocks run for their side effects; every statement's result is
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Line of the opening brace (0 for the program root)
    pub line: usize,

    /// Statements in execution order
    pub statements: Vec<NodeRef>,
}

impl Block {
    /// Create a block.
    pub fn new(line: usize, statements: Vec<NodeRef>) -> Self {
        Self { line, statements }
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ═══════════════════════════════════════════════════════════════════
    // Value literals
    // ═══════════════════════════════════════════════════════════════════
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal (escapes already resolved)
    Str(String),
    /// Variable path: `.a.b` (local) or `global.a.b`
    Variable {
        /// Look up in the global scope rather than the current one
        global: bool,
        /// First element names the variable, the rest are object keys
        path: Vec<String>,
    },
    /// `[a, b, ...]`
    List(Rc<[NodeRef]>),
    /// `{ ... }` used as an expression; runs and yields null
    Block(Rc<Block>),
    /// `function(params, body)`
    Function {
        /// Parameter names
        params: Rc<[String]>,
        /// Body
        body: Rc<Block>,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════════════
    /// Fixed-arity operator or built-in, evaluated in one step once all
    /// arguments are available
    Op {
        /// Which operation
        op: Op,
        /// Argument expressions in source order
        args: Rc<[NodeRef]>,
    },
    /// `if cond {body}`; yields whether the body ran
    If {
        /// Condition
        cond: NodeRef,
        /// Body
        body: Rc<Block>,
    },
    /// `while cond {body}`; yields whether the body ran at least once
    While {
        /// Condition, re-evaluated before every iteration
        cond: NodeRef,
        /// Body
        body: Rc<Block>,
    },
    /// `for target source {body}`; yields whether the body ran at least once
    For {
        /// Loop variable (must evaluate to a variable reference)
        target: NodeRef,
        /// List to iterate
        source: NodeRef,
        /// Body
        body: Rc<Block>,
    },
    /// `call(callee, [args])` or `callee -> [args]`
    Call {
        /// Function expression
        callee: NodeRef,
        /// Argument list expression
        args: NodeRef,
    },
    /// `object {body}`; runs the body in a fresh scope and yields it
    Object(Rc<Block>),
    /// Short-circuit `&&`
    And(NodeRef, NodeRef),
    /// Short-circuit `||` (also spelled `else`)
    Or(NodeRef, NodeRef),
    /// `try {body} .name {handler}`; yields whether an exception was caught
    Try {
        /// Guarded block
        body: Rc<Block>,
        /// Variable bound to the caught exception
        name: String,
        /// Handler block
        handler: Rc<Block>,
    },
}

impl Node {
    /// Create a shared node.
    pub fn new(line: usize, kind: NodeKind) -> NodeRef {
        Rc::new(Node { line, kind })
    }

    /// Integer literal.
    pub fn int(line: usize, n: i64) -> NodeRef {
        Self::new(line, NodeKind::Int(n))
    }

    /// Local variable `.name`.
    pub fn local(line: usize, name: impl Into<String>) -> NodeRef {
        Self::new(
            line,
            NodeKind::Variable {
                global: false,
                path: vec![name.into()],
            },
        )
    }

    /// Operation node.
    pub fn op(line: usize, op: Op, args: Vec<NodeRef>) -> NodeRef {
        Self::new(
            line,
            NodeKind::Op {
                op,
                args: args.into(),
            },
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Argument requirements
// ═══════════════════════════════════════════════════════════════════════

/// What an operation requires of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Type the (possibly dereferenced) value must have
    pub want: ValueType,

    /// Resolve variable references to their current value
    pub deref: bool,
}

impl ArgSpec {
    /// Any value, dereferenced.
    pub const ANY: ArgSpec = ArgSpec::value(ValueType::Any);

    /// A variable reference left unresolved (assignment targets).
    pub const TARGET: ArgSpec = ArgSpec {
        want: ValueType::Variable,
        deref: false,
    };

    /// A dereferenced value of type `want`.
    pub const fn value(want: ValueType) -> Self {
        ArgSpec { want, deref: true }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════════════════

/// Fixed-arity operators and built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Op {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    // Comparison
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    // Indexing
    Index,
    // Assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    IntDivAssign,
    ModAssign,
    PowAssign,
    // Prefix
    Neg,
    Not,
    Inc,
    Dec,
    Invert,
    // Output and scopes
    Print,
    Local,
    Global,
    // Interrupts
    Return,
    Break,
    Continue,
    Throw,
    // Strings and containers
    Len,
    Slice,
    SliceAfter,
    Find,
    Replace,
    Upper,
    Lower,
    Merge,
    Pop,
    Push,
    Range,
    RangeStep,
    Keys,
    Values,
    // Math
    Max,
    Min,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Log,
    Sin,
    Cos,
    Tan,
    Pi,
    Random,
    RandomInt,
    // Conversion
    Str,
    Int,
    Float,
    Type,
}

const NUM: ArgSpec = ArgSpec::value(ValueType::Numeric);
const INT: ArgSpec = ArgSpec::value(ValueType::Integral);
const STR: ArgSpec = ArgSpec::value(ValueType::String);
const LIST: ArgSpec = ArgSpec::value(ValueType::List);
const OBJECT: ArgSpec = ArgSpec::value(ValueType::Object);
const CONTAINER: ArgSpec = ArgSpec::value(ValueType::Container);
const ANY: ArgSpec = ArgSpec::ANY;
const TARGET: ArgSpec = ArgSpec::TARGET;

/// Built-ins reachable by name, in lookup order.
const BUILTINS: &[(&str, Op)] = &[
    ("print", Op::Print),
    ("local", Op::Local),
    ("global", Op::Global),
    ("return", Op::Return),
    ("break", Op::Break),
    ("continue", Op::Continue),
    ("throw", Op::Throw),
    ("len", Op::Len),
    ("slice", Op::Slice),
    ("slice_after", Op::SliceAfter),
    ("find", Op::Find),
    ("replace", Op::Replace),
    ("upper", Op::Upper),
    ("lower", Op::Lower),
    ("merge", Op::Merge),
    ("pop", Op::Pop),
    ("push", Op::Push),
    ("range", Op::Range),
    ("range_step", Op::RangeStep),
    ("keys", Op::Keys),
    ("values", Op::Values),
    ("max", Op::Max),
    ("min", Op::Min),
    ("abs", Op::Abs),
    ("floor", Op::Floor),
    ("ceil", Op::Ceil),
    ("round", Op::Round),
    ("sqrt", Op::Sqrt),
    ("log", Op::Log),
    ("sin", Op::Sin),
    ("cos", Op::Cos),
    ("tan", Op::Tan),
    ("pi", Op::Pi),
    ("random", Op::Random),
    ("random_int", Op::RandomInt),
    ("str", Op::Str),
    ("int", Op::Int),
    ("float", Op::Float),
    ("type", Op::Type),
];

impl Op {
    /// Look up a built-in by its script name.
    pub fn builtin(name: &str) -> Option<Op> {
        BUILTINS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, op)| *op)
    }

    /// Operator for a binary symbol, excluding the short-circuit and
    /// call operators which have their own node kinds.
    pub fn binary(symbol: &str) -> Option<Op> {
        let op = match symbol {
            "+" => Op::Add,
            "-" => Op::Sub,
            "*" => Op::Mul,
            "/" => Op::Div,
            "//" => Op::IntDiv,
            "%" => Op::Mod,
            "**" => Op::Pow,
            ">" => Op::Gt,
            "<" => Op::Lt,
            ">=" => Op::Ge,
            "<=" => Op::Le,
            "==" => Op::Eq,
            "!=" => Op::Ne,
            ":" => Op::Index,
            "=" => Op::Assign,
            "+=" => Op::AddAssign,
            "-=" => Op::SubAssign,
            "*=" => Op::MulAssign,
            "/=" => Op::DivAssign,
            "//=" => Op::IntDivAssign,
            "%=" => Op::ModAssign,
            "**=" => Op::PowAssign,
            _ => return None,
        };
        Some(op)
    }

    /// Operator for a prefix symbol.
    pub fn prefix(symbol: &str) -> Option<Op> {
        let op = match symbol {
            "-" => Op::Neg,
            "!" => Op::Not,
            "++" => Op::Inc,
            "--" => Op::Dec,
            "!!" => Op::Invert,
            _ => return None,
        };
        Some(op)
    }

    /// Script-facing name: the symbol for operators, the word for built-ins.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add | Op::AddAssign => "+",
            Op::Sub | Op::SubAssign => "-",
            Op::Mul | Op::MulAssign => "*",
            Op::Div | Op::DivAssign => "/",
            Op::IntDiv | Op::IntDivAssign => "//",
            Op::Mod | Op::ModAssign => "%",
            Op::Pow | Op::PowAssign => "**",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Index => ":",
            Op::Assign => "=",
            Op::Neg => "-",
            Op::Not => "!",
            Op::Inc => "++",
            Op::Dec => "--",
            Op::Invert => "!!",
            other => BUILTINS
                .iter()
                .find(|(_, op)| op == other)
                .map_or("?", |(name, _)| *name),
        }
    }

    /// Requirements for each argument, in source order. The length is the
    /// operation's arity.
    pub fn args(&self) -> &'static [ArgSpec] {
        match self {
            Op::Add | Op::Eq | Op::Ne | Op::Index => &[ANY, ANY],
            Op::Sub | Op::Mul | Op::Div | Op::IntDiv | Op::Mod | Op::Pow => &[NUM, NUM],
            Op::Gt | Op::Lt | Op::Ge | Op::Le | Op::Max | Op::Min => &[NUM, NUM],
            Op::Assign | Op::AddAssign => &[TARGET, ANY],
            Op::SubAssign
            | Op::MulAssign
            | Op::DivAssign
            | Op::IntDivAssign
            | Op::ModAssign
            | Op::PowAssign => &[TARGET, NUM],
            Op::Neg => &[NUM],
            Op::Not | Op::Print | Op::Return | Op::Throw | Op::Len => &[ANY],
            Op::Inc | Op::Dec | Op::Invert => &[TARGET],
            Op::Local | Op::Global | Op::Break | Op::Continue | Op::Pi | Op::Random => &[],
            Op::Slice => &[ANY, INT, INT],
            Op::SliceAfter => &[ANY, INT],
            Op::Find => &[ANY, ANY],
            Op::Replace => &[STR, STR, STR],
            Op::Upper | Op::Lower => &[STR],
            Op::Merge => &[LIST, LIST],
            Op::Pop => &[CONTAINER, ANY],
            Op::Push => &[LIST, ANY],
            Op::Range => &[INT],
            Op::RangeStep => &[INT, INT, INT],
            Op::Keys | Op::Values => &[OBJECT],
            Op::Abs
            | Op::Floor
            | Op::Ceil
            | Op::Round
            | Op::Sqrt
            | Op::Log
            | Op::Sin
            | Op::Cos
            | Op::Tan => &[NUM],
            Op::RandomInt => &[INT, INT],
            Op::Str | Op::Int | Op::Float | Op::Type => &[ANY],
        }
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.args().len()
    }
}
