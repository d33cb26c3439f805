//! Program driver: owns the machine and converts failures for the host

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use crate::ast::Block;
use crate::error::ScriptError;
use crate::eval::Machine;
use crate::frontend;
use crate::value::ObjectRef;
use crate::{EvalContext, Value};

/// A loaded program, advanced one micro-step at a time.
///
/// Any error halts the program permanently: later calls to
/// [`Program::advance`] return `Ok(false)` without touching the stack.
///
/// # Example
///
/// ```
/// use cwscript::{EvalContext, OutputBuffer, Program};
///
/// let out = OutputBuffer::new();
/// let mut program = Program::from_source_with(
///     "print 1 + 2 * 3;",
///     EvalContext::default(),
///     Box::new(out.clone()),
/// )
/// .unwrap();
///
/// program.run().unwrap();
/// assert_eq!(out.contents(), "7\n");
/// ```
pub struct Program {
    machine: Machine,
    source: Option<String>,
    error: Option<ScriptError>,
}

impl Program {
    /// Load an already-parsed program with default settings, printing to
    /// standard output.
    pub fn new(root: Block) -> Self {
        Self::with_context(root, EvalContext::default())
    }

    /// Load an already-parsed program, printing to standard output.
    pub fn with_context(root: Block, ctx: EvalContext) -> Self {
        Self::with_output(root, ctx, Box::new(io::stdout()))
    }

    /// Load an already-parsed program with an explicit output sink.
    pub fn with_output(root: Block, ctx: EvalContext, out: Box<dyn Write>) -> Self {
        Self {
            machine: Machine::new(Rc::new(root), &ctx, out),
            source: None,
            error: None,
        }
    }

    /// Lex and parse `source` with default settings.
    pub fn from_source(source: &str) -> Result<Self, ScriptError> {
        Self::from_source_with(source, EvalContext::default(), Box::new(io::stdout()))
    }

    /// Lex and parse `source`. Errors, including later runtime errors,
    /// carry the text of the offending line.
    pub fn from_source_with(
        source: &str,
        ctx: EvalContext,
        out: Box<dyn Write>,
    ) -> Result<Self, ScriptError> {
        let root = frontend::parse(source).map_err(|err| err.with_source(source))?;
        let mut program = Self::with_output(root, ctx, out);
        program.source = Some(source.to_string());
        Ok(program)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════

    /// Perform one micro-step. Returns whether more work remains.
    pub fn advance(&mut self) -> Result<bool, ScriptError> {
        if self.error.is_some() {
            return Ok(false);
        }
        match self.machine.step() {
            Ok(more) => Ok(more),
            Err(err) => {
                let mut report = ScriptError::from_eval(&err, self.machine.current_line());
                if let Some(source) = &self.source {
                    report = report.with_source(source);
                }
                debug!(error = %report, "program halted");
                self.error = Some(report.clone());
                Err(report)
            }
        }
    }

    /// Run to completion.
    pub fn run(&mut self) -> Result<(), ScriptError> {
        while self.advance()? {}
        Ok(())
    }

    /// Run at most `budget` micro-steps. Returns whether work remains.
    pub fn run_steps(&mut self, budget: usize) -> Result<bool, ScriptError> {
        for _ in 0..budget {
            if !self.advance()? {
                return Ok(false);
            }
        }
        Ok(self.error.is_none() && self.machine.has_work())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Line of the most recently started node, or of the last one run if
    /// the program has finished.
    pub fn current_line(&self) -> usize {
        self.machine.current_line()
    }

    /// Whether the program stopped on an error.
    pub fn is_halted(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the program ran to completion.
    pub fn is_finished(&self) -> bool {
        self.error.is_none() && !self.machine.has_work()
    }

    /// The error that halted the program.
    pub fn error(&self) -> Option<&ScriptError> {
        self.error.as_ref()
    }

    /// Final value once finished.
    pub fn result(&self) -> Option<&Value> {
        if self.is_finished() {
            self.machine.result()
        } else {
            None
        }
    }

    /// The global scope, for inspecting variables.
    pub fn global_scope(&self) -> &ObjectRef {
        self.machine.global_scope()
    }

    /// Read a global variable.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.global_scope().get(name).ok()
    }

    /// Number of frames on the execution stack.
    pub fn stack_depth(&self) -> usize {
        self.machine.depth()
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("machine", &self.machine)
            .field("error", &self.error)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Output capture
// ═══════════════════════════════════════════════════════════════════════

/// Shared in-memory output sink.
///
/// Clones share the same buffer, so a host can hand one clone to a
/// [`Program`] and read the output back through another.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
