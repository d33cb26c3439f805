//! Evaluation context configuration

/// Default maximum number of nested function/object scopes.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Configuration for a program run.
///
/// Controls the recursion limit, per-step tracing and the seed used by
/// the `random` built-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    /// Maximum number of scopes above the global scope
    pub max_call_depth: usize,

    /// Whether to emit a trace event for every micro-step
    pub trace: bool,

    /// Seed for `random` / `random_int`; entropy when `None`
    pub random_seed: Option<u64>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace: false,
            random_seed: None,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Enable or disable per-step tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Make the random built-ins deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}
