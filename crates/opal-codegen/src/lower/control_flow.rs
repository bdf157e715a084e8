//! Control flow lowering utilities
//!
//! Loop-context bookkeeping for break/continue during lowering.

/// Context for managing loop control flow
#[derive(Debug, Clone)]
pub struct LoopContext {
    /// Label to jump to for `break`
    pub break_label: String,
    /// Label to jump to for `continue`
    pub continue_label: String,
}

impl LoopContext {
    /// Create a new loop context
    pub fn new(break_label: String, continue_label: String) -> Self {
        Self {
            break_label,
            continue_label,
        }
    }
}

/// Stack of active loop contexts for nested loops. `break`/`continue` always
/// target the innermost context; pushing and popping around each loop body
/// restores the enclosing loop's targets afterwards.
#[derive(Debug, Default)]
pub struct LoopStack {
    stack: Vec<LoopContext>,
}

impl LoopStack {
    /// Create a new empty loop stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new loop context
    pub fn push(&mut self, ctx: LoopContext) {
        self.stack.push(ctx);
    }

    /// Pop the current loop context
    pub fn pop(&mut self) -> Option<LoopContext> {
        self.stack.pop()
    }

    /// Get the current (innermost) loop context
    pub fn current(&self) -> Option<&LoopContext> {
        self.stack.last()
    }

    /// Check if we're inside any loop
    pub fn is_in_loop(&self) -> bool {
        !self.stack.is_empty()
    }
}
