//! Foreground ordering stack.

use crate::record::LAUNCHER_TOKEN;

/// Ordered sequence of tokens representing the foreground ordering.
///
/// Entries are non-owning references into [`crate::list::AbilityList`]; the
/// top of the stack is the current foreground candidate. The launcher is
/// pushed exactly once at startup, and one application entry joins it while
/// an application runs.
#[derive(Debug, Default)]
pub struct AbilityStack {
    tokens: Vec<u16>,
}

impl AbilityStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Pushes a token on top.
    pub fn push(&mut self, token: u16) {
        self.tokens.push(token);
    }

    /// Pops and returns the top token.
    pub fn pop(&mut self) -> Option<u16> {
        self.tokens.pop()
    }

    /// Token currently on top, if any.
    #[must_use]
    pub fn top(&self) -> Option<u16> {
        self.tokens.last().copied()
    }

    /// Top-of-stack token when it belongs to an application.
    #[must_use]
    pub fn top_app(&self) -> Option<u16> {
        self.top().filter(|&t| t != LAUNCHER_TOKEN)
    }

    /// Whether a token is somewhere on the stack.
    #[must_use]
    pub fn contains(&self, token: u16) -> bool {
        self.tokens.contains(&token)
    }

    /// Number of stacked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
