//! Token estimation and prompt budgets

use thiserror::Error;

/// Counts tokens in a piece of text.
///
/// Implementations must be deterministic: the same text always yields the
/// same count. Counts are only compared against a [`Budget`], so they may be
/// approximate.
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Character-based approximation, `ceil(chars / chars_per_token)`
#[derive(Debug, Clone, Copy)]
pub struct ApproxTokenizer {
    chars_per_token: usize,
}

impl ApproxTokenizer {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for ApproxTokenizer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Tokenizer for ApproxTokenizer {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    #[error("token limit {limit} leaves no room after reserving {reserved} tokens for the prompt preamble and reply")]
    Exhausted { limit: usize, reserved: usize },
}

/// Maximum number of tokens one prompt's diff text may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget(usize);

impl Budget {
    /// Budget left from `limit` after setting aside `reserved` tokens.
    pub fn new(limit: usize, reserved: usize) -> Result<Self, BudgetError> {
        match limit.checked_sub(reserved) {
            Some(remaining) if remaining > 0 => Ok(Self(remaining)),
            _ => Err(BudgetError::Exhausted { limit, reserved }),
        }
    }

    pub fn tokens(self) -> usize {
        self.0
    }

    /// Whether `text` fits. The comparison is strict: a text of exactly
    /// `tokens()` tokens does not fit.
    pub fn fits(self, text: &str, tokenizer: &dyn Tokenizer) -> bool {
        tokenizer.count(text) < self.0
    }
}
