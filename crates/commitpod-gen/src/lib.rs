//! Commit message generation
//!
//! [`CommitGenerator`] sends a staged diff to a [`CommitBackend`] behind a
//! fixed prompt [`Preamble`]. Diffs too large for one prompt are split with
//! [`commitpod_diff::DiffPartitioner`], each chunk is sent on its own, and the
//! replies are joined in diff order.

mod backend;
mod error;
mod generator;
mod locale;
mod openai;
mod prompt;

pub use backend::{BackendError, CommitBackend};
pub use error::GenerateError;
pub use generator::{
    CommitGenerator, RequestPlan, TokenLimits, ADJUSTMENT_FACTOR, DEFAULT_CONCURRENCY,
    RESULT_SEPARATOR,
};
pub use locale::{locale_for, resolve_locale, Locale};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use prompt::{ChatMessage, Preamble, PromptOptions, Role, MESSAGE_OVERHEAD_TOKENS};
