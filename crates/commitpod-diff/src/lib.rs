//! Token-budgeted git diff chunking
//!
//! Splits a unified diff into chunks that each fit a prompt token budget.
//! Files are packed greedily first; a file that is still too large on its
//! own is split again at hunk boundaries, with its header repeated on every
//! piece so each chunk still reads as a diff.

mod filter;
mod merge;
mod partition;
mod tokens;
mod types;

pub use filter::PathFilter;
pub use merge::{merge_segments, MergedChunk};
pub use partition::{split_on_marker, DiffPartitioner};
pub use tokens::{ApproxTokenizer, Budget, BudgetError, Tokenizer};
pub use types::{DiffChunk, Granularity, FILE_MARKER, HUNK_MARKER};
