//! Type definitions for diff chunking

/// Marks the start of each file in a git diff
pub const FILE_MARKER: &str = "diff --git ";

/// Marks the start of each hunk within a file diff
pub const HUNK_MARKER: &str = "@@ ";

/// Level at which a diff is split into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    File,
    Hunk,
}

impl Granularity {
    /// The next finer level, if any. Hunks are the finest level.
    pub fn finer(self) -> Option<Granularity> {
        match self {
            Granularity::File => Some(Granularity::Hunk),
            Granularity::Hunk => None,
        }
    }

    /// Line prefix that starts a segment at this level
    pub fn marker(self) -> &'static str {
        match self {
            Granularity::File => FILE_MARKER,
            Granularity::Hunk => HUNK_MARKER,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Granularity::File => "file",
            Granularity::Hunk => "hunk",
        }
    }
}

/// A ready-to-send piece of a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk {
    pub text: String,
    pub token_count: usize,
    pub granularity: Granularity,
    /// Set when the chunk could not be brought under budget
    pub oversized: bool,
    /// File path from the `diff --git` header, when the chunk covers a single file
    pub path: Option<String>,
}
