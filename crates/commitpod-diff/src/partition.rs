//! Splitting a diff into budget-sized chunks

use crate::merge::merge_segments;
use crate::tokens::{Budget, Tokenizer};
use crate::types::{DiffChunk, Granularity, FILE_MARKER};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static DIFF_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^diff --git a/(.*?) b/(.*?)$").expect("diff header pattern is valid")
});

/// Split `text` before every line that starts with `marker`.
///
/// Returns the text ahead of the first marker and the segments, each of
/// which keeps its leading marker. Head and segments concatenate back to
/// `text`. Without any marker the whole text is the head.
pub fn split_on_marker<'a>(text: &'a str, marker: &str) -> (&'a str, Vec<&'a str>) {
    let starts: Vec<usize> = text
        .match_indices(marker)
        .map(|(index, _)| index)
        .filter(|&index| index == 0 || text.as_bytes()[index - 1] == b'\n')
        .collect();

    let Some(&first) = starts.first() else {
        return (text, Vec::new());
    };

    let segments = starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect();

    (&text[..first], segments)
}

/// Splits diffs into chunks that fit a [`Budget`]
pub struct DiffPartitioner<'t> {
    budget: Budget,
    tokenizer: &'t dyn Tokenizer,
}

impl<'t> DiffPartitioner<'t> {
    pub fn new(budget: Budget, tokenizer: &'t dyn Tokenizer) -> Self {
        Self { budget, tokenizer }
    }

    /// Partition `diff` into ordered chunks.
    ///
    /// Files are packed together while they fit. A file that does not fit on
    /// its own is split into hunk groups, each repeating the file header.
    /// Anything ahead of the first file (e.g. commit metadata) is repeated on
    /// every chunk. A single hunk over budget is emitted as is and flagged
    /// [`DiffChunk::oversized`].
    pub fn partition(&self, diff: &str) -> Vec<DiffChunk> {
        let mut chunks = Vec::new();
        self.split_level("", diff, Granularity::File, &mut chunks);

        info!(
            chunks = chunks.len(),
            oversized = chunks.iter().filter(|c| c.oversized).count(),
            budget = self.budget.tokens(),
            "partitioned diff"
        );
        chunks
    }

    fn split_level(&self, prefix: &str, text: &str, level: Granularity, out: &mut Vec<DiffChunk>) {
        let (head, segments) = split_on_marker(text, level.marker());
        let shared = format!("{}{}", prefix, head);

        if segments.is_empty() {
            if shared.is_empty() {
                return;
            }
            match level.finer() {
                Some(finer) if !self.budget.fits(&shared, self.tokenizer) => {
                    self.split_level(prefix, text, finer, out)
                }
                _ => out.push(self.make_chunk(shared, level)),
            }
            return;
        }

        let limit = self
            .budget
            .tokens()
            .saturating_sub(self.tokenizer.count(&shared))
            .max(1);

        for merged in merge_segments(&segments, limit, self.tokenizer) {
            let text = format!("{}{}", shared, merged.text);
            if self.budget.fits(&text, self.tokenizer) {
                out.push(self.make_chunk(text, level));
                continue;
            }

            for segment in merged.segments {
                let single = format!("{}{}", shared, segment);
                if self.budget.fits(&single, self.tokenizer) {
                    out.push(self.make_chunk(single, level));
                    continue;
                }
                match level.finer() {
                    Some(finer) => {
                        debug!(
                            from = level.as_str(),
                            to = finer.as_str(),
                            "segment over budget, splitting further"
                        );
                        self.split_level(&shared, segment, finer, out);
                    }
                    None => out.push(self.make_chunk(single, level)),
                }
            }
        }
    }

    fn make_chunk(&self, text: String, granularity: Granularity) -> DiffChunk {
        let token_count = self.tokenizer.count(&text);
        let oversized = token_count >= self.budget.tokens();
        let path = single_file_path(&text);

        if oversized {
            warn!(
                tokens = token_count,
                budget = self.budget.tokens(),
                path = path.as_deref().unwrap_or("unknown"),
                "chunk cannot be split further and exceeds the budget"
            );
        } else {
            debug!(
                tokens = token_count,
                granularity = granularity.as_str(),
                path = path.as_deref().unwrap_or("-"),
                "chunk ready"
            );
        }

        DiffChunk {
            text,
            token_count,
            granularity,
            oversized,
            path,
        }
    }
}

fn single_file_path(text: &str) -> Option<String> {
    let (_, files) = split_on_marker(text, FILE_MARKER);
    if files.len() != 1 {
        return None;
    }
    let captures = DIFF_HEADER_RE.captures(files[0])?;
    captures
        .get(2)
        .or_else(|| captures.get(1))
        .map(|m| m.as_str().to_string())
}
