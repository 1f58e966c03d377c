//! Greedy packing of ordered text segments into token-limited chunks

use crate::tokens::Tokenizer;

/// A run of consecutive segments packed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedChunk<'a> {
    pub segments: Vec<&'a str>,
    pub text: String,
    pub token_count: usize,
}

impl MergedChunk<'_> {
    fn start(segment: &str, token_count: usize) -> MergedChunk<'_> {
        MergedChunk {
            segments: vec![segment],
            text: segment.to_string(),
            token_count,
        }
    }
}

/// Pack `segments` in order into chunks whose token count stays below `limit`.
///
/// A segment is appended to the current chunk only while the combined text
/// stays strictly under `limit`; otherwise the current chunk is closed and
/// the segment starts a new one. A segment that alone reaches `limit` still
/// becomes its own chunk, so nothing is dropped or reordered and the chunk
/// texts concatenate back to the input.
pub fn merge_segments<'a>(
    segments: &[&'a str],
    limit: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<MergedChunk<'a>> {
    let mut chunks = Vec::new();
    let mut current: Option<MergedChunk<'a>> = None;

    for &segment in segments {
        match current.as_mut() {
            None => current = Some(MergedChunk::start(segment, tokenizer.count(segment))),
            Some(chunk) => {
                let mut candidate = String::with_capacity(chunk.text.len() + segment.len());
                candidate.push_str(&chunk.text);
                candidate.push_str(segment);
                let candidate_tokens = tokenizer.count(&candidate);

                if candidate_tokens < limit {
                    chunk.text = candidate;
                    chunk.token_count = candidate_tokens;
                    chunk.segments.push(segment);
                } else {
                    chunks.extend(current.take());
                    current = Some(MergedChunk::start(segment, tokenizer.count(segment)));
                }
            }
        }
    }

    chunks.extend(current);
    chunks
}
