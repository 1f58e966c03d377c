//! Top-level request flow: one prompt when the diff fits, fan-out otherwise

use crate::backend::{BackendError, CommitBackend};
use crate::error::GenerateError;
use crate::prompt::Preamble;
use commitpod_diff::{Budget, BudgetError, DiffChunk, DiffPartitioner, Tokenizer};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Safety margin subtracted from the input limit
pub const ADJUSTMENT_FACTOR: usize = 20;

/// Placed between the replies for the chunks of a split diff
pub const RESULT_SEPARATOR: &str = "\n\n";

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Model token limits a budget is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLimits {
    pub max_tokens_input: usize,
    pub max_tokens_output: usize,
}

impl TokenLimits {
    /// Tokens left for diff text once the reply, the margin and the
    /// preamble are accounted for.
    pub fn budget(&self, preamble_cost: usize) -> Result<Budget, BudgetError> {
        Budget::new(
            self.max_tokens_input,
            self.max_tokens_output + ADJUSTMENT_FACTOR + preamble_cost,
        )
    }
}

/// How a diff will be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    /// The whole diff goes in one prompt
    Single { token_count: usize },
    /// One prompt per chunk, in diff order
    Partitioned(Vec<DiffChunk>),
}

impl RequestPlan {
    /// One request when `diff` is under `budget`, otherwise its partition
    pub fn for_diff(diff: &str, budget: Budget, tokenizer: &dyn Tokenizer) -> Self {
        let token_count = tokenizer.count(diff);
        if token_count < budget.tokens() {
            return RequestPlan::Single { token_count };
        }

        RequestPlan::Partitioned(DiffPartitioner::new(budget, tokenizer).partition(diff))
    }

    pub fn request_count(&self) -> usize {
        match self {
            RequestPlan::Single { .. } => 1,
            RequestPlan::Partitioned(chunks) => chunks.len(),
        }
    }
}

pub struct CommitGenerator {
    backend: Arc<dyn CommitBackend>,
    preamble: Arc<Preamble>,
    tokenizer: Arc<dyn Tokenizer>,
    budget: Budget,
    concurrency: usize,
}

impl CommitGenerator {
    /// Fails with [`GenerateError::Budget`] when the preamble and reply
    /// reserve leave no room for a diff.
    pub fn new(
        backend: Arc<dyn CommitBackend>,
        preamble: Arc<Preamble>,
        tokenizer: Arc<dyn Tokenizer>,
        limits: TokenLimits,
    ) -> Result<Self, GenerateError> {
        let preamble_cost = preamble.token_cost(tokenizer.as_ref());
        let budget = limits.budget(preamble_cost)?;
        debug!(
            preamble_cost,
            budget = budget.tokens(),
            max_tokens_input = limits.max_tokens_input,
            "computed diff budget"
        );

        Ok(Self {
            backend,
            preamble,
            tokenizer,
            budget,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Cap on backend calls in flight for a split diff (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Decide how `diff` would be sent, without calling the backend.
    pub fn plan(&self, diff: &str) -> RequestPlan {
        RequestPlan::for_diff(diff, self.budget, self.tokenizer.as_ref())
    }

    /// Generate a commit message for `diff`.
    ///
    /// A diff that fits the budget is sent once and the reply returned as is;
    /// an empty string reply is [`GenerateError::EmptyResult`]. A larger diff is
    /// split and the chunk replies are joined with [`RESULT_SEPARATOR`] in
    /// diff order. The first backend failure aborts the whole request and
    /// drops any calls still in flight.
    pub async fn generate(&self, diff: &str) -> Result<String, GenerateError> {
        match self.plan(diff) {
            RequestPlan::Single { token_count } => {
                info!(
                    tokens = token_count,
                    budget = self.budget.tokens(),
                    "diff fits in one request"
                );
                let message = self.request(diff).await?;
                if message.is_empty() {
                    return Err(GenerateError::EmptyResult);
                }
                Ok(message)
            }
            RequestPlan::Partitioned(chunks) => {
                info!(
                    chunks = chunks.len(),
                    concurrency = self.concurrency,
                    "diff split across requests"
                );
                self.generate_chunks(&chunks).await
            }
        }
    }

    async fn generate_chunks(&self, chunks: &[DiffChunk]) -> Result<String, GenerateError> {
        let mut replies: Vec<(usize, String)> = stream::iter(chunks.iter().enumerate())
            .map(|(index, chunk)| async move {
                debug!(
                    index,
                    tokens = chunk.token_count,
                    path = chunk.path.as_deref().unwrap_or("-"),
                    "requesting chunk"
                );
                self.request(&chunk.text)
                    .await
                    .map(|reply| (index, reply))
                    .inspect_err(|e| warn!(index, error = %e, "chunk request failed"))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        replies.sort_by_key(|(index, _)| *index);
        Ok(replies
            .into_iter()
            .map(|(_, reply)| reply)
            .collect::<Vec<_>>()
            .join(RESULT_SEPARATOR))
    }

    async fn request(&self, text: &str) -> Result<String, BackendError> {
        let messages = self.preamble.prompt_for(text);
        self.backend.generate_commit_message(&messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{ChatMessage, PromptOptions, Role};
    use async_trait::async_trait;
    use commitpod_diff::ApproxTokenizer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies with a fixed text and records every diff it receives
    struct FixedBackend {
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    impl FixedBackend {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommitBackend for FixedBackend {
        async fn generate_commit_message(
            &self,
            messages: &[ChatMessage],
        ) -> Result<String, BackendError> {
            let last = messages.last().expect("prompt has a user message");
            assert_eq!(last.role, Role::User);
            assert_eq!(messages.len(), 4);
            self.seen.lock().unwrap().push(last.content.clone());
            Ok(self.reply.clone())
        }
    }

    /// Replies with the chunk's file name; earlier files answer later.
    /// Fails for any chunk mentioning `fail_on`.
    struct FileNameBackend {
        fail_on: Option<&'static str>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        completed: AtomicUsize,
    }

    impl FileNameBackend {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CommitBackend for FileNameBackend {
        async fn generate_commit_message(
            &self,
            messages: &[ChatMessage],
        ) -> Result<String, BackendError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let diff = &messages[messages.len() - 1].content;
            let name = diff
                .lines()
                .next()
                .and_then(|line| line.rsplit("b/").next())
                .unwrap_or("?")
                .to_string();
            let rank = name
                .trim_start_matches('f')
                .trim_end_matches(".rs")
                .parse::<u64>()
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - rank * 10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.fail_on {
                Some(bad) if diff.contains(bad) => Err(BackendError::Other("boom".to_string())),
                _ => {
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("update {}", name))
                }
            }
        }
    }

    /// Never answers for `hang_on`, fails for `fail_on`, replies otherwise
    struct StuckBackend {
        hang_on: &'static str,
        fail_on: &'static str,
    }

    #[async_trait]
    impl CommitBackend for StuckBackend {
        async fn generate_commit_message(
            &self,
            messages: &[ChatMessage],
        ) -> Result<String, BackendError> {
            let diff = &messages[messages.len() - 1].content;
            if diff.contains(self.hang_on) {
                std::future::pending::<()>().await;
            }
            if diff.contains(self.fail_on) {
                return Err(BackendError::Other("boom".to_string()));
            }
            Ok("OK".to_string())
        }
    }

    fn file_diff(name: &str, lines: usize) -> String {
        let mut diff = format!(
            "diff --git a/{0} b/{0}\nindex 1111111..2222222 100644\n--- a/{0}\n+++ b/{0}\n@@ -1,{1} +1,{1} @@\n",
            name, lines
        );
        for line in 0..lines {
            diff.push_str(&format!("+line {}\n", line));
        }
        diff
    }

    /// Generator whose diff budget is exactly `budget` tokens of one char each
    fn generator(backend: Arc<dyn CommitBackend>, budget: usize) -> CommitGenerator {
        let preamble = Arc::new(Preamble::build(&PromptOptions::default()));
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(ApproxTokenizer::new(1));
        let cost = preamble.token_cost(tokenizer.as_ref());
        let limits = TokenLimits {
            max_tokens_input: budget + cost + ADJUSTMENT_FACTOR + 100,
            max_tokens_output: 100,
        };

        let generator = CommitGenerator::new(backend, preamble, tokenizer, limits).unwrap();
        assert_eq!(generator.budget().tokens(), budget);
        generator
    }

    #[tokio::test]
    async fn test_empty_diff_is_one_call() {
        let backend = FixedBackend::new("OK");
        let generator = generator(backend.clone(), 1_000);

        let message = generator.generate("").await.unwrap();

        assert_eq!(message, "OK");
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.seen.lock().unwrap()[0], "");
    }

    #[tokio::test]
    async fn test_reply_is_returned_verbatim() {
        let backend = FixedBackend::new("  feat: keep spacing\n");
        let generator = generator(backend, 1_000);

        let message = generator.generate(&file_diff("a.rs", 2)).await.unwrap();
        assert_eq!(message, "  feat: keep spacing\n");
    }

    #[tokio::test]
    async fn test_diff_one_below_budget_is_not_split() {
        let diff = format!("{}{}", file_diff("a.rs", 3), file_diff("b.rs", 3));
        let backend = FixedBackend::new("OK");
        let generator = generator(backend.clone(), diff.len() + 1);

        assert_eq!(generator.generate(&diff).await.unwrap(), "OK");
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.seen.lock().unwrap()[0], diff);
    }

    #[tokio::test]
    async fn test_diff_at_budget_is_split_by_file() {
        let a = file_diff("a.rs", 3);
        let b = file_diff("b.rs", 3);
        let diff = format!("{}{}", a, b);
        let backend = FixedBackend::new("OK");
        let generator = generator(backend.clone(), diff.len());

        assert_eq!(generator.plan(&diff).request_count(), 2);
        assert_eq!(generator.generate(&diff).await.unwrap(), "OK\n\nOK");

        let mut seen = backend.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![a, b]);
    }

    #[tokio::test]
    async fn test_n_chunks_join_n_replies() {
        let files: Vec<String> = (0..5).map(|i| file_diff(&format!("f{}.rs", i), 4)).collect();
        let diff = files.concat();
        let backend = FixedBackend::new("OK");
        let generator = generator(backend.clone(), files[0].len() + 2);

        let message = generator.generate(&diff).await.unwrap();

        assert_eq!(message, vec!["OK"; 5].join("\n\n"));
        assert_eq!(backend.calls(), 5);
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let generator = generator(FixedBackend::new(""), 1_000);

        let result = generator.generate(&file_diff("a.rs", 1)).await;
        assert!(matches!(result, Err(GenerateError::EmptyResult)));
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_returned_as_is() {
        let generator = generator(FixedBackend::new("  \n"), 1_000);

        let message = generator.generate(&file_diff("a.rs", 1)).await.unwrap();
        assert_eq!(message, "  \n");
    }

    #[tokio::test]
    async fn test_replies_follow_diff_order() {
        let files: Vec<String> = (0..4).map(|i| file_diff(&format!("f{}.rs", i), 4)).collect();
        let generator =
            generator(FileNameBackend::new(None), files[0].len() + 2).with_concurrency(4);

        let message = generator.generate(&files.concat()).await.unwrap();

        assert_eq!(
            message,
            "update f0.rs\n\nupdate f1.rs\n\nupdate f2.rs\n\nupdate f3.rs"
        );
    }

    #[tokio::test]
    async fn test_one_failed_chunk_fails_the_request() {
        let files: Vec<String> = (0..4).map(|i| file_diff(&format!("f{}.rs", i), 4)).collect();
        // f0.rs answers last, so every other chunk has already succeeded
        let backend = FileNameBackend::new(Some("f0.rs"));
        let generator = generator(backend.clone(), files[0].len() + 2).with_concurrency(4);

        let result = generator.generate(&files.concat()).await;

        match result {
            Err(GenerateError::Backend(BackendError::Other(message))) => {
                assert_eq!(message, "boom")
            }
            other => panic!("expected backend error, got {:?}", other),
        }
        assert_eq!(backend.completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_wait_for_stuck_chunk() {
        let files: Vec<String> = (0..3).map(|i| file_diff(&format!("f{}.rs", i), 4)).collect();
        let backend = Arc::new(StuckBackend {
            hang_on: "f0.rs",
            fail_on: "f1.rs",
        });
        let generator = generator(backend, files[0].len() + 2).with_concurrency(3);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            generator.generate(&files.concat()),
        )
        .await
        .expect("generate should return without the stuck chunk");

        assert!(matches!(result, Err(GenerateError::Backend(_))));
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let files: Vec<String> = (0..5).map(|i| file_diff(&format!("f{}.rs", i), 4)).collect();
        let backend = FileNameBackend::new(None);
        let generator = generator(backend.clone(), files[0].len() + 2).with_concurrency(2);

        generator.generate(&files.concat()).await.unwrap();

        assert!(backend.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_budget_exhausted_by_preamble() {
        let preamble = Arc::new(Preamble::build(&PromptOptions::default()));
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(ApproxTokenizer::default());
        let limits = TokenLimits {
            max_tokens_input: 200,
            max_tokens_output: 100,
        };

        let result = CommitGenerator::new(FixedBackend::new("OK"), preamble, tokenizer, limits);
        assert!(matches!(
            result,
            Err(GenerateError::Budget(BudgetError::Exhausted { limit: 200, .. }))
        ));
    }

    #[test]
    fn test_token_limits_budget() {
        let limits = TokenLimits {
            max_tokens_input: 4096,
            max_tokens_output: 500,
        };
        assert_eq!(limits.budget(576).unwrap().tokens(), 3000);
    }
}
