//! The fixed instruction and few-shot messages sent with every request

use crate::locale::resolve_locale;
use commitpod_diff::Tokenizer;
use serde::{Deserialize, Serialize};

/// Per-message framing cost charged on top of the content tokens
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Locale code, see [`crate::locale_for`]
    pub language: String,
    /// Prefix the subject with a GitMoji
    pub emoji: bool,
    /// Follow the subject with a short explanatory paragraph
    pub description: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            emoji: false,
            description: false,
        }
    }
}

const EXAMPLE_DIFF: &str = r#"diff --git a/src/server.rs b/src/server.rs
index ad4db42..f3b18a9 100644
--- a/src/server.rs
+++ b/src/server.rs
@@ -12,8 +12,13 @@ use crate::app::build_app;
 pub async fn run() -> anyhow::Result<()> {
     let app = build_app();
-    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
+    let port = std::env::var("PORT")
+        .ok()
+        .and_then(|p| p.parse().ok())
+        .unwrap_or(8080);
+    let addr = SocketAddr::from(([127, 0, 0, 1], port));
+    tracing::info!(%addr, "listening");
     axum::serve(TcpListener::bind(addr).await?, app).await?;
     Ok(())
 }
"#;

const EMOJI_RULE: &str = "Start the subject with a GitMoji: 🐛 for a bug fix, ✨ for a new feature, \
📝 for documentation, ♻️ for a refactor, ✅ for tests, 🔧 for configuration, ⚡️ for performance.";

const NO_EMOJI_RULE: &str = "Do not use emoji.";

const DESCRIPTION_RULE: &str =
    "After the subject, add a blank line and a short paragraph explaining why the change was made.";

const NO_DESCRIPTION_RULE: &str = "Write subject lines only, without a body.";

/// System, example-user and example-assistant messages, built once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    messages: Vec<ChatMessage>,
}

impl Preamble {
    pub fn build(options: &PromptOptions) -> Self {
        let locale = resolve_locale(&options.language);

        let system = format!(
            "You write git commit messages. You will receive the output of `git diff --staged`, \
possibly only one part of it, and reply with the commit message for those changes.\n\
Follow the Conventional Commits format: `<type>(<optional scope>): <subject>`.\n\
{}\n{}\n\
Use the present tense and keep lines under 74 characters.\n\
Write the message in {}.\n\
Reply with the commit message only.",
            if options.emoji { EMOJI_RULE } else { NO_EMOJI_RULE },
            if options.description {
                DESCRIPTION_RULE
            } else {
                NO_DESCRIPTION_RULE
            },
            locale.name,
        );

        let (fix, feat) = if options.emoji {
            (
                format!("🐛 {}", locale.commit_fix),
                format!("✨ {}", locale.commit_feat),
            )
        } else {
            (locale.commit_fix.to_string(), locale.commit_feat.to_string())
        };
        let mut example_reply = format!("{}\n{}", fix, feat);
        if options.description {
            example_reply.push_str("\n\n");
            example_reply.push_str(locale.commit_description);
        }

        Self {
            messages: vec![
                ChatMessage::system(system),
                ChatMessage::user(EXAMPLE_DIFF),
                ChatMessage::assistant(example_reply),
            ],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The preamble followed by one user message holding `diff`
    pub fn prompt_for(&self, diff: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend_from_slice(&self.messages);
        messages.push(ChatMessage::user(diff));
        messages
    }

    /// Tokens the preamble adds to every request
    pub fn token_cost(&self, tokenizer: &dyn Tokenizer) -> usize {
        self.messages
            .iter()
            .map(|m| tokenizer.count(&m.content) + MESSAGE_OVERHEAD_TOKENS)
            .sum()
    }
}
