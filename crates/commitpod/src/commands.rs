use crate::cli::Cli;
use crate::git::GitHelper;
use anyhow::{bail, Context, Result};
use commitpod_core::{Config, DiffConfig};
use commitpod_diff::{ApproxTokenizer, PathFilter, Tokenizer};
use commitpod_gen::{
    CommitGenerator, OpenAiBackend, OpenAiConfig, Preamble, PromptOptions, RequestPlan,
    TokenLimits,
};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let generate = config.generate();
    let api = config.api();

    let diff = if cli.stdin {
        read_stdin().await?
    } else {
        staged_diff(&config.diff())?
    };
    if diff.trim().is_empty() {
        bail!("No staged changes to describe. Stage files with `git add` first.");
    }

    let preamble = Preamble::build(&PromptOptions {
        language: generate.language.clone(),
        emoji: generate.emoji,
        description: generate.description,
    });
    let tokenizer = ApproxTokenizer::new(generate.chars_per_token);
    let limits = TokenLimits {
        max_tokens_input: generate.max_tokens_input,
        max_tokens_output: generate.max_tokens_output,
    };

    if cli.dry_run {
        let budget = limits.budget(preamble.token_cost(&tokenizer))?;
        let plan = RequestPlan::for_diff(&diff, budget, &tokenizer);
        print!("{}", format_plan(budget.tokens(), &plan));
        return Ok(());
    }

    let api_key = api.resolve_api_key().with_context(|| {
        format!(
            "No API key found. Pass --api-key or set {}",
            api.api_key_env
        )
    })?;
    let backend = OpenAiBackend::new(
        OpenAiConfig::new(api_key)
            .with_base_url(&api.base_url)
            .with_model(&api.model)
            .with_max_tokens(generate.max_tokens_output)
            .with_timeout(Duration::from_secs(api.timeout_secs)),
    )?;
    info!(model = backend.model(), "using OpenAI-compatible backend");

    let tokenizer: Arc<dyn Tokenizer> = Arc::new(tokenizer);
    let generator = CommitGenerator::new(Arc::new(backend), Arc::new(preamble), tokenizer, limits)?
        .with_concurrency(generate.concurrency);

    let message = generator.generate(&diff).await?;
    println!("{}", message.trim());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    Ok(cli.apply(config))
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read diff from stdin")?;
    Ok(input)
}

fn staged_diff(diff_config: &DiffConfig) -> Result<String> {
    let filter = if diff_config.include_lock_files {
        PathFilter::custom(&diff_config.exclude)
    } else {
        PathFilter::new(&diff_config.exclude)
    }
    .context("Invalid exclude pattern in [diff] config")?;

    let staged = GitHelper::staged_files()?;
    let total = staged.len();
    let files = filter.retain_included(staged);
    debug!(staged = total, included = files.len(), "filtered staged files");

    GitHelper::staged_diff(&files)
}

fn format_plan(budget: usize, plan: &RequestPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Budget: {} tokens per request", budget);

    match plan {
        RequestPlan::Single { token_count } => {
            let _ = writeln!(out, "Single request: {} tokens", token_count);
        }
        RequestPlan::Partitioned(chunks) => {
            let _ = writeln!(out, "Split into {} requests:", chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                let _ = write!(
                    out,
                    "  {:>3}. {:<4} {:>6} tokens",
                    i + 1,
                    chunk.granularity.as_str(),
                    chunk.token_count
                );
                if let Some(path) = &chunk.path {
                    let _ = write!(out, "  {}", path);
                }
                if chunk.oversized {
                    out.push_str("  (over budget)");
                }
                out.push('\n');
            }
        }
    }

    out
}
