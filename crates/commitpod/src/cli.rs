use clap::Parser;
use commitpod_core::Config;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "commitpod",
    version,
    about = "Generate a commit message for the staged changes"
)]
pub struct Cli {
    /// Specify configuration file path
    #[arg(long, env = "COMMITPOD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read the diff from stdin instead of `git diff --staged`
    #[arg(long)]
    pub stdin: bool,

    /// Language of the commit message (en, de, es, fr, ja, zh_CN, pt_br, ru)
    #[arg(short, long, env = "COMMITPOD_LANGUAGE")]
    pub language: Option<String>,

    /// Prefix the message with a GitMoji
    #[arg(long, overrides_with = "no_emoji")]
    pub emoji: bool,

    /// Don't use GitMoji, even if the config enables it
    #[arg(long, overrides_with = "emoji")]
    pub no_emoji: bool,

    /// Add a short description paragraph after the subject
    #[arg(long, overrides_with = "no_description")]
    pub description: bool,

    /// Subject line only, even if the config enables descriptions
    #[arg(long, overrides_with = "description")]
    pub no_description: bool,

    /// Model name
    #[arg(short, long, env = "COMMITPOD_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "COMMITPOD_BASE_URL")]
    pub base_url: Option<String>,

    /// API key (defaults to the variable named by `api.api_key_env`)
    #[arg(long, env = "COMMITPOD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Context size of the model, in tokens
    #[arg(long, env = "COMMITPOD_MAX_TOKENS_INPUT")]
    pub max_tokens_input: Option<usize>,

    /// Tokens reserved for each reply
    #[arg(long, env = "COMMITPOD_MAX_TOKENS_OUTPUT")]
    pub max_tokens_output: Option<usize>,

    /// Maximum API calls in flight for a split diff
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print how the diff would be split and exit without calling the API
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(long, env = "COMMITPOD_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Don't write log files under the config home
    #[arg(long)]
    pub no_log_file: bool,
}

impl Cli {
    /// Overlay command line values on a loaded configuration
    pub fn apply(&self, mut config: Config) -> Config {
        let mut generate = config.generate();
        if let Some(language) = &self.language {
            generate.language = language.clone();
        }
        if let Some(emoji) = toggle(self.emoji, self.no_emoji) {
            generate.emoji = emoji;
        }
        if let Some(description) = toggle(self.description, self.no_description) {
            generate.description = description;
        }
        if let Some(max) = self.max_tokens_input {
            generate.max_tokens_input = max;
        }
        if let Some(max) = self.max_tokens_output {
            generate.max_tokens_output = max;
        }
        if let Some(concurrency) = self.concurrency {
            generate.concurrency = concurrency;
        }

        let mut api = config.api();
        if let Some(model) = &self.model {
            api.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            api.base_url = base_url.clone();
        }
        if let Some(key) = &self.api_key {
            api.api_key = Some(key.clone());
        }

        config.generate = Some(generate);
        config.api = Some(api);
        config
    }
}

/// `Some` when one of a `--flag` / `--no-flag` pair was given
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commitpod_core::{ApiConfig, GenerateConfig};

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["commitpod"]).unwrap();
        assert!(!cli.stdin);
        assert!(!cli.dry_run);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "commitpod",
            "--stdin",
            "--emoji",
            "-l",
            "fr",
            "--max-tokens-input",
            "8000",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.stdin);
        assert!(cli.emoji);
        assert!(cli.dry_run);
        assert_eq!(cli.language.as_deref(), Some("fr"));
        assert_eq!(cli.max_tokens_input, Some(8000));
    }

    #[test]
    fn test_apply_overrides_config() {
        let config = Config {
            generate: Some(GenerateConfig {
                language: "de".to_string(),
                description: true,
                ..GenerateConfig::default()
            }),
            api: Some(ApiConfig {
                model: "from-file".to_string(),
                ..ApiConfig::default()
            }),
            ..Config::default()
        };
        let cli = Cli::try_parse_from([
            "commitpod",
            "--model",
            "from-cli",
            "--concurrency",
            "2",
        ])
        .unwrap();

        let merged = cli.apply(config);
        let generate = merged.generate();

        assert_eq!(generate.language, "de");
        assert!(generate.description);
        assert!(!generate.emoji);
        assert_eq!(generate.concurrency, 2);
        assert_eq!(merged.api().model, "from-cli");
    }

    #[test]
    fn test_no_flags_turn_off_config_toggles() {
        let config = Config {
            generate: Some(GenerateConfig {
                emoji: true,
                description: true,
                ..GenerateConfig::default()
            }),
            ..Config::default()
        };
        let cli =
            Cli::try_parse_from(["commitpod", "--no-emoji", "--no-description"]).unwrap();

        let generate = cli.apply(config).generate();

        assert!(!generate.emoji);
        assert!(!generate.description);
    }

    #[test]
    fn test_last_toggle_flag_wins() {
        let cli = Cli::try_parse_from(["commitpod", "--no-emoji", "--emoji"]).unwrap();
        assert!(cli.emoji);
        assert!(!cli.no_emoji);

        let generate = cli.apply(Config::default()).generate();
        assert!(generate.emoji);
    }
}
