use anyhow::{bail, Context, Result};
use std::process::Command;

pub struct GitHelper;

impl GitHelper {
    /// Staged paths relative to the current directory
    pub fn staged_files() -> Result<Vec<String>> {
        let stdout = Self::run(&["diff", "--name-only", "--cached", "--relative"])?;
        Ok(parse_name_list(&stdout))
    }

    /// `git diff --staged` restricted to `files`
    pub fn staged_diff(files: &[String]) -> Result<String> {
        if files.is_empty() {
            return Ok(String::new());
        }

        let mut args = vec!["diff", "--staged", "--"];
        args.extend(files.iter().map(String::as_str));
        Self::run(&args)
    }

    fn run(args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .output()
            .context("Failed to execute git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.join(" "), stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_name_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
