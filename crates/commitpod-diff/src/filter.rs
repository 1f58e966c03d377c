//! Excluding generated and binary-ish files from the diff

use regex::Regex;

/// Lock files and binary assets rarely say anything useful about a change
/// and are expensive in tokens.
const DEFAULT_EXCLUDES: &[&str] = &[
    r"\.lock$",
    r"-lock\.[^/]*$",
    r"(^|/)go\.sum$",
    r"(?i)\.(svg|png|jpe?g|gif|webp|ico|pdf)$",
];

/// Decides which changed paths go into the diff
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    /// Default exclusions plus `extra` regex patterns
    pub fn new(extra: &[String]) -> Result<Self, regex::Error> {
        let patterns = DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(Regex::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Only the `extra` patterns, for callers that want lock files too
    pub fn custom(extra: &[String]) -> Result<Self, regex::Error> {
        let patterns = extra
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Keep the paths that are not excluded, in their original order
    pub fn retain_included(&self, paths: Vec<String>) -> Vec<String> {
        paths
            .into_iter()
            .filter(|path| !self.is_excluded(path))
            .collect()
    }
}
