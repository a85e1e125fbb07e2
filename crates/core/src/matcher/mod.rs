//! Wanted/unwanted name pattern compilation.
//!
//! Patterns are configured as plain regex fragments. Each fragment is
//! compiled case-insensitively and keeps its originating key, so a
//! positive match can report which rule fired.

use regex_lite::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors raised while compiling name patterns.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {reason}")]
    Invalid { pattern: String, reason: String },
}

/// A compiled pattern together with the fragment it was built from.
#[derive(Debug, Clone)]
pub struct KeyedPattern {
    key: String,
    regex: Regex,
}

impl KeyedPattern {
    /// Compile a single fragment, case-insensitive.
    pub fn compile(key: &str) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(&format!("({})", key))
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::Invalid {
                pattern: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            key: key.to_string(),
            regex,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// The wanted and unwanted matchers used to classify remote files.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    wanted: Vec<KeyedPattern>,
    unwanted: Vec<KeyedPattern>,
}

impl PatternSet {
    /// Compile both lists, failing on the first malformed fragment.
    pub fn compile<W, U>(wanted: &[W], unwanted: &[U]) -> Result<Self, PatternError>
    where
        W: AsRef<str>,
        U: AsRef<str>,
    {
        Ok(Self {
            wanted: compile_all(wanted)?,
            unwanted: compile_all(unwanted)?,
        })
    }

    /// A set whose single wanted pattern accepts every name.
    pub fn match_all<U: AsRef<str>>(unwanted: &[U]) -> Result<Self, PatternError> {
        Self::compile(&[".*"], unwanted)
    }

    /// The first wanted pattern matching `name`, in configuration order.
    pub fn wanted_match(&self, name: &str) -> Option<&KeyedPattern> {
        self.wanted.iter().find(|p| p.is_match(name))
    }

    pub fn is_unwanted(&self, name: &str) -> bool {
        self.unwanted.iter().any(|p| p.is_match(name))
    }

    pub fn wanted_len(&self) -> usize {
        self.wanted.len()
    }
}

fn compile_all<S: AsRef<str>>(fragments: &[S]) -> Result<Vec<KeyedPattern>, PatternError> {
    fragments
        .iter()
        .map(|f| KeyedPattern::compile(f.as_ref()))
        .collect()
}

/// Compile a pattern that must match at the start of a release title.
pub fn compile_deviation(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(&format!("^(?:{})", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
