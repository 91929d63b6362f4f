//! JSON recovery from free-form advisor answers.

use crate::advisor::domain::{StrategyDocument, StrategyIssue};
use crate::rewrite::services::compile_pattern;
use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| compile_pattern(r"```[A-Za-z]*"));

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| compile_pattern(r",(\s*[}\]])"));

/// Extracts the first balanced JSON object from an answer.
///
/// Markdown fences and leading prose are ignored and trailing commas before
/// `}` or `]` are removed. Braces inside string literals do not count
/// towards balancing.
///
/// # Errors
///
/// Returns [`StrategyIssue::JsonNotFound`] when the answer has no `{`, or
/// [`StrategyIssue::JsonDecode`] when no balanced candidate decodes.
pub fn extract_json(raw: &str) -> Result<String, StrategyIssue> {
    let cleaned = FENCE.replace_all(raw, "");
    let Some(start) = cleaned.find('{') else {
        return Err(StrategyIssue::JsonNotFound);
    };
    let body = cleaned.get(start..).unwrap_or_default();
    let mut scanner = BraceScanner::default();
    let mut last_error = None;
    for (offset, ch) in body.char_indices() {
        if !scanner.closes_object(ch) {
            continue;
        }
        let Some(candidate) = body.get(..=offset) else {
            continue;
        };
        let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
        match serde_json::from_str::<serde_json::Value>(&repaired) {
            Ok(_) => return Ok(repaired.into_owned()),
            Err(err) => last_error = Some(err.to_string()),
        }
    }
    Err(StrategyIssue::JsonDecode(
        last_error.unwrap_or_else(|| "unbalanced braces".to_owned()),
    ))
}

/// Extracts and decodes a strategy document.
///
/// # Errors
///
/// Returns the extraction issue, or [`StrategyIssue::Shape`] when the JSON
/// does not have the strategy shape.
pub fn parse_strategy(raw: &str) -> Result<StrategyDocument, StrategyIssue> {
    let json = extract_json(raw)?;
    serde_json::from_str(&json).map_err(|err| StrategyIssue::Shape(err.to_string()))
}

#[derive(Debug, Default)]
struct BraceScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl BraceScanner {
    /// Feeds one character; returns `true` when it closes a top-level
    /// object.
    const fn closes_object(&mut self, ch: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            return false;
        }
        match ch {
            '"' => {
                self.in_string = true;
                false
            }
            '{' => {
                self.depth = self.depth.saturating_add(1);
                false
            }
            '}' => {
                self.depth = self.depth.saturating_sub(1);
                self.depth == 0
            }
            _ => false,
        }
    }
}
