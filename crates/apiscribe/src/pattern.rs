//! Lazily compiled regular expressions shared by the scanners.

use crate::error::{ApiDocError, ApiDocResult};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Compile `pattern`, mapping the failure into a crate error
pub fn compile(pattern: &str) -> ApiDocResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| ApiDocError::pattern_error(format!("Failed to compile regex: {}", e)))
}

/// Compile `pattern` into `cell` on first use.
///
/// A pattern that does not compile is reported once and then matches nothing.
pub fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match compile(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            warn!(pattern, %error, "Pattern disabled");
            None
        }
    })
    .as_ref()
}

pub fn is_match(regex: Option<&Regex>, text: &str) -> bool {
    regex.map_or(false, |regex| regex.is_match(text))
}
