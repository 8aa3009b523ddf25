//! Text scanning over a transformer's declared map literal.
//!
//! The scanner only needs to find top-level `key => expression` (or
//! `key: expression`) pairs and classify expressions; it never evaluates them.

use crate::pattern;
use regex::Regex;
use std::sync::OnceLock;

/// One declared output key and the raw text of its expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeEntry {
    pub key: String,
    pub expression: String,
}

/// How an expression delegates to another transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `new Name(..)` or `Name::new(..)`
    Construct,
    /// `Name::make(..)`
    Factory,
    /// `Name::collection(..)`, yields a one-element sequence
    Collection,
}

/// A reference to another transformer found in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerCall {
    pub name: String,
    pub kind: CallKind,
}

macro_rules! call_pattern {
    () => {
        r"(\bnew\s+)?((?:[A-Za-z_][A-Za-z0-9_]*::)*[A-Za-z_][A-Za-z0-9_]*)\s*\("
    };
}

fn call_regex() -> Option<&'static Regex> {
    static CALL: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&CALL, call_pattern!())
}

fn leading_call_regex() -> Option<&'static Regex> {
    static LEADING_CALL: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&LEADING_CALL, concat!(r"^\s*", call_pattern!()))
}

/// Receiver segments may carry a `$` or `@` sigil (`$this->whenLoaded(..)`)
fn conditional_regex() -> Option<&'static Regex> {
    static CONDITIONAL: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(
        &CONDITIONAL,
        r"^\s*(?:[$@]?[A-Za-z_][A-Za-z0-9_]*(?:\.|->|::))*when[A-Za-z0-9_]*\s*\(",
    )
}

fn key_regex() -> Option<&'static Regex> {
    static KEY: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&KEY, r"^[A-Za-z_][A-Za-z0-9_]*$")
}

/// Declared entries of the first map literal in `body`.
///
/// Returns `None` when the text has no map literal or its brackets/quotes do
/// not balance; callers treat that as an unresolvable transformer.
pub fn scan_entries(body: &str) -> Option<Vec<ShapeEntry>> {
    let text = strip_comments(body);
    let open = first_opener(&text)?;
    let close = matching_close(&text, open)?;
    scan_content(&text[open + 1..close])
}

/// Entries of a nested map literal value such as `{ "a": x, "b": y }`
pub fn nested_entries(expression: &str) -> Option<Vec<ShapeEntry>> {
    let trimmed = expression.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let close = matching_close(trimmed, 0)?;
    if !trimmed[close + 1..].trim().is_empty() {
        return None;
    }
    scan_content(&trimmed[1..close])
}

/// Whether the expression is guarded by a runtime predicate (`when(..)`,
/// `self.when_loaded(..)`, ...)
pub fn is_conditional(expression: &str) -> bool {
    pattern::is_match(conditional_regex(), expression)
}

/// Transformer call that the whole expression consists of
pub fn leading_call(expression: &str) -> Option<TransformerCall> {
    let caps = leading_call_regex()?.captures(expression)?;
    classify(caps.get(1).is_some(), caps.get(2)?.as_str())
}

/// First transformer call anywhere inside the expression
pub fn find_call(expression: &str) -> Option<TransformerCall> {
    call_regex()?
        .captures_iter(expression)
        .find_map(|caps| classify(caps.get(1).is_some(), caps.get(2)?.as_str()))
}

fn classify(constructed: bool, path: &str) -> Option<TransformerCall> {
    if constructed {
        return transformer_name(path).map(|name| TransformerCall {
            name,
            kind: CallKind::Construct,
        });
    }

    let (prefix, method) = path.rsplit_once("::")?;
    let kind = match method {
        "new" => CallKind::Construct,
        "make" => CallKind::Factory,
        "collection" => CallKind::Collection,
        _ => return None,
    };
    transformer_name(prefix).map(|name| TransformerCall { name, kind })
}

/// Transformer names are type-like: the last segment starts upper-case
fn transformer_name(path: &str) -> Option<String> {
    let last = path.rsplit("::").next()?;
    if last.chars().next().map_or(false, char::is_uppercase) {
        Some(path.to_string())
    } else {
        None
    }
}

fn scan_content(content: &str) -> Option<Vec<ShapeEntry>> {
    let mut entries = Vec::new();
    for raw in split_top_level(content)? {
        if let Some(entry) = parse_entry(raw) {
            entries.push(entry);
        }
    }
    Some(entries)
}

fn parse_entry(raw: &str) -> Option<ShapeEntry> {
    let (key, expression) = split_association(raw)?;
    let key = key.trim();
    let key = if is_quoted(key) {
        key[1..key.len() - 1].to_string()
    } else if pattern::is_match(key_regex(), key) {
        key.to_string()
    } else {
        return None;
    };

    if key.is_empty() {
        return None;
    }

    Some(ShapeEntry {
        key,
        expression: expression.trim().to_string(),
    })
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')))
}

/// Byte positions and characters at nesting depth zero, outside quotes.
/// `None` when brackets or quotes do not balance.
fn top_level_chars(text: &str) -> Option<Vec<(usize, char)>> {
    let mut positions = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if let Some(open_quote) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open_quote {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let open = stack.pop()?;
                if !brackets_match(open, ch) {
                    return None;
                }
            }
            _ if stack.is_empty() => positions.push((index, ch)),
            _ => {}
        }
    }

    if quote.is_some() || !stack.is_empty() {
        return None;
    }
    Some(positions)
}

fn split_top_level(content: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, ch) in top_level_chars(content)? {
        if ch == ',' {
            parts.push(&content[start..index]);
            start = index + 1;
        }
    }
    parts.push(&content[start..]);
    Some(parts.into_iter().filter(|part| !part.trim().is_empty()).collect())
}

/// Split at the first top-level `=>` or single `:` (never `::`)
fn split_association(entry: &str) -> Option<(&str, &str)> {
    let bytes = entry.as_bytes();
    for (index, ch) in top_level_chars(entry)? {
        match ch {
            '=' if bytes.get(index + 1) == Some(&b'>') => {
                return Some((&entry[..index], &entry[index + 2..]));
            }
            ':' => {
                let previous_colon = index > 0 && bytes[index - 1] == b':';
                let next_colon = bytes.get(index + 1) == Some(&b':');
                if !previous_colon && !next_colon {
                    return Some((&entry[..index], &entry[index + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn brackets_match(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// First `{` or `[` outside quotes
fn first_opener(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        if let Some(open_quote) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open_quote {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' | '[' => return Some(index),
            _ => {}
        }
    }
    None
}

/// Byte index of the bracket that closes the one at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text[open..].char_indices() {
        if let Some(open_quote) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open_quote {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let opened = stack.pop()?;
                if !brackets_match(opened, ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop `//` line comments that are not inside quotes
fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| {
            let mut quote: Option<char> = None;
            let mut escaped = false;
            let mut previous_slash = false;
            for (index, ch) in line.char_indices() {
                if let Some(open_quote) = quote {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == open_quote {
                        quote = None;
                    }
                    continue;
                }
                match ch {
                    '\'' | '"' => quote = Some(ch),
                    '/' if previous_slash => return &line[..index - 1],
                    _ => {}
                }
                previous_slash = ch == '/';
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
