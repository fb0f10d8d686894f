//! Helpers for pulling structure out of free-text model replies.

/// Returns the first balanced `open … close` substring of `raw`.
///
/// Delimiters inside JSON string literals are ignored, so a reason such as
/// `"use {braces}"` does not end the object early. Returns `None` if no opening
/// delimiter exists or it is never closed.
pub fn first_balanced(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&raw[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips formatting artefacts models like to wrap a description in.
///
/// Removes surrounding whitespace, a wrapping code fence, one pair of wrapping
/// straight or curly quotes, and a leading `Description:` label.
pub fn clean_generated_text(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(inner) = text.strip_prefix("```") {
        // Drop an optional language tag on the fence line.
        let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
        text = inner.strip_suffix("```").unwrap_or(inner).trim();
    }

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }

    for label in ["Description:", "description:", "**Description:**"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim_start();
            break;
        }
    }

    text.to_string()
}

/// The text after a list marker such as `-`, `*`, `•`, `1.` or `2)`, or
/// `None` if the line is not a list item.
pub fn list_item(line: &str) -> Option<&str> {
    let line = line.trim();
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim());
        }
    }
    None
}
