//! Best-effort extraction of structured data embedded in free-form text.
//!
//! LLM responses are not guaranteed to contain only the requested JSON
//! payload. Both the tool-decision path and the plan-decomposition path
//! share these helpers: scan the text for a balanced bracket span, try to
//! parse it, and return `None` when nothing well-formed is found.

use serde_json::Value;

/// Returns the first well-formed JSON object (`{...}`) embedded anywhere in
/// `text`, or `None` if no balanced span parses.
pub fn first_json_object(text: &str) -> Option<Value> {
    first_parsed_span(text, '{', '}')
}

/// Returns the first well-formed JSON array (`[...]`) embedded anywhere in
/// `text`, or `None` if no balanced span parses.
pub fn first_json_array(text: &str) -> Option<Value> {
    first_parsed_span(text, '[', ']')
}

fn first_parsed_span(text: &str, open: char, close: char) -> Option<Value> {
    for (start, c) in text.char_indices() {
        if c != open {
            continue;
        }
        if let Some(end) = balanced_end(&text[start..], open, close) {
            let span = &text[start..start + end];
            if let Ok(value) = serde_json::from_str::<Value>(span) {
                return Some(value);
            }
        }
    }
    None
}

/// Byte offset one past the bracket that balances the opening bracket at the
/// start of `s`, accounting for string literals and escapes.
fn balanced_end(s: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        }
    }
    None
}
