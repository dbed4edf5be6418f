// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sentinel completion protocol.
//!
//! Tasks launched with auto-close instruct the AI to emit exactly two
//! markers when done:
//!
//! ```text
//! <promise-summary>{token}
//! <2-5 sentence summary>
//! </promise-summary>
//! <promise>{token}-DONE</promise>
//! ```
//!
//! Scanning is a pure function over captured pane text; no I/O here.

/// Result of scanning a capture for the two markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelScan {
    /// Markers absent or incomplete; keep polling.
    NotReady,
    /// The done marker was found. `summary` is the trimmed block body,
    /// or `None` when the summary block was malformed — callers fall
    /// back to the raw session tail.
    Done { summary: Option<String> },
}

/// Scan `captured` for the completion markers keyed on `token`.
///
/// The done marker alone completes the task: a correct summary block
/// must appear before it, but a malformed or missing block does not
/// hold the task open forever.
pub fn scan(captured: &str, token: &str) -> SentinelScan {
    let done_marker = format!("<promise>{token}-DONE</promise>");
    let Some(done_at) = captured.find(&done_marker) else {
        return SentinelScan::NotReady;
    };

    let summary = extract_summary(&captured[..done_at], token);
    SentinelScan::Done { summary }
}

/// The trimmed body between `<promise-summary>{token}` and
/// `</promise-summary>`, when both are present in order.
fn extract_summary(haystack: &str, token: &str) -> Option<String> {
    let open = format!("<promise-summary>{token}");
    let start = haystack.find(&open)? + open.len();
    let rest = &haystack[start..];
    let end = rest.find("</promise-summary>")?;
    let body = rest[..end].trim();
    if body.is_empty() {
        return None;
    }
    Some(body.to_string())
}

/// The sentinel clause appended to prompts of auto-close tasks.
pub fn instruction(token: &str) -> String {
    format!(
        "When you have fully completed the task, emit exactly these two markers:\n\
         <promise-summary>{token}\n\
         <2-5 sentence summary of what you did>\n\
         </promise-summary>\n\
         <promise>{token}-DONE</promise>"
    )
}

/// Fresh random token scoping one task's sentinel protocol.
pub fn fresh_token() -> String {
    nanoid::nanoid!(12)
}

#[cfg(test)]
#[path = "sentinel_tests.rs"]
mod tests;
