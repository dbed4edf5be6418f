// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure status heuristic over captured pane text.
//!
//! Scraping is a protocol: this function never does I/O, so it can be
//! exercised exhaustively against real captured transcripts.

/// What the pane appears to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneStatus {
    /// Provider is generating or running tools.
    Working,
    /// Provider is waiting for user input.
    Waiting,
    /// Nothing recognisable is happening.
    Idle,
}

/// Spinner glyphs the supported CLIs render while generating.
const SPINNER_GLYPHS: &[char] =
    &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏', '✢', '✳', '✶', '✻', '✽', '·', '∗'];

/// Keywords the supported CLIs print while generating (matched
/// case-insensitively).
const WORKING_KEYWORDS: &[&str] = &[
    "thinking", "generating", "working", "running", "executing", "pondering", "reasoning",
    "compacting", "esc to interrupt",
];

/// Prompt glyphs that indicate the CLI is waiting at an input line.
const PROMPT_GLYPHS: &[&str] = &["❯", ">>>", ">", "$"];

/// Recent-content volume above which the pane is assumed busy.
const BUSY_CONTENT_THRESHOLD: usize = 500;

/// Heuristic status of a pane from its captured tail.
///
/// Considers the last ~10 non-empty lines: spinner glyphs or generation
/// keywords mean working; a trailing prompt glyph on the last line
/// means waiting; a large volume of recent content means working; a
/// quiet pane is idle.
pub fn detect_status(captured: &str) -> PaneStatus {
    let lines: Vec<&str> = captured
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let tail: &[&str] = if lines.len() > 10 { &lines[lines.len() - 10..] } else { &lines };

    if tail.is_empty() {
        return PaneStatus::Idle;
    }

    for line in tail {
        if line.chars().any(|c| SPINNER_GLYPHS.contains(&c)) {
            return PaneStatus::Working;
        }
        let lower = line.to_lowercase();
        if WORKING_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return PaneStatus::Working;
        }
    }

    // Last line ending at a prompt means the CLI handed control back
    if let Some(last) = tail.last() {
        let trimmed = last.trim();
        if PROMPT_GLYPHS.iter().any(|g| trimmed == *g || trimmed.ends_with(g)) {
            return PaneStatus::Waiting;
        }
    }

    let recent_volume: usize = tail.iter().map(|l| l.len()).sum();
    if recent_volume >= BUSY_CONTENT_THRESHOLD {
        return PaneStatus::Working;
    }

    PaneStatus::Idle
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
