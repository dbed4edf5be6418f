// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::{detect_status, PaneStatus};

#[test]
fn empty_capture_is_idle() {
    assert_eq!(detect_status(""), PaneStatus::Idle);
    assert_eq!(detect_status("\n\n\n"), PaneStatus::Idle);
}

#[parameterized(
    braille_spinner = { "✻ Thinking…\n⠙ working on it" },
    keyword_generating = { "some output\nGenerating response" },
    keyword_interrupt = { "tool call finished\n(esc to interrupt)" },
)]
fn spinners_and_keywords_mean_working(capture: &str) {
    assert_eq!(detect_status(capture), PaneStatus::Working);
}

#[parameterized(
    claude_prompt = { "response done.\n❯" },
    python_prompt = { "done\n>>>" },
    shell_prompt = { "build finished\nuser@host:~/proj$" },
    bare_gt = { "finished\n>" },
)]
fn trailing_prompt_means_waiting(capture: &str) {
    assert_eq!(detect_status(capture), PaneStatus::Waiting);
}

#[test]
fn heavy_recent_content_means_working() {
    let line = "x".repeat(80);
    let capture = (0..10).map(|_| line.clone()).collect::<Vec<_>>().join("\n");
    assert_eq!(detect_status(&capture), PaneStatus::Working);
}

#[test]
fn sparse_output_without_prompt_is_idle() {
    assert_eq!(detect_status("hello\nworld"), PaneStatus::Idle);
}

#[test]
fn only_the_last_ten_lines_count() {
    // A spinner scrolled far above followed by a calm tail
    let mut lines = vec!["⠙ old spinner".to_string()];
    lines.extend((0..12).map(|i| format!("line {i}")));
    let capture = lines.join("\n");
    assert_eq!(detect_status(&capture), PaneStatus::Idle);
}

#[test]
fn prompt_above_last_line_does_not_mean_waiting() {
    // Prompt glyph in history, trailing plain text
    assert_eq!(detect_status("❯ run tests\nrunning"), PaneStatus::Working);
}
