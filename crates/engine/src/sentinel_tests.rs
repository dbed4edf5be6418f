// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{fresh_token, instruction, scan, SentinelScan};

const TOKEN: &str = "abc123def456";

fn capture(body: &str) -> String {
    format!(
        "some earlier output\n<promise-summary>{TOKEN}\n{body}\n</promise-summary>\n<promise>{TOKEN}-DONE</promise>\n❯"
    )
}

#[test]
fn complete_protocol_extracts_trimmed_summary() {
    let text = capture("  Wrote hello.py and ran it.\nAll tests pass.  ");
    assert_eq!(
        scan(&text, TOKEN),
        SentinelScan::Done { summary: Some("Wrote hello.py and ran it.\nAll tests pass.".into()) }
    );
}

#[test]
fn absent_markers_are_not_ready() {
    assert_eq!(scan("just output", TOKEN), SentinelScan::NotReady);
}

#[test]
fn summary_without_done_marker_keeps_polling() {
    let text = format!("<promise-summary>{TOKEN}\nhalf written...");
    assert_eq!(scan(&text, TOKEN), SentinelScan::NotReady);
}

#[test]
fn wrong_token_is_ignored() {
    let text = capture("summary");
    assert_eq!(scan(&text, "other-token"), SentinelScan::NotReady);
}

#[test]
fn done_with_malformed_summary_completes_without_summary() {
    let text = format!("noise\n<promise>{TOKEN}-DONE</promise>");
    assert_eq!(scan(&text, TOKEN), SentinelScan::Done { summary: None });
}

#[test]
fn done_with_empty_summary_block_is_done_without_summary() {
    let text =
        format!("<promise-summary>{TOKEN}\n   \n</promise-summary>\n<promise>{TOKEN}-DONE</promise>");
    assert_eq!(scan(&text, TOKEN), SentinelScan::Done { summary: None });
}

#[test]
fn summary_after_done_marker_does_not_count() {
    let text = format!(
        "<promise>{TOKEN}-DONE</promise>\n<promise-summary>{TOKEN}\nlate\n</promise-summary>"
    );
    assert_eq!(scan(&text, TOKEN), SentinelScan::Done { summary: None });
}

#[test]
fn instruction_embeds_both_markers() {
    let text = instruction(TOKEN);
    assert!(text.contains(&format!("<promise-summary>{TOKEN}")));
    assert!(text.contains(&format!("<promise>{TOKEN}-DONE</promise>")));
}

#[test]
fn tokens_are_random_and_sized() {
    let a = fresh_token();
    let b = fresh_token();
    assert_eq!(a.len(), 12);
    assert_ne!(a, b);
}
