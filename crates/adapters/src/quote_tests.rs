// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use yare::parameterized;

use super::{login_shell_wrap, sh_join, sh_quote};

#[parameterized(
    plain = { "hello", "hello" },
    path = { "/tmp/project", "/tmp/project" },
    flag = { "--model=opus", "--model=opus" },
    space = { "two words", "'two words'" },
    empty = { "", "''" },
    quote = { "it's", r"'it'\''s'" },
    dollar = { "$HOME", "'$HOME'" },
    backtick = { "`id`", "'`id`'" },
    semicolon = { "a;b", "'a;b'" },
)]
fn quoting_cases(input: &str, expected: &str) {
    assert_eq!(sh_quote(input), expected);
}

#[test]
fn join_quotes_each_word() {
    let joined = sh_join(["tmux", "new-window", "-n", "my window"]);
    assert_eq!(joined, "tmux new-window -n 'my window'");
}

#[test]
fn login_shell_wrap_quotes_once_more() {
    let wrapped = login_shell_wrap("tmux kill-session -t 'my session'");
    assert_eq!(wrapped, r"bash -lc 'tmux kill-session -t '\''my session'\'''");
}

/// Simulate POSIX single-quote tokenization: the quoted string must
/// read back as exactly one word equal to the original input.
fn unquote_one_word(quoted: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = quoted.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                out.push(chars.next()?);
            }
            ' ' | '\t' | ';' | '&' | '|' | '$' | '`' | '(' | ')' | '<' | '>' if !in_quotes => {
                // Word broke or a metacharacter survived quoting
                return None;
            }
            _ => out.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    Some(out)
}

proptest! {
    #[test]
    fn quoted_strings_round_trip(input in ".*") {
        let quoted = sh_quote(&input);
        // Empty input still produces a word ('')
        prop_assert!(!quoted.is_empty());
        if !input.is_empty() {
            prop_assert_eq!(unquote_one_word(&quoted), Some(input));
        }
    }

    #[test]
    fn quoted_strings_cannot_break_out(input in ".*") {
        // No unquoted metacharacter may survive
        prop_assert!(unquote_one_word(&sh_quote(&input)).is_some() || input.is_empty());
    }
}
