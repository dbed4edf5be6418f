// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure parsers for tmux format-string output.

use std::collections::HashMap;
use std::path::PathBuf;

use super::{PaneEntry, SessionTree, WindowEntry};

/// Format string handed to `list-panes -a` for tree scraping.
///
/// Tab-separated so session and window names containing spaces survive.
pub const TREE_FORMAT: &str = "#{session_name}\t#{window_index}\t#{window_name}\t#{pane_index}\t#{pane_current_command}\t#{pane_current_path}\t#{pane_pid}\t#{pane_active}\t#{pane_id}";

/// Parse `list-panes -a` output into a session tree.
///
/// Lines that do not match the format are skipped — tmux occasionally
/// interleaves warnings on stdout.
pub fn parse_tree(output: &str) -> Vec<SessionTree> {
    let mut sessions: Vec<SessionTree> = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 9 {
            continue;
        }
        let (Ok(window_index), Ok(pane_index), Ok(pid)) =
            (fields[1].parse::<u32>(), fields[3].parse::<u32>(), fields[6].parse::<u32>())
        else {
            continue;
        };

        let pane = PaneEntry {
            index: pane_index,
            command: fields[4].to_string(),
            cwd: PathBuf::from(fields[5]),
            pid,
            active: fields[7] == "1",
            pane_id: fields[8].to_string(),
        };

        let session = match sessions.iter_mut().find(|s| s.session == fields[0]) {
            Some(s) => s,
            None => {
                sessions.push(SessionTree { session: fields[0].to_string(), windows: Vec::new() });
                // Just pushed, cannot be empty
                match sessions.last_mut() {
                    Some(s) => s,
                    None => continue,
                }
            }
        };

        match session.windows.iter_mut().find(|w| w.index == window_index) {
            Some(w) => w.panes.push(pane),
            None => session.windows.push(WindowEntry {
                index: window_index,
                name: fields[2].to_string(),
                panes: vec![pane],
            }),
        }
    }

    sessions
}

/// Parse `list-sessions -F '#{session_name}'` output.
pub fn parse_sessions(output: &str) -> Vec<String> {
    output.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
}

/// Parse `show-options -p` output (`@cc_state busy` per line) into a map.
///
/// Values may be double-quoted by tmux; quotes are stripped.
pub fn parse_pane_options(output: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        let value = value.trim();
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
        options.insert(key.to_string(), value.to_string());
    }
    options
}

/// tmux prints this (on stderr, status 1) when no server is running;
/// callers treat it as an empty tree rather than an error.
pub fn is_no_server(stderr: &str) -> bool {
    let s = stderr.trim();
    s.starts_with("no server running") || s.contains("error connecting to") && s.contains("(No such file or directory)")
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
