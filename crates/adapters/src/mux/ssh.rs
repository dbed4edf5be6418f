// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH command construction and failure classification.
//!
//! Every remote invocation is wrapped with non-negotiable options:
//! connect-timeout 5 s, `StrictHostKeyChecking=accept-new`, batch mode,
//! custom config/port/identity honoured, and the remote command run via
//! a login shell so PATH is populated.

use mh_core::SshTarget;

use crate::quote::login_shell_wrap;

use super::MuxError;

/// Argv for `ssh` (excluding the program name) to run `remote_command`
/// on `target` through a login shell.
pub fn ssh_args(target: &SshTarget, remote_command: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-o".into(),
        "ConnectTimeout=5".into(),
        "-o".into(),
        "StrictHostKeyChecking=accept-new".into(),
        "-o".into(),
        "BatchMode=yes".into(),
    ];
    if let Some(config) = &target.config_file {
        args.push("-F".into());
        args.push(config.display().to_string());
    }
    if let Some(port) = target.port {
        args.push("-p".into());
        args.push(port.to_string());
    }
    if let Some(identity) = &target.identity_file {
        args.push("-i".into());
        args.push(identity.display().to_string());
    }
    args.push(destination(target));
    args.push(login_shell_wrap(remote_command));
    args
}

/// `user@host` or bare `host`.
pub fn destination(target: &SshTarget) -> String {
    match &target.user {
        Some(user) => format!("{}@{}", user, target.host),
        None => target.host.clone(),
    }
}

/// Classify an ssh failure from its exit status and stderr.
///
/// ssh reserves exit status 255 for its own errors; anything else came
/// from the remote command and is left for the tmux-level handling.
pub fn classify_ssh_failure(status: Option<i32>, stderr: &str) -> Option<MuxError> {
    let lower = stderr.to_lowercase();
    if lower.contains("permission denied") || lower.contains("host key verification failed") {
        return Some(MuxError::AuthDenied(first_line(stderr)));
    }
    if lower.contains("connection refused") {
        return Some(MuxError::ConnectionRefused(first_line(stderr)));
    }
    if lower.contains("connection timed out")
        || lower.contains("operation timed out")
        || lower.contains("timed out")
    {
        return Some(MuxError::Timeout(first_line(stderr)));
    }
    if lower.contains("tmux: command not found")
        || lower.contains("tmux: not found")
        || lower.contains("command not found: tmux")
    {
        return Some(MuxError::NotInstalled(first_line(stderr)));
    }
    if status == Some(255) {
        // ssh's own failure that we couldn't classify more precisely
        return Some(MuxError::ConnectionRefused(first_line(stderr)));
    }
    None
}

fn first_line(s: &str) -> String {
    s.lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
