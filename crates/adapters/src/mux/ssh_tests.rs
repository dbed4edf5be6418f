// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use yare::parameterized;

use mh_core::SshTarget;

use super::{classify_ssh_failure, destination, ssh_args};
use crate::mux::MuxError;

fn target() -> SshTarget {
    SshTarget {
        host: "build.example.com".into(),
        port: Some(2222),
        user: Some("ci".into()),
        identity_file: Some(PathBuf::from("/home/u/.ssh/id_ed25519")),
        config_file: None,
    }
}

#[test]
fn args_carry_hardening_options() {
    let args = ssh_args(&target(), "tmux list-sessions");
    let joined = args.join(" ");
    assert!(joined.contains("-o ConnectTimeout=5"));
    assert!(joined.contains("-o StrictHostKeyChecking=accept-new"));
    assert!(joined.contains("-o BatchMode=yes"));
    assert!(joined.contains("-p 2222"));
    assert!(joined.contains("-i /home/u/.ssh/id_ed25519"));
}

#[test]
fn remote_command_runs_through_login_shell() {
    let args = ssh_args(&target(), "tmux list-sessions");
    let last = args.last().unwrap();
    assert_eq!(last, "bash -lc 'tmux list-sessions'");
}

#[test]
fn destination_includes_user_when_set() {
    assert_eq!(destination(&target()), "ci@build.example.com");
    let mut anon = target();
    anon.user = None;
    assert_eq!(destination(&anon), "build.example.com");
}

#[test]
fn config_file_is_passed_with_capital_f() {
    let mut t = target();
    t.config_file = Some(PathBuf::from("/etc/ssh/alt_config"));
    let args = ssh_args(&t, "true");
    let joined = args.join(" ");
    assert!(joined.contains("-F /etc/ssh/alt_config"));
}

#[parameterized(
    auth = { "ci@host: Permission denied (publickey).", "auth denied" },
    hostkey = { "Host key verification failed.", "auth denied" },
    refused = { "ssh: connect to host x port 22: Connection refused", "connection refused" },
    timeout = { "ssh: connect to host x port 22: Connection timed out", "timeout" },
    no_tmux = { "bash: line 1: tmux: command not found", "tmux not installed" },
)]
fn classification(stderr: &str, reason: &str) {
    let err = classify_ssh_failure(Some(255), stderr).unwrap();
    assert_eq!(err.reason(), reason);
}

#[test]
fn unclassified_255_is_connection_refused() {
    let err = classify_ssh_failure(Some(255), "kex_exchange_identification: read: reset").unwrap();
    assert!(matches!(err, MuxError::ConnectionRefused(_)));
}

#[test]
fn remote_command_failures_are_not_classified() {
    assert!(classify_ssh_failure(Some(1), "can't find session: nope").is_none());
}
