// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tmux driver implementation.
//!
//! One driver serves both runtime kinds: local runtimes spawn the tmux
//! binary directly, SSH runtimes wrap the identical command line in a
//! hardened ssh invocation (see [`super::ssh`]). Transient SSH failures
//! are retried exactly once with a 500 ms delay inside the same call.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mh_core::{RuntimeDef, RuntimeKind};

use crate::quote::sh_join;

use super::cache::TreeCache;
use super::parse;
use super::ssh::{classify_ssh_failure, ssh_args};
use super::{MuxDriver, MuxError, NewSessionOpts, SessionTree};

/// Budget for tree scrapes.
const TREE_TIMEOUT: Duration = Duration::from_secs(5);
/// Budget for pane captures.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(2);
/// Budget for everything else (covers the SSH 5 s connect + work).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay before the single transient-SSH retry.
const RETRY_DELAY: Duration = Duration::from_millis(500);

struct CmdOutput {
    status: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CmdOutput {
    fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Driver over tmux for local and SSH runtimes.
pub struct TmuxDriver {
    tmux_bin: String,
    cache: TreeCache,
}

impl Default for TmuxDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxDriver {
    pub fn new() -> Self {
        Self::with_binary("tmux")
    }

    pub fn with_binary(tmux_bin: impl Into<String>) -> Self {
        Self { tmux_bin: tmux_bin.into(), cache: TreeCache::default() }
    }

    /// Run a tmux subcommand on the runtime.
    async fn run(
        &self,
        rt: &RuntimeDef,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CmdOutput, MuxError> {
        match rt.kind {
            RuntimeKind::LocalMux => {
                let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
                run_command(&self.tmux_bin, argv, timeout).await
            }
            RuntimeKind::SshMux => self.run_ssh(rt, args, timeout).await,
        }
    }

    async fn run_ssh(
        &self,
        rt: &RuntimeDef,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CmdOutput, MuxError> {
        let target = rt
            .ssh
            .as_ref()
            .ok_or_else(|| MuxError::CommandFailed("ssh runtime has no ssh target".into()))?;
        let inner =
            sh_join(std::iter::once(self.tmux_bin.as_str()).chain(args.iter().copied()));
        let argv = ssh_args(target, &inner);

        let first = run_and_classify("ssh", argv.clone(), timeout).await;
        match first {
            Err(ref e) if e.is_transient() => {
                debug!(runtime = %rt.id, error = %e, "transient ssh failure, retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                run_and_classify("ssh", argv, timeout).await
            }
            other => other,
        }
    }

    /// Run and require exit status 0, mapping failures to
    /// `CommandFailed` with the first stderr line.
    async fn run_ok(
        &self,
        rt: &RuntimeDef,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, MuxError> {
        let output = self.run(rt, args, timeout).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(MuxError::CommandFailed(stderr_line(&output)))
        }
    }

    async fn fetch_tree(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError> {
        let output = self
            .run(rt, &["list-panes", "-a", "-F", parse::TREE_FORMAT], TREE_TIMEOUT)
            .await?;
        if output.success() {
            Ok(parse::parse_tree(&output.stdout))
        } else if parse::is_no_server(&output.stderr) {
            Ok(Vec::new())
        } else {
            Err(MuxError::CommandFailed(stderr_line(&output)))
        }
    }
}

fn stderr_line(output: &CmdOutput) -> String {
    output.stderr.lines().next().unwrap_or("tmux exited with an error").trim().to_string()
}

async fn run_command(
    program: &str,
    args: Vec<String>,
    timeout: Duration,
) -> Result<CmdOutput, MuxError> {
    let future = tokio::process::Command::new(program)
        .args(&args)
        .kill_on_drop(true)
        .output();
    let output = tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| MuxError::Timeout(format!("{program} did not finish in {timeout:?}")))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MuxError::NotInstalled(program.to_string()),
            _ => MuxError::Io(e.to_string()),
        })?;

    Ok(CmdOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

async fn run_and_classify(
    program: &str,
    args: Vec<String>,
    timeout: Duration,
) -> Result<CmdOutput, MuxError> {
    let output = run_command(program, args, timeout).await?;
    if !output.success() {
        if let Some(err) = classify_ssh_failure(output.status, &output.stderr) {
            return Err(err);
        }
    }
    Ok(output)
}

fn window_target(session: &str, window: u32) -> String {
    format!("{session}:{window}")
}

fn pane_target(session: &str, window: u32, pane: u32) -> String {
    format!("{session}:{window}.{pane}")
}

#[async_trait]
impl MuxDriver for TmuxDriver {
    async fn list_sessions(&self, rt: &RuntimeDef) -> Result<Vec<String>, MuxError> {
        let output = self
            .run(rt, &["list-sessions", "-F", "#{session_name}"], TREE_TIMEOUT)
            .await?;
        if output.success() {
            Ok(parse::parse_sessions(&output.stdout))
        } else if parse::is_no_server(&output.stderr) {
            Ok(Vec::new())
        } else {
            Err(MuxError::CommandFailed(stderr_line(&output)))
        }
    }

    async fn get_tree(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError> {
        if let Some(tree) = self.cache.get(&rt.id) {
            return Ok(tree);
        }
        let tree = self.fetch_tree(rt).await?;
        self.cache.put(rt.id.clone(), tree.clone());
        Ok(tree)
    }

    async fn get_tree_fresh(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError> {
        self.cache.invalidate(&rt.id);
        let tree = self.fetch_tree(rt).await?;
        self.cache.put(rt.id.clone(), tree.clone());
        Ok(tree)
    }

    async fn new_session(
        &self,
        rt: &RuntimeDef,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MuxError> {
        let mut args: Vec<&str> = vec!["new-session", "-d", "-s", name];
        let cwd;
        if let Some(dir) = &opts.cwd {
            cwd = dir.display().to_string();
            args.push("-c");
            args.push(&cwd);
        }
        if let Some(window) = &opts.initial_window_name {
            args.push("-n");
            args.push(window);
        }
        self.cache.invalidate(&rt.id);
        self.run_ok(rt, &args, DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn kill_session(&self, rt: &RuntimeDef, name: &str) -> Result<(), MuxError> {
        self.cache.invalidate(&rt.id);
        self.run_ok(rt, &["kill-session", "-t", name], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn rename_session(&self, rt: &RuntimeDef, from: &str, to: &str) -> Result<(), MuxError> {
        self.cache.invalidate(&rt.id);
        self.run_ok(rt, &["rename-session", "-t", from, to], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn new_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<u32, MuxError> {
        let target = format!("{session}:");
        let mut args: Vec<&str> = vec!["new-window", "-d", "-t", &target];
        if let Some(n) = name {
            args.push("-n");
            args.push(n);
        }
        let dir;
        if let Some(d) = cwd {
            dir = d.display().to_string();
            args.push("-c");
            args.push(&dir);
        }
        args.push("-P");
        args.push("-F");
        args.push("#{window_index}");
        self.cache.invalidate(&rt.id);
        let stdout = self.run_ok(rt, &args, DEFAULT_TIMEOUT).await?;
        stdout
            .trim()
            .parse::<u32>()
            .map_err(|_| MuxError::CommandFailed(format!("unexpected new-window output: {stdout:?}")))
    }

    async fn kill_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
    ) -> Result<(), MuxError> {
        self.cache.invalidate(&rt.id);
        let target = window_target(session, window);
        self.run_ok(rt, &["kill-window", "-t", &target], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn select_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
    ) -> Result<(), MuxError> {
        let target = window_target(session, window);
        self.run_ok(rt, &["select-window", "-t", &target], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn rename_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        name: &str,
    ) -> Result<(), MuxError> {
        self.cache.invalidate(&rt.id);
        let target = window_target(session, window);
        self.run_ok(rt, &["rename-window", "-t", &target, name], DEFAULT_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn split_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        vertical: bool,
    ) -> Result<u32, MuxError> {
        let target = pane_target(session, window, pane);
        let direction = if vertical { "-v" } else { "-h" };
        self.cache.invalidate(&rt.id);
        let stdout = self
            .run_ok(
                rt,
                &["split-window", direction, "-d", "-t", &target, "-P", "-F", "#{pane_index}"],
                DEFAULT_TIMEOUT,
            )
            .await?;
        stdout
            .trim()
            .parse::<u32>()
            .map_err(|_| MuxError::CommandFailed(format!("unexpected split-window output: {stdout:?}")))
    }

    async fn kill_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
    ) -> Result<(), MuxError> {
        self.cache.invalidate(&rt.id);
        let target = pane_target(session, window, pane);
        self.run_ok(rt, &["kill-pane", "-t", &target], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn select_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
    ) -> Result<(), MuxError> {
        let target = pane_target(session, window, pane);
        self.run_ok(rt, &["select-pane", "-t", &target], DEFAULT_TIMEOUT).await.map(|_| ())
    }

    async fn send_keys(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        text: &str,
        append_enter: bool,
    ) -> Result<(), MuxError> {
        let target = pane_target(session, window, pane);
        if !text.is_empty() {
            self.run_ok(rt, &["send-keys", "-t", &target, "-l", "--", text], DEFAULT_TIMEOUT)
                .await?;
        }
        if append_enter {
            self.run_ok(rt, &["send-keys", "-t", &target, "Enter"], DEFAULT_TIMEOUT).await?;
        }
        Ok(())
    }

    async fn capture(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        lines: u32,
    ) -> Result<String, MuxError> {
        let target = pane_target(session, window, pane);
        let start = format!("-{lines}");
        self.run_ok(rt, &["capture-pane", "-p", "-t", &target, "-S", &start], CAPTURE_TIMEOUT)
            .await
    }

    async fn read_pane_options(
        &self,
        rt: &RuntimeDef,
        pane_ids: &[String],
    ) -> Result<HashMap<String, HashMap<String, String>>, MuxError> {
        let mut result = HashMap::new();
        for pane_id in pane_ids {
            let output = self
                .run(rt, &["show-options", "-p", "-q", "-t", pane_id], CAPTURE_TIMEOUT)
                .await?;
            // A vanished pane is not an error for a batched read
            if output.success() {
                result.insert(pane_id.clone(), parse::parse_pane_options(&output.stdout));
            }
        }
        Ok(result)
    }

    async fn set_automatic_rename(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        enabled: bool,
    ) -> Result<(), MuxError> {
        let target = window_target(session, window);
        let value = if enabled { "on" } else { "off" };
        self.run_ok(rt, &["set-option", "-w", "-t", &target, "automatic-rename", value], DEFAULT_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn exec(&self, rt: &RuntimeDef, command: &str) -> Result<String, MuxError> {
        match rt.kind {
            RuntimeKind::LocalMux => {
                let output = run_command(
                    "sh",
                    vec!["-c".to_string(), command.to_string()],
                    Duration::from_secs(30),
                )
                .await?;
                if output.success() {
                    Ok(output.stdout)
                } else {
                    Err(MuxError::CommandFailed(stderr_line(&output)))
                }
            }
            RuntimeKind::SshMux => {
                let target = rt.ssh.as_ref().ok_or_else(|| {
                    MuxError::CommandFailed("ssh runtime has no ssh target".into())
                })?;
                let argv = ssh_args(target, command);
                let output = run_and_classify("ssh", argv, Duration::from_secs(30)).await?;
                if output.success() {
                    Ok(output.stdout)
                } else {
                    Err(MuxError::CommandFailed(stderr_line(&output)))
                }
            }
        }
    }
}
