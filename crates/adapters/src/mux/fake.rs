// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tmux driver for tests.
//!
//! Models just enough of tmux: sessions with indexed windows and panes,
//! scripted capture output, recorded `send_keys`, and an optional
//! forced failure for unreachable-runtime scenarios.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use mh_core::RuntimeDef;

use super::{MuxDriver, MuxError, NewSessionOpts, PaneEntry, SessionTree, WindowEntry};

#[derive(Debug, Clone)]
pub struct SentKeys {
    pub runtime: String,
    pub session: String,
    pub window: u32,
    pub pane: u32,
    pub text: String,
    pub enter: bool,
}

#[derive(Default)]
struct FakePane {
    index: u32,
    output: String,
    options: HashMap<String, String>,
}

struct FakeWindow {
    index: u32,
    name: String,
    panes: Vec<FakePane>,
}

struct FakeSession {
    name: String,
    windows: Vec<FakeWindow>,
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<FakeSession>,
    sent: Vec<SentKeys>,
    execs: Vec<String>,
    exec_output: String,
    killed_sessions: Vec<String>,
    fail_all: Option<MuxError>,
}

/// Scriptable in-memory [`MuxDriver`].
#[derive(Default)]
pub struct FakeMux {
    state: Mutex<FakeState>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent operation fails with `error` (SSH-down scenarios).
    pub fn fail_all(&self, error: MuxError) {
        self.state.lock().fail_all = Some(error);
    }

    pub fn clear_failure(&self) {
        self.state.lock().fail_all = None;
    }

    /// Pre-create a session with one window (index 0, one pane).
    pub fn add_session(&self, name: &str, window_name: &str) {
        self.state.lock().sessions.push(FakeSession {
            name: name.to_string(),
            windows: vec![FakeWindow {
                index: 0,
                name: window_name.to_string(),
                panes: vec![FakePane::default()],
            }],
        });
    }

    /// Script what `capture` returns for a pane.
    pub fn set_output(&self, session: &str, window: u32, pane: u32, output: &str) {
        let mut state = self.state.lock();
        if let Some(p) = find_pane(&mut state, session, window, pane) {
            p.output = output.to_string();
        }
    }

    pub fn set_pane_options(
        &self,
        session: &str,
        window: u32,
        pane: u32,
        options: HashMap<String, String>,
    ) {
        let mut state = self.state.lock();
        if let Some(p) = find_pane(&mut state, session, window, pane) {
            p.options = options;
        }
    }

    pub fn set_exec_output(&self, output: &str) {
        self.state.lock().exec_output = output.to_string();
    }

    pub fn sent_keys(&self) -> Vec<SentKeys> {
        self.state.lock().sent.clone()
    }

    pub fn execs(&self) -> Vec<String> {
        self.state.lock().execs.clone()
    }

    pub fn killed_sessions(&self) -> Vec<String> {
        self.state.lock().killed_sessions.clone()
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.state.lock().sessions.iter().any(|s| s.name == name)
    }

    /// `(index, name)` of every window in a session.
    pub fn window_names(&self, session: &str) -> Vec<(u32, String)> {
        self.state
            .lock()
            .sessions
            .iter()
            .find(|s| s.name == session)
            .map(|s| s.windows.iter().map(|w| (w.index, w.name.clone())).collect())
            .unwrap_or_default()
    }

    /// Remove a window out-of-band (simulates a user closing it).
    pub fn drop_window(&self, session: &str, window: u32) {
        let mut state = self.state.lock();
        if let Some(s) = state.sessions.iter_mut().find(|s| s.name == session) {
            s.windows.retain(|w| w.index != window);
        }
    }

    /// Remove a session out-of-band (simulates `tmux kill-session`).
    pub fn drop_session(&self, session: &str) {
        self.state.lock().sessions.retain(|s| s.name != session);
    }

    fn check(&self) -> Result<(), MuxError> {
        match &self.state.lock().fail_all {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn find_pane<'s>(
    state: &'s mut FakeState,
    session: &str,
    window: u32,
    pane: u32,
) -> Option<&'s mut FakePane> {
    state
        .sessions
        .iter_mut()
        .find(|s| s.name == session)?
        .windows
        .iter_mut()
        .find(|w| w.index == window)?
        .panes
        .iter_mut()
        .find(|p| p.index == pane)
}

fn missing(what: &str, name: impl std::fmt::Display) -> MuxError {
    MuxError::CommandFailed(format!("can't find {what}: {name}"))
}

#[async_trait]
impl MuxDriver for FakeMux {
    async fn list_sessions(&self, _rt: &RuntimeDef) -> Result<Vec<String>, MuxError> {
        self.check()?;
        Ok(self.state.lock().sessions.iter().map(|s| s.name.clone()).collect())
    }

    async fn get_tree(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError> {
        self.get_tree_fresh(rt).await
    }

    async fn get_tree_fresh(&self, _rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state
            .sessions
            .iter()
            .map(|s| SessionTree {
                session: s.name.clone(),
                windows: s
                    .windows
                    .iter()
                    .map(|w| WindowEntry {
                        index: w.index,
                        name: w.name.clone(),
                        panes: w
                            .panes
                            .iter()
                            .map(|p| PaneEntry {
                                index: p.index,
                                command: "zsh".to_string(),
                                cwd: std::path::PathBuf::from("/"),
                                pid: 1,
                                active: p.index == 0,
                                pane_id: format!("%{}", p.index),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn new_session(
        &self,
        _rt: &RuntimeDef,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        if state.sessions.iter().any(|s| s.name == name) {
            return Err(MuxError::CommandFailed(format!("duplicate session: {name}")));
        }
        state.sessions.push(FakeSession {
            name: name.to_string(),
            windows: vec![FakeWindow {
                index: 0,
                name: opts.initial_window_name.unwrap_or_else(|| "zsh".to_string()),
                panes: vec![FakePane::default()],
            }],
        });
        Ok(())
    }

    async fn kill_session(&self, _rt: &RuntimeDef, name: &str) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.name != name);
        if state.sessions.len() == before {
            return Err(missing("session", name));
        }
        state.killed_sessions.push(name.to_string());
        Ok(())
    }

    async fn rename_session(&self, _rt: &RuntimeDef, from: &str, to: &str) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        match state.sessions.iter_mut().find(|s| s.name == from) {
            Some(s) => {
                s.name = to.to_string();
                Ok(())
            }
            None => Err(missing("session", from)),
        }
    }

    async fn new_window(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        name: Option<&str>,
        _cwd: Option<&Path>,
    ) -> Result<u32, MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let s = state
            .sessions
            .iter_mut()
            .find(|s| s.name == session)
            .ok_or_else(|| missing("session", session))?;
        let index = s.windows.iter().map(|w| w.index + 1).max().unwrap_or(0);
        s.windows.push(FakeWindow {
            index,
            name: name.unwrap_or("zsh").to_string(),
            panes: vec![FakePane::default()],
        });
        Ok(index)
    }

    async fn kill_window(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        window: u32,
    ) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let s = state
            .sessions
            .iter_mut()
            .find(|s| s.name == session)
            .ok_or_else(|| missing("session", session))?;
        let before = s.windows.len();
        s.windows.retain(|w| w.index != window);
        if s.windows.len() == before {
            return Err(missing("window", window));
        }
        Ok(())
    }

    async fn select_window(
        &self,
        _rt: &RuntimeDef,
        _session: &str,
        _window: u32,
    ) -> Result<(), MuxError> {
        self.check()
    }

    async fn rename_window(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        window: u32,
        name: &str,
    ) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let w = state
            .sessions
            .iter_mut()
            .find(|s| s.name == session)
            .and_then(|s| s.windows.iter_mut().find(|w| w.index == window))
            .ok_or_else(|| missing("window", window))?;
        w.name = name.to_string();
        Ok(())
    }

    async fn split_pane(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        window: u32,
        _pane: u32,
        _vertical: bool,
    ) -> Result<u32, MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let w = state
            .sessions
            .iter_mut()
            .find(|s| s.name == session)
            .and_then(|s| s.windows.iter_mut().find(|w| w.index == window))
            .ok_or_else(|| missing("window", window))?;
        let index = w.panes.iter().map(|p| p.index + 1).max().unwrap_or(0);
        w.panes.push(FakePane { index, ..FakePane::default() });
        Ok(index)
    }

    async fn kill_pane(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
    ) -> Result<(), MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        let w = state
            .sessions
            .iter_mut()
            .find(|s| s.name == session)
            .and_then(|s| s.windows.iter_mut().find(|w| w.index == window))
            .ok_or_else(|| missing("window", window))?;
        w.panes.retain(|p| p.index != pane);
        Ok(())
    }

    async fn select_pane(
        &self,
        _rt: &RuntimeDef,
        _session: &str,
        _window: u32,
        _pane: u32,
    ) -> Result<(), MuxError> {
        self.check()
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
        self.check()?;
        let mut state = self.state.lock();
        let exists = state
            .sessions
            .iter()
            .any(|s| s.name == session && s.windows.iter().any(|w| w.index == window));
        if !exists {
            return Err(missing("window", window));
        }
        state.sent.push(SentKeys {
            runtime: rt.id.to_string(),
            session: session.to_string(),
            window,
            pane,
            text: text.to_string(),
            enter: append_enter,
        });
        Ok(())
    }

    async fn capture(
        &self,
        _rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        _lines: u32,
    ) -> Result<String, MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        match find_pane(&mut state, session, window, pane) {
            Some(p) => Ok(p.output.clone()),
            None => Err(missing("pane", pane)),
        }
    }

    async fn read_pane_options(
        &self,
        _rt: &RuntimeDef,
        pane_ids: &[String],
    ) -> Result<HashMap<String, HashMap<String, String>>, MuxError> {
        self.check()?;
        let state = self.state.lock();
        let mut result = HashMap::new();
        for session in &state.sessions {
            for window in &session.windows {
                for pane in &window.panes {
                    let id = format!("%{}", pane.index);
                    if pane_ids.contains(&id) && !pane.options.is_empty() {
                        result.insert(id, pane.options.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    async fn set_automatic_rename(
        &self,
        _rt: &RuntimeDef,
        _session: &str,
        _window: u32,
        _enabled: bool,
    ) -> Result<(), MuxError> {
        self.check()
    }

    async fn exec(&self, _rt: &RuntimeDef, command: &str) -> Result<String, MuxError> {
        self.check()?;
        let mut state = self.state.lock();
        state.execs.push(command.to_string());
        Ok(state.exec_output.clone())
    }
}
