// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch profiles for the supported AI CLIs.
//!
//! Each provider gets one [`LaunchProfile`] describing how to spawn it
//! interactively, how to resume a prior session, and how to pass a
//! model. The shapes are closed enums — adding a provider means adding
//! a profile, not another if-ladder.

mod metadata;
mod status;

pub use metadata::{effective_status, read_pane_metadata, CcState, PaneMetadata};
pub use status::{detect_status, PaneStatus};

use std::collections::HashMap;
use std::path::PathBuf;

use mh_core::ProviderOverride;

use crate::quote::sh_quote;

/// How a model is passed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFlag {
    /// `--model X`
    Standard,
    /// `-m X`
    Short,
    /// The model is a positional argument.
    Positional,
    /// The provider configures its model out-of-band.
    None,
}

/// How the provider accepts a one-shot (non-interactive) prompt.
/// Interactive launches strip the corresponding flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnShape {
    /// Prompt is piped to stdin together with a `--print`-style flag.
    PrintStdin,
    /// Prompt passed via a message argument flag.
    MessageArg,
    /// Prompt passed to a chat subcommand.
    SubcommandChat,
    /// Prompt is the positional argument.
    PositionalPrompt,
}

/// Launch description for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchProfile {
    pub provider: String,
    pub command: String,
    /// One-shot invocation (kept for completeness; the daemon launches
    /// interactively and strips these flags).
    pub pipe_command: Option<String>,
    pub interactive_args: Vec<String>,
    pub resume_args: Vec<String>,
    /// Flag that targets a specific prior session, when supported.
    pub resume_flag: Option<String>,
    pub env: Vec<(String, String)>,
    pub default_working_directory: Option<PathBuf>,
    pub model_flag: ModelFlag,
    pub spawn_shape: SpawnShape,
    /// Milliseconds between launching the CLI and sending the prompt.
    pub warmup_ms: u64,
    pub aliases: Vec<String>,
}

impl LaunchProfile {
    fn new(provider: &str, command: &str) -> Self {
        Self {
            provider: provider.to_string(),
            command: command.to_string(),
            pipe_command: None,
            interactive_args: Vec::new(),
            resume_args: Vec::new(),
            resume_flag: None,
            env: Vec::new(),
            default_working_directory: None,
            model_flag: ModelFlag::Standard,
            spawn_shape: SpawnShape::PrintStdin,
            warmup_ms: 1_500,
            aliases: Vec::new(),
        }
    }
}

/// Flags that force one-shot mode and must never reach an interactive pane.
const PIPE_FLAGS: &[&str] = &["--print", "-p", "--pipe", "--no-interactive", "--output-format"];

/// Deprecated model aliases rewritten to their current names.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-3-5-sonnet", "sonnet"),
    ("claude-3-opus", "opus"),
    ("claude-sonnet-4", "sonnet"),
    ("gemini-1.5-pro", "gemini-2.5-pro"),
    ("gemini-1.5-flash", "gemini-2.5-flash"),
    ("o4-mini", "gpt-5-codex"),
];

/// Catalog of provider launch profiles.
pub struct RuntimeRegistry {
    profiles: Vec<LaunchProfile>,
    default_provider: String,
    fallback_provider: Option<String>,
}

impl RuntimeRegistry {
    /// Built-in profiles overlaid with config-file overrides.
    pub fn new(
        default_provider: impl Into<String>,
        fallback_provider: Option<String>,
        overrides: &HashMap<String, ProviderOverride>,
    ) -> Self {
        let mut profiles = built_in_profiles();
        for profile in &mut profiles {
            if let Some(over) = overrides.get(&profile.provider) {
                if let Some(command) = &over.command {
                    profile.command = command.clone();
                }
                if !over.interactive_args.is_empty() {
                    profile.interactive_args = over.interactive_args.clone();
                }
                for (k, v) in &over.env {
                    profile.env.push((k.clone(), v.clone()));
                }
                if let Some(dir) = &over.default_working_directory {
                    profile.default_working_directory = Some(dir.clone());
                }
                if let Some(warmup) = over.warmup_ms {
                    profile.warmup_ms = warmup;
                }
            }
        }
        Self {
            profiles,
            default_provider: default_provider.into(),
            fallback_provider,
        }
    }

    pub fn profile(&self, provider: &str) -> Option<&LaunchProfile> {
        self.profiles.iter().find(|p| p.provider == provider)
    }

    pub fn providers(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.provider.as_str()).collect()
    }

    /// Resolve the provider: explicit override wins over the lane
    /// preference over the configured default (then fallback, if the
    /// default has no profile).
    pub fn resolve_provider(&self, explicit: Option<&str>, lane: Option<&str>) -> &LaunchProfile {
        for candidate in [explicit, lane, Some(self.default_provider.as_str())]
            .into_iter()
            .flatten()
        {
            if let Some(profile) = self.profile(candidate) {
                return profile;
            }
        }
        if let Some(fallback) = self.fallback_provider.as_deref() {
            if let Some(profile) = self.profile(fallback) {
                return profile;
            }
        }
        // Registry is never empty: built-ins are compiled in.
        &self.profiles[0]
    }

    /// Resolve the model: the task's choice wins over the lane's.
    /// Deprecated aliases are rewritten through a fixed mapping.
    pub fn resolve_model(&self, task_model: Option<&str>, lane_model: Option<&str>) -> Option<String> {
        let model = task_model.or(lane_model)?;
        let rewritten = MODEL_ALIASES
            .iter()
            .find(|(old, _)| *old == model)
            .map(|(_, new)| *new)
            .unwrap_or(model);
        Some(rewritten.to_string())
    }

    /// Shell command launching the provider interactively in a pane,
    /// stripped of any one-shot/pipe flags.
    pub fn interactive_launch(&self, profile: &LaunchProfile, model: Option<&str>) -> String {
        let mut parts: Vec<String> = vec![profile.command.clone()];
        for arg in &profile.interactive_args {
            if PIPE_FLAGS.contains(&arg.as_str()) {
                continue;
            }
            parts.push(arg.clone());
        }
        if let Some(model) = model {
            match profile.model_flag {
                ModelFlag::Standard => {
                    parts.push("--model".to_string());
                    parts.push(model.to_string());
                }
                ModelFlag::Short => {
                    parts.push("-m".to_string());
                    parts.push(model.to_string());
                }
                ModelFlag::Positional => parts.push(model.to_string()),
                ModelFlag::None => {}
            }
        }
        join_command(&parts, &profile.env)
    }

    /// Shell command resuming a previous conversation.
    ///
    /// With a `resume_flag` and a concrete session id, targets that
    /// session; otherwise falls back to the provider's generic
    /// "continue" form.
    pub fn resume(&self, profile: &LaunchProfile, session_id: Option<&str>) -> String {
        let mut parts: Vec<String> = vec![profile.command.clone()];
        match (profile.resume_flag.as_deref(), session_id) {
            (Some(flag), Some(session)) => {
                parts.push(flag.to_string());
                parts.push(session.to_string());
            }
            _ => parts.extend(profile.resume_args.iter().cloned()),
        }
        join_command(&parts, &profile.env)
    }

    /// Identify the provider from a pane's running command line:
    /// basename match against configured commands, then the alias list.
    pub fn detect_provider(&self, command_line: &str) -> Option<&LaunchProfile> {
        let first = command_line.split_whitespace().next()?;
        let base = first.rsplit('/').next().unwrap_or(first);
        self.profiles.iter().find(|p| {
            let cmd_base = p.command.rsplit('/').next().unwrap_or(&p.command);
            cmd_base == base || p.aliases.iter().any(|a| a == base)
        })
    }
}

fn join_command(parts: &[String], env: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push('=');
        out.push_str(&sh_quote(value));
        out.push(' ');
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&sh_quote(part));
    }
    out
}

fn built_in_profiles() -> Vec<LaunchProfile> {
    let mut claude = LaunchProfile::new("claude", "claude");
    claude.pipe_command = Some("claude --print".to_string());
    claude.resume_args = vec!["--continue".to_string()];
    claude.resume_flag = Some("--resume".to_string());
    claude.model_flag = ModelFlag::Standard;
    claude.spawn_shape = SpawnShape::PrintStdin;
    claude.aliases = vec!["claude-code".to_string(), "cc".to_string()];

    let mut gemini = LaunchProfile::new("gemini", "gemini");
    gemini.resume_args = vec!["--resume".to_string()];
    gemini.model_flag = ModelFlag::Short;
    gemini.spawn_shape = SpawnShape::PrintStdin;

    let mut codex = LaunchProfile::new("codex", "codex");
    codex.resume_args = vec!["resume".to_string(), "--last".to_string()];
    codex.model_flag = ModelFlag::Standard;
    codex.spawn_shape = SpawnShape::PositionalPrompt;

    let mut opencode = LaunchProfile::new("opencode", "opencode");
    opencode.resume_args = vec!["--continue".to_string()];
    opencode.model_flag = ModelFlag::Short;
    opencode.spawn_shape = SpawnShape::MessageArg;

    let mut aider = LaunchProfile::new("aider", "aider");
    aider.resume_args = vec!["--restore-chat-history".to_string()];
    aider.model_flag = ModelFlag::Standard;
    aider.spawn_shape = SpawnShape::MessageArg;
    aider.warmup_ms = 2_500;

    vec![claude, gemini, codex, opencode, aider]
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
