// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use mh_core::ProviderOverride;

use super::RuntimeRegistry;

fn registry() -> RuntimeRegistry {
    RuntimeRegistry::new("claude", Some("gemini".to_string()), &HashMap::new())
}

#[test]
fn explicit_provider_wins_over_lane_and_default() {
    let r = registry();
    assert_eq!(r.resolve_provider(Some("codex"), Some("gemini")).provider, "codex");
    assert_eq!(r.resolve_provider(None, Some("gemini")).provider, "gemini");
    assert_eq!(r.resolve_provider(None, None).provider, "claude");
}

#[test]
fn unknown_preferences_fall_through() {
    let r = registry();
    assert_eq!(r.resolve_provider(Some("nonexistent"), None).provider, "claude");
}

#[test]
fn fallback_applies_when_default_is_unknown() {
    let r = RuntimeRegistry::new("nonexistent", Some("gemini".to_string()), &HashMap::new());
    assert_eq!(r.resolve_provider(None, None).provider, "gemini");
}

#[test]
fn model_resolution_prefers_task_and_rewrites_aliases() {
    let r = registry();
    assert_eq!(r.resolve_model(Some("opus"), Some("sonnet")).as_deref(), Some("opus"));
    assert_eq!(r.resolve_model(None, Some("sonnet")).as_deref(), Some("sonnet"));
    assert_eq!(r.resolve_model(None, None), None);
    // Deprecated alias rewriting
    assert_eq!(r.resolve_model(Some("claude-3-5-sonnet"), None).as_deref(), Some("sonnet"));
    assert_eq!(r.resolve_model(None, Some("gemini-1.5-pro")).as_deref(), Some("gemini-2.5-pro"));
}

#[test]
fn interactive_launch_standard_model_flag() {
    let r = registry();
    let p = r.profile("claude").unwrap();
    assert_eq!(r.interactive_launch(p, Some("opus")), "claude --model opus");
    assert_eq!(r.interactive_launch(p, None), "claude");
}

#[test]
fn interactive_launch_short_model_flag() {
    let r = registry();
    let p = r.profile("gemini").unwrap();
    assert_eq!(r.interactive_launch(p, Some("gemini-2.5-pro")), "gemini -m gemini-2.5-pro");
}

#[test]
fn interactive_launch_strips_pipe_flags() {
    let mut overrides = HashMap::new();
    overrides.insert(
        "claude".to_string(),
        ProviderOverride {
            interactive_args: vec!["--print".into(), "--verbose".into()],
            ..ProviderOverride::default()
        },
    );
    let r = RuntimeRegistry::new("claude", None, &overrides);
    let p = r.profile("claude").unwrap();
    let launch = r.interactive_launch(p, None);
    assert!(!launch.contains("--print"), "pipe flag must be stripped: {launch}");
    assert!(launch.contains("--verbose"));
}

#[test]
fn launch_quotes_unsafe_values() {
    let mut overrides = HashMap::new();
    overrides.insert(
        "claude".to_string(),
        ProviderOverride {
            command: Some("/opt/my tools/claude".into()),
            ..ProviderOverride::default()
        },
    );
    let r = RuntimeRegistry::new("claude", None, &overrides);
    let p = r.profile("claude").unwrap();
    assert_eq!(r.interactive_launch(p, None), "'/opt/my tools/claude'");
}

#[test]
fn launch_prefixes_env_assignments() {
    let mut env = HashMap::new();
    env.insert("ANTHROPIC_BASE_URL".to_string(), "http://proxy:8080".to_string());
    let mut overrides = HashMap::new();
    overrides.insert("claude".to_string(), ProviderOverride { env, ..ProviderOverride::default() });
    let r = RuntimeRegistry::new("claude", None, &overrides);
    let p = r.profile("claude").unwrap();
    let launch = r.interactive_launch(p, None);
    assert!(launch.starts_with("ANTHROPIC_BASE_URL='http://proxy:8080' claude"), "{launch}");
}

#[test]
fn resume_targets_specific_session_when_supported() {
    let r = registry();
    let p = r.profile("claude").unwrap();
    assert_eq!(r.resume(p, Some("sess-42")), "claude --resume sess-42");
    assert_eq!(r.resume(p, None), "claude --continue");
}

#[test]
fn resume_falls_back_to_generic_continue() {
    let r = registry();
    // codex has no resume_flag; session id is ignored
    let p = r.profile("codex").unwrap();
    assert_eq!(r.resume(p, Some("sess-42")), "codex resume --last");
}

#[test]
fn detect_provider_by_basename_and_alias() {
    let r = registry();
    assert_eq!(r.detect_provider("claude --continue").map(|p| p.provider.as_str()), Some("claude"));
    assert_eq!(
        r.detect_provider("/usr/local/bin/gemini -m pro").map(|p| p.provider.as_str()),
        Some("gemini")
    );
    assert_eq!(r.detect_provider("cc").map(|p| p.provider.as_str()), Some("claude"));
    assert_eq!(r.detect_provider("vim notes.md"), None);
    assert_eq!(r.detect_provider(""), None);
}

#[test]
fn overrides_replace_command_and_warmup() {
    let mut overrides = HashMap::new();
    overrides.insert(
        "aider".to_string(),
        ProviderOverride {
            command: Some("/opt/aider/bin/aider".into()),
            warmup_ms: Some(5_000),
            ..ProviderOverride::default()
        },
    );
    let r = RuntimeRegistry::new("claude", None, &overrides);
    let p = r.profile("aider").unwrap();
    assert_eq!(p.command, "/opt/aider/bin/aider");
    assert_eq!(p.warmup_ms, 5_000);
}
