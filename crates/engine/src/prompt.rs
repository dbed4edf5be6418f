// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt composition for launched tasks.
//!
//! Pure string assembly, unit-tested in isolation. The launcher decides
//! the shape (single task, task box, bundle) by what it loads from the
//! store; this module only formats.

use mh_core::{SwimLane, Task};

use crate::sentinel;

/// Everything the composer needs, borrowed from the launcher.
pub struct PromptCtx<'a> {
    pub task: &'a Task,
    pub lane: Option<&'a SwimLane>,
    /// Children when the task is a task box.
    pub subtasks: &'a [Task],
    /// Sibling parallel tasks launched alongside (fan-out awareness).
    pub peers: &'a [Task],
    pub persona: Option<&'a str>,
    pub memory: Option<&'a str>,
    pub extra_instructions: Option<&'a str>,
    /// Ask the user before implementing, instead of diving in.
    pub ask_for_context: bool,
    /// Present when the task runs with auto-close.
    pub sentinel_token: Option<&'a str>,
}

impl<'a> PromptCtx<'a> {
    pub fn single(task: &'a Task, lane: Option<&'a SwimLane>) -> Self {
        Self {
            task,
            lane,
            subtasks: &[],
            peers: &[],
            persona: None,
            memory: None,
            extra_instructions: None,
            ask_for_context: false,
            sentinel_token: None,
        }
    }
}

/// Compose the full prompt for a launch.
pub fn compose(ctx: &PromptCtx<'_>) -> String {
    let mut out = String::new();

    if ctx.subtasks.is_empty() {
        out.push_str("Implement the following task.\n\n");
        push_identity(&mut out, ctx.task);
    } else {
        out.push_str(&format!(
            "Implement the following {} sub-tasks, in order.\n\n",
            ctx.subtasks.len()
        ));
        out.push_str(&format!("Parent: {}\n", ctx.task.description));
        for (i, sub) in ctx.subtasks.iter().enumerate() {
            out.push_str(&format!("\n--- Task {} ---\n", i + 1));
            push_identity(&mut out, sub);
        }
        out.push_str(
            "\nCoordinate the sub-tasks yourself: finish one before starting the next, and keep \
             shared files consistent across them.\n",
        );
    }

    if let Some(lane) = ctx.lane {
        out.push('\n');
        out.push_str(&format!("Project: {}\n", lane.name));
        out.push_str(&format!("Working Directory: {}\n", lane.working_dir.display()));
        if let Some(instructions) = &lane.context_instructions {
            out.push_str(&format!("Project Instructions: {instructions}\n"));
        }
    }

    if let Some(persona) = ctx.persona {
        out.push('\n');
        out.push_str(persona);
        out.push('\n');
    }

    if let Some(memory) = ctx.memory {
        out.push('\n');
        out.push_str("Long-term memory to load before starting:\n");
        out.push_str(memory);
        out.push('\n');
    }

    if !ctx.peers.is_empty() {
        out.push('\n');
        out.push_str("Parallel Tasks (for awareness):\n");
        for peer in ctx.peers {
            out.push_str(&format!("- {} — {}\n", peer.id, peer.description));
        }
        out.push_str(
            "Other agents work on these concurrently. Stay inside your task's scope and avoid \
             editing files they are likely to touch.\n",
        );
    }

    // Tails, in fixed order
    if let Some(extra) = ctx.extra_instructions {
        out.push('\n');
        out.push_str(extra);
        out.push('\n');
    }

    out.push('\n');
    if ctx.ask_for_context {
        out.push_str("Before writing any code, ask the user for the context you are missing.\n");
    } else {
        out.push_str("Implement immediately; do not wait for further confirmation.\n");
    }

    if let Some(token) = ctx.sentinel_token {
        out.push('\n');
        out.push_str(&sentinel::instruction(token));
        out.push('\n');
    }

    out
}

fn push_identity(out: &mut String, task: &Task) {
    out.push_str(&format!("Task ID: {}\n", task.id));
    out.push_str(&format!("Title: {}\n", task.description));
    if let Some(details) = &task.details {
        out.push_str(&format!("Details: {details}\n"));
    }
    if let Some(role) = task.target_role {
        out.push_str(&format!("Role: {}\n", role.as_str()));
    }
    out.push_str(&format!("Priority: {}\n", task.priority));
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
