// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree isolation for tasks.
//!
//! Worktrees are created and removed through [`MuxDriver::exec`], so
//! they work identically on local and SSH runtimes. Command
//! construction is pure and unit-tested; execution rides the driver's
//! quoting and timeout machinery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mh_core::RuntimeDef;

use crate::mux::{MuxDriver, MuxError};
use crate::quote::sh_quote;

/// Budget for worktree creation (fresh checkouts can be slow).
pub const WORKTREE_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory under the lane's working dir holding task worktrees.
const WORKTREE_SUBDIR: &str = ".mh-worktrees";

/// Branch name derived from a task's short id.
pub fn branch_name(task_short_id: &str) -> String {
    format!("task/{task_short_id}")
}

/// Worktree path for a task, rooted at the lane's working dir.
pub fn worktree_path(working_dir: &Path, task_short_id: &str) -> PathBuf {
    working_dir.join(WORKTREE_SUBDIR).join(task_short_id)
}

/// Shell command adding the worktree on a new branch.
pub fn add_command(working_dir: &Path, path: &Path, branch: &str) -> String {
    format!(
        "git -C {} worktree add -b {} {}",
        sh_quote(&working_dir.display().to_string()),
        sh_quote(branch),
        sh_quote(&path.display().to_string()),
    )
}

/// Shell command removing the worktree (and pruning bookkeeping).
pub fn remove_command(working_dir: &Path, path: &Path) -> String {
    format!(
        "git -C {dir} worktree remove --force {path} ; git -C {dir} worktree prune",
        dir = sh_quote(&working_dir.display().to_string()),
        path = sh_quote(&path.display().to_string()),
    )
}

/// Create a worktree for a task; returns the worktree path.
pub async fn create(
    mux: &dyn MuxDriver,
    rt: &RuntimeDef,
    working_dir: &Path,
    task_short_id: &str,
) -> Result<PathBuf, MuxError> {
    let path = worktree_path(working_dir, task_short_id);
    let branch = branch_name(task_short_id);
    let command = add_command(working_dir, &path, &branch);
    tokio::time::timeout(WORKTREE_TIMEOUT, mux.exec(rt, &command))
        .await
        .map_err(|_| MuxError::Timeout("git worktree add did not finish in 30s".into()))??;
    Ok(path)
}

/// Remove a task's worktree. Failures are reported but callers treat
/// them as non-fatal — the window teardown must proceed regardless.
pub async fn remove(
    mux: &dyn MuxDriver,
    rt: &RuntimeDef,
    working_dir: &Path,
    path: &Path,
) -> Result<(), MuxError> {
    let command = remove_command(working_dir, path);
    tokio::time::timeout(WORKTREE_TIMEOUT, mux.exec(rt, &command))
        .await
        .map_err(|_| MuxError::Timeout("git worktree remove did not finish in 30s".into()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_and_path_derive_from_short_id() {
        assert_eq!(branch_name("tsk-0123456789a"), "task/tsk-0123456789a");
        assert_eq!(
            worktree_path(Path::new("/tmp/p"), "tsk-x"),
            PathBuf::from("/tmp/p/.mh-worktrees/tsk-x")
        );
    }

    #[test]
    fn add_command_quotes_paths() {
        let cmd = add_command(Path::new("/tmp/my proj"), Path::new("/tmp/my proj/.mh-worktrees/t"), "task/t");
        assert_eq!(
            cmd,
            "git -C '/tmp/my proj' worktree add -b task/t '/tmp/my proj/.mh-worktrees/t'"
        );
    }

    #[test]
    fn remove_command_forces_and_prunes() {
        let cmd = remove_command(Path::new("/p"), Path::new("/p/.mh-worktrees/t"));
        assert!(cmd.contains("worktree remove --force"));
        assert!(cmd.contains("worktree prune"));
    }
}
