// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, supervised background workers, graceful
//! shutdown, exit codes.

mod startup;
mod workers;

pub use startup::{startup, StartupResult};
pub(crate) use workers::spawn_supervised;

use std::path::PathBuf;

/// Exit codes defined by the daemon's contract.
pub mod exit_code {
    pub const CLEAN: i32 = 0;
    pub const CONFIG: i32 = 1;
    pub const SOCKET_BIND: i32 = 2;
    pub const STORE_INIT: i32 = 3;
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("no home directory and no MUXHERD_DATA_DIR set")]
    NoDataDir,

    #[error("configuration error: {0}")]
    Config(#[from] mh_core::ConfigError),

    #[error("config file unreadable: {0}")]
    ConfigIo(std::io::Error),

    #[error("another daemon already holds {0}")]
    LockHeld(PathBuf),

    #[error("socket bind failed: {0}")]
    Bind(std::io::Error),

    #[error("store initialization failed: {0}")]
    Store(#[from] mh_storage::StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LifecycleError {
    /// Map a startup failure to the documented exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            LifecycleError::NoDataDir
            | LifecycleError::Config(_)
            | LifecycleError::ConfigIo(_)
            | LifecycleError::LockHeld(_) => exit_code::CONFIG,
            LifecycleError::Bind(_) => exit_code::SOCKET_BIND,
            LifecycleError::Store(_) => exit_code::STORE_INIT,
            LifecycleError::Io(_) => exit_code::CONFIG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_contract() {
        assert_eq!(LifecycleError::NoDataDir.exit_code(), 1);
        assert_eq!(
            LifecycleError::Bind(std::io::Error::other("x")).exit_code(),
            2
        );
        let store_err = mh_storage::StoreError::Corrupt("x".into());
        assert_eq!(LifecycleError::Store(store_err).exit_code(), 3);
    }
}
