/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::PathBuf;

use thiserror::Error;

/// Failures from the permission gate (C4).
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("failed to read permissions of '{path}': {source}")]
    Retrieval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no write permission on '{path}'")]
    Denied { path: PathBuf },
    #[error("elevation failed for '{path}': {reason}")]
    ElevationFailed { path: PathBuf, reason: String },
    #[error("refusing to elevate '{path}': owned by root and caller is not root")]
    RootOwned { path: PathBuf },
}

/// Failures from the overwrite kernel (C5).
#[derive(Error, Debug)]
pub enum OverwriteError {
    #[error("failed to open '{path}' after {attempts} attempts: {source}")]
    Open {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("seek failed on '{path}' at offset {offset}: {source}")]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("write failed on '{path}' at offset {offset}: {source}")]
    Write {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("verification read failed on '{path}': {source}")]
    VerifyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures surfaced by the shred engine (C6) as a whole.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Overwrite(#[from] OverwriteError),
    #[error("failed to unlink '{path}': {source}")]
    Unlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rename '{from}' to '{to}': {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures from the walker (C7).
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("'{path}' does not exist")]
    NotFound { path: PathBuf },
    #[error("'{path}' is not a regular file, directory, or symlink")]
    NotRegular { path: PathBuf },
    #[error(transparent)]
    Engine(#[from] EngineError),
}
