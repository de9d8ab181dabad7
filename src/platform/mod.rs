/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs::File;
use std::path::Path;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::UnixPlatform;

/// Uniform access to block size, fsync, xattr, permissions, effective
/// identity, and access probing (C1). No method panics; all return a
/// two-way result.
pub trait Platform {
    /// Optimal I/O block size for the filesystem housing `path`.
    /// Defaults to 4096 on failure.
    fn block_size(&self, path: &Path) -> u64;

    /// Flushes OS-level buffers for `file`. Retried internally up to 3
    /// times on transient failure; the final error (if any) is returned
    /// for the caller to log at WARNING — never treated as fatal.
    fn fsync(&self, file: &File) -> std::io::Result<()>;

    /// Names of extended attributes set on `path`.
    fn list_xattrs(&self, path: &Path) -> std::io::Result<Vec<String>>;

    /// Removes a single extended attribute from `path`.
    fn remove_xattr(&self, path: &Path, name: &str) -> std::io::Result<()>;

    /// Toggles a platform-specific blocking attribute (e.g. the
    /// read-only flag) on or off.
    fn toggle_file_attribute(&self, path: &Path, on: bool) -> std::io::Result<()>;

    /// Effective user id of the running process.
    fn effective_user(&self) -> u32;

    /// Effective group id of the running process.
    fn effective_group(&self) -> u32;

    /// Owning user id of `path`.
    fn owner_of(&self, path: &Path) -> std::io::Result<u32>;

    /// Owning group id of `path`.
    fn group_of(&self, path: &Path) -> std::io::Result<u32>;

    /// Probes whether the effective principal can read and/or write
    /// `path`, independent of what the cached mode bits say.
    fn check_access(&self, path: &Path, read: bool, write: bool) -> std::io::Result<bool>;

    /// Sets `path`'s mode bits directly (used by the permission gate's
    /// elevation path).
    fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()>;

    /// Current mode bits of `path`.
    fn mode_of(&self, path: &Path) -> std::io::Result<u32>;
}
