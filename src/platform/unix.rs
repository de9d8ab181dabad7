/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs::File;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::warn;

use super::Platform;

const FSYNC_RETRIES: u32 = 3;
const DEFAULT_BLOCK_SIZE: u64 = 4096;

/// Unix implementation of the platform facade (C1), backed by
/// `std::os::unix`, `libc`, and the `xattr` crate, with a shell-out to
/// the `xattr`/`attr` binaries as documented fallback (spec.md §9 Design
/// Notes) when the native call isn't supported by the filesystem.
pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        UnixPlatform
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for UnixPlatform {
    fn block_size(&self, path: &Path) -> u64 {
        std::fs::metadata(path)
            .map(|m| {
                let size = m.blksize();
                if size == 0 {
                    DEFAULT_BLOCK_SIZE
                } else {
                    size
                }
            })
            .unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    fn fsync(&self, file: &File) -> io::Result<()> {
        let mut last_err = None;
        for attempt in 1..=FSYNC_RETRIES {
            match file.sync_all() {
                Ok(()) => return Ok(()),
                Err(err) => {
                    last_err = Some(err);
                    if attempt < FSYNC_RETRIES {
                        thread::sleep(Duration::from_millis(50));
                    }
                }
            }
        }
        let err = last_err.expect("loop ran at least once");
        warn!("[WARNING] fsync failed after {FSYNC_RETRIES} attempts: {err}");
        Err(err)
    }

    fn list_xattrs(&self, path: &Path) -> io::Result<Vec<String>> {
        match xattr::list(path) {
            Ok(names) => Ok(names
                .map(|name| name.to_string_lossy().into_owned())
                .collect()),
            Err(err) if err.kind() == io::ErrorKind::Unsupported => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn remove_xattr(&self, path: &Path, name: &str) -> io::Result<()> {
        match xattr::remove(path, name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::Unsupported => {
                shell_out_remove_xattr(path, name)
            }
            Err(err) => Err(err),
        }
    }

    fn toggle_file_attribute(&self, path: &Path, on: bool) -> io::Result<()> {
        let metadata = std::fs::metadata(path)?;
        let mut perms = metadata.permissions();
        perms.set_readonly(on);
        std::fs::set_permissions(path, perms)
    }

    fn effective_user(&self) -> u32 {
        unsafe { libc::geteuid() }
    }

    fn effective_group(&self) -> u32 {
        unsafe { libc::getegid() }
    }

    fn owner_of(&self, path: &Path) -> io::Result<u32> {
        Ok(std::fs::metadata(path)?.uid())
    }

    fn group_of(&self, path: &Path) -> io::Result<u32> {
        Ok(std::fs::metadata(path)?.gid())
    }

    fn check_access(&self, path: &Path, read: bool, write: bool) -> io::Result<bool> {
        let mut mode = 0;
        if read {
            mode |= libc::R_OK;
        }
        if write {
            mode |= libc::W_OK;
        }
        if mode == 0 {
            mode = libc::F_OK;
        }
        let c_path = std::ffi::CString::new(path.as_os_str().as_encoded_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let result = unsafe { libc::access(c_path.as_ptr(), mode) };
        Ok(result == 0)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    fn mode_of(&self, path: &Path) -> io::Result<u32> {
        Ok(std::fs::metadata(path)?.permissions().mode())
    }
}

/// Best-effort fallback when the native xattr syscall isn't supported by
/// the underlying filesystem: shell out to the `xattr` binary (macOS) and
/// fall back to `attr` (Linux), discarding stderr either way, as spec.md
/// §9's Design Notes document.
fn shell_out_remove_xattr(path: &Path, name: &str) -> io::Result<()> {
    let xattr_status = Command::new("xattr")
        .arg("-d")
        .arg(name)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if matches!(xattr_status, Ok(status) if status.success()) {
        return Ok(());
    }
    let attr_status = Command::new("attr")
        .arg("-r")
        .arg(name)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match attr_status {
        Ok(status) if status.success() => Ok(()),
        _ => Ok(()), // best-effort; scrub failure is non-fatal per spec.md §7
    }
}
