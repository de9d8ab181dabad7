/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;

use crate::error::PermissionError;
use crate::platform::Platform;

const MODE_RW_ALL: u32 = 0o666;
const MODE_RWX_ALL: u32 = 0o777;
const EXEC_BITS: u32 = 0o111;

/// Per-file read/write determination (part of spec.md §3's record F).
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePermissions {
    pub read: bool,
    pub write: bool,
    pub retrieval_failed: bool,
}

/// Determines whether the effective principal may read/write `path`,
/// optionally elevating permissions when `force` is set (C4).
pub fn gate(
    platform: &dyn Platform,
    path: &Path,
    force: bool,
) -> Result<FilePermissions, PermissionError> {
    let mode = match platform.mode_of(path) {
        Ok(mode) => mode,
        Err(_) => {
            return Ok(FilePermissions {
                retrieval_failed: true,
                ..Default::default()
            })
        }
    };
    let owner_uid = match platform.owner_of(path) {
        Ok(uid) => uid,
        Err(_) => {
            return Ok(FilePermissions {
                retrieval_failed: true,
                ..Default::default()
            })
        }
    };
    let owner_gid = match platform.group_of(path) {
        Ok(gid) => gid,
        Err(_) => {
            return Ok(FilePermissions {
                retrieval_failed: true,
                ..Default::default()
            })
        }
    };

    let euid = platform.effective_user();
    let egid = platform.effective_group();

    let (mut read, mut write) = if euid == 0 {
        (true, true)
    } else {
        bits_for_principal(mode, owner_uid, owner_gid, euid, egid)
    };

    if (!read || !write) && force {
        if owner_uid == 0 && euid != 0 {
            return Err(PermissionError::RootOwned {
                path: path.to_path_buf(),
            });
        }
        elevate(platform, path, mode)?;
        read = platform.check_access(path, true, false).unwrap_or(read);
        write = platform.check_access(path, false, true).unwrap_or(write);
    }

    Ok(FilePermissions {
        read,
        write,
        retrieval_failed: false,
    })
}

fn bits_for_principal(
    mode: u32,
    owner_uid: u32,
    owner_gid: u32,
    euid: u32,
    egid: u32,
) -> (bool, bool) {
    let (read_bit, write_bit) = if euid == owner_uid {
        (0o400, 0o200)
    } else if egid == owner_gid {
        (0o040, 0o020)
    } else {
        (0o004, 0o002)
    };
    (mode & read_bit != 0, mode & write_bit != 0)
}

fn elevate(platform: &dyn Platform, path: &Path, mode: u32) -> Result<(), PermissionError> {
    let map_err = |reason: std::io::Error| PermissionError::ElevationFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    platform
        .toggle_file_attribute(path, false)
        .map_err(map_err)?;

    let target_mode = if mode & EXEC_BITS != 0 {
        MODE_RWX_ALL
    } else {
        MODE_RW_ALL
    };
    platform.set_mode(path, target_mode).map_err(map_err)?;

    if let Ok(names) = platform.list_xattrs(path) {
        for name in names {
            // best-effort: a single attribute failing to clear does not
            // abort elevation, mirrors spec.md §7's non-fatal scrub policy
            let _ = platform.remove_xattr(path, &name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_read_write_bits() {
        let (r, w) = bits_for_principal(0o640, 1000, 1000, 1000, 1000);
        assert!(r);
        assert!(w);
    }

    #[test]
    fn other_bits_when_not_owner_or_group() {
        let (r, w) = bits_for_principal(0o644, 1000, 1000, 2000, 2000);
        assert!(r);
        assert!(!w);
    }

    #[test]
    fn group_bits_when_group_matches() {
        let (r, w) = bits_for_principal(0o460, 1000, 50, 2000, 50);
        assert!(r);
        assert!(w);
    }
}
