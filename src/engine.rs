/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::config::{Config, ErrorReporter, RenameGuard};
use crate::error::{EngineError, PermissionError};
use crate::logging::{self, Level};
use crate::overwrite;
use crate::permissions;
use crate::platform::Platform;
use crate::random::{random_alphanumeric_name, RandomSource};

const TEMP_NAME_LEN: usize = 32;
const RENAME_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Drives a single file through the per-file state machine of spec.md
/// §4.6 (C6). Every terminal state is absorbed here: a failure on one
/// file is logged and folded into `reporter`'s fatal flag, never
/// propagated to the caller, so the walker never aborts on a single
/// file's error.
pub fn shred_file(
    platform: &dyn Platform,
    config: &Config,
    reporter: &ErrorReporter,
    rename_guard: &RenameGuard,
    random: &RandomSource,
    path: &Path,
) {
    if let Err(err) = run(platform, config, rename_guard, random, path) {
        logging::log(config, Level::Error, &err);
        reporter.mark_fatal();
    }
}

fn run(
    platform: &dyn Platform,
    config: &Config,
    rename_guard: &RenameGuard,
    random: &RandomSource,
    path: &Path,
) -> Result<(), EngineError> {
    if let Some(outcome) = check_symlink(config, path)? {
        return Ok(outcome);
    }

    if config.dry_run {
        logging::log(
            config,
            Level::DryRun,
            format!("Simulating shredding file '{}'", path.display()),
        );
        return Ok(());
    }

    let perms = permissions::gate(platform, path, config.force)?;
    if perms.retrieval_failed {
        return Err(EngineError::Permission(PermissionError::Retrieval {
            path: path.to_path_buf(),
            source: IoError::new(ErrorKind::Other, "failed to read permissions or ownership"),
        }));
    }
    if !perms.write {
        return Err(EngineError::Permission(PermissionError::Denied {
            path: path.to_path_buf(),
        }));
    }

    let metadata = fs::metadata(path).map_err(|source| {
        EngineError::Permission(PermissionError::Retrieval {
            path: path.to_path_buf(),
            source,
        })
    })?;
    let size = metadata.len();

    if size == 0 {
        return handle_empty_file(config, path);
    }

    let mut file = overwrite::open_with_retries(path)?;
    let block_size = platform.block_size(path);

    let mut last_written = Vec::new();
    let mut verification_failed = false;
    for pass_index in 1..=config.passes {
        match overwrite::run_pass(
            &mut file,
            path,
            size,
            block_size,
            config.secure,
            config.verify,
            pass_index,
            random,
        ) {
            Ok(written) => last_written = written,
            Err(err) => {
                logging::log(config, Level::Error, &err);
                verification_failed = true;
                break;
            }
        }

        if config.verify {
            match overwrite::verify_pass(&mut file, path, &last_written, block_size) {
                Ok(true) => {}
                Ok(false) => {
                    logging::log(
                        config,
                        Level::Error,
                        format!(
                            "verification mismatch on '{}' (pass {pass_index})",
                            path.display()
                        ),
                    );
                    verification_failed = true;
                }
                Err(err) => {
                    logging::log(config, Level::Error, &err);
                    verification_failed = true;
                    break;
                }
            }
        }
    }

    if let Err(err) = platform.fsync(&file) {
        logging::log(
            config,
            Level::Warning,
            format!("fsync failed on '{}': {err}", path.display()),
        );
    }
    drop(file);

    finish(platform, config, rename_guard, path, verification_failed)
}

/// Returns `Some(())` when the caller should return early (symlink
/// skipped or dangling), `None` to continue the state machine.
fn check_symlink(config: &Config, path: &Path) -> Result<Option<()>, EngineError> {
    let is_symlink = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return Ok(None);
    }
    if !config.follow_symlinks {
        logging::log(
            config,
            Level::Warning,
            format!("'{}' is a symlink, skipping (use -e to follow)", path.display()),
        );
        return Ok(Some(()));
    }
    if fs::metadata(path).is_err() {
        logging::log(
            config,
            Level::Warning,
            format!("'{}' is a dangling symlink, skipping", path.display()),
        );
        return Ok(Some(()));
    }
    Ok(None)
}

fn handle_empty_file(config: &Config, path: &Path) -> Result<(), EngineError> {
    if config.keep {
        logging::log(
            config,
            Level::Warning,
            format!("'{}' is empty, nothing to overwrite", path.display()),
        );
        return Ok(());
    }
    fs::remove_file(path).map_err(|source| EngineError::Unlink {
        path: path.to_path_buf(),
        source,
    })?;
    logging::log(
        config,
        Level::Info,
        format!("'{}' is empty, deleted", path.display()),
    );
    Ok(())
}

/// [MaybeScrubAndUnlink] from spec.md §4.6: skip unlink when keeping
/// the file or when verification failed; otherwise revoke
/// permissions, rename to a randomly-named temp path, scrub extended
/// attributes, and unlink under the rename mutex.
fn finish(
    platform: &dyn Platform,
    config: &Config,
    rename_guard: &RenameGuard,
    path: &Path,
    verification_failed: bool,
) -> Result<(), EngineError> {
    if config.keep {
        logging::log(
            config,
            Level::Info,
            format!("'{}' overwritten without deletion", path.display()),
        );
        return Ok(());
    }
    if verification_failed {
        logging::log(
            config,
            Level::Warning,
            format!("verification failed for '{}', skipping delete", path.display()),
        );
        return Ok(());
    }

    let _guard = rename_guard.acquire();

    if let Err(err) = platform.set_mode(path, 0) {
        logging::log(
            config,
            Level::Warning,
            format!("failed to revoke permissions on '{}': {err}", path.display()),
        );
    }

    let temp_path = std::env::temp_dir().join(random_alphanumeric_name(TEMP_NAME_LEN));
    fs::rename(path, &temp_path).map_err(|source| EngineError::Rename {
        from: path.to_path_buf(),
        to: temp_path.clone(),
        source,
    })?;

    thread::sleep(RENAME_SETTLE_DELAY);

    if let Ok(names) = platform.list_xattrs(&temp_path) {
        for name in names {
            if let Err(err) = platform.remove_xattr(&temp_path, &name) {
                logging::log(
                    config,
                    Level::Warning,
                    format!("failed to scrub attribute '{name}' from '{}': {err}", temp_path.display()),
                );
            }
        }
    }

    thread::sleep(RENAME_SETTLE_DELAY);

    if let Err(source) = fs::remove_file(&temp_path) {
        let _ = fs::rename(&temp_path, path);
        return Err(EngineError::Unlink {
            path: temp_path,
            source,
        });
    }

    logging::log(
        config,
        Level::Info,
        format!("'{}' shredded, verified, and deleted", path.display()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnixPlatform;
    use tempfile::tempdir;

    fn base_config() -> Config {
        Config {
            passes: 1,
            recursive: false,
            keep: false,
            verbose: false,
            follow_symlinks: false,
            secure: false,
            dry_run: false,
            verify: true,
            force: false,
            internal: false,
        }
    }

    #[test]
    fn empty_file_is_deleted_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, []).unwrap();

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        shred_file(&platform, &config, &reporter, &rename_guard, &random, &path);

        assert!(!path.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn keep_leaves_file_present_after_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.bin");
        fs::write(&path, vec![0x41u8; 64]).unwrap();

        let platform = UnixPlatform::new();
        let mut config = base_config();
        config.keep = true;
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        shred_file(&platform, &config, &reporter, &rename_guard, &random, &path);

        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 64);
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn dry_run_never_touches_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dry.bin");
        let original = vec![0x99u8; 32];
        fs::write(&path, &original).unwrap();

        let platform = UnixPlatform::new();
        let mut config = base_config();
        config.dry_run = true;
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        shred_file(&platform, &config, &reporter, &rename_guard, &random, &path);

        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn symlink_is_skipped_without_follow() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.bin");
        fs::write(&target, vec![0x01u8; 16]).unwrap();
        let link = dir.path().join("link.bin");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        shred_file(&platform, &config, &reporter, &rename_guard, &random, &link);

        assert!(link.exists());
        assert!(target.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn full_shred_unlinks_regular_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.bin");
        fs::write(&path, vec![0x7fu8; 128]).unwrap();

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        shred_file(&platform, &config, &reporter, &rename_guard, &random, &path);

        assert!(!path.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn fatal_flag_is_shared_across_clones() {
        let reporter = ErrorReporter::new();
        let other = reporter.clone();
        other.mark_fatal();
        assert!(reporter.is_fatal());
    }
}
