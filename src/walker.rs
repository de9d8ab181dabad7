/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::{Config, ErrorReporter, RenameGuard};
use crate::engine;
use crate::logging::{self, Level};
use crate::platform::Platform;
use crate::random::RandomSource;

/// Drives the shred engine over one user-supplied path (C7). Dispatches
/// on symlink / directory / regular-file / other, and for directories,
/// recurses and then cleans up the now-empty directory tree. Each
/// top-level path is handled independently; nothing here aborts the
/// walk over the remaining paths.
pub fn walk(
    platform: &dyn Platform,
    config: &Config,
    reporter: &ErrorReporter,
    rename_guard: &RenameGuard,
    random: &RandomSource,
    path: &Path,
) {
    let symlink_meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => {
            logging::log(
                config,
                Level::Error,
                format!("'{}' does not exist", path.display()),
            );
            reporter.mark_fatal();
            return;
        }
    };

    if symlink_meta.file_type().is_symlink() {
        if !config.follow_symlinks {
            logging::log(
                config,
                Level::Warning,
                format!("'{}' is a symlink, skipping (use -e to follow)", path.display()),
            );
            return;
        }
        match fs::metadata(path) {
            Ok(target_meta) if target_meta.is_dir() => {
                walk_directory(platform, config, reporter, rename_guard, random, path)
            }
            Ok(target_meta) if target_meta.is_file() => {
                engine::shred_file(platform, config, reporter, rename_guard, random, path)
            }
            Ok(_) => {
                logging::log(
                    config,
                    Level::Error,
                    format!("'{}' is not a regular file, directory, or symlink", path.display()),
                );
                reporter.mark_fatal();
            }
            Err(_) => {
                logging::log(
                    config,
                    Level::Warning,
                    format!("'{}' is a dangling symlink, skipping", path.display()),
                );
            }
        }
        return;
    }

    if symlink_meta.is_dir() {
        walk_directory(platform, config, reporter, rename_guard, random, path);
        return;
    }

    if symlink_meta.is_file() {
        engine::shred_file(platform, config, reporter, rename_guard, random, path);
        return;
    }

    logging::log(
        config,
        Level::Error,
        format!("'{}' is not a regular file, directory, or symlink", path.display()),
    );
    reporter.mark_fatal();
}

fn walk_directory(
    platform: &dyn Platform,
    config: &Config,
    reporter: &ErrorReporter,
    rename_guard: &RenameGuard,
    random: &RandomSource,
    dir: &Path,
) {
    if !config.recursive {
        logging::log(
            config,
            Level::Warning,
            format!("'{}' is a directory. Use -r", dir.display()),
        );
        return;
    }

    // `contents_first` yields every descendant before its parent, so a
    // subdirectory's emptiness (and removal) is already settled by the
    // time its parent is visited here — cleanup is bottom-up over the
    // whole recursed tree, not just the root `dir` argument.
    let walker = WalkDir::new(dir)
        .follow_links(config.follow_symlinks)
        .contents_first(true);

    for entry in walker.into_iter().filter_map(|entry| entry.ok()) {
        let entry_path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_symlink() && !config.follow_symlinks {
            if entry_path != dir {
                logging::log(
                    config,
                    Level::Warning,
                    format!("'{}' is a symlink, skipping (use -e to follow)", entry_path.display()),
                );
            }
            continue;
        }

        if file_type.is_file() {
            engine::shred_file(platform, config, reporter, rename_guard, random, entry_path);
            continue;
        }

        if !file_type.is_dir() || config.keep || config.dry_run {
            continue;
        }

        match is_empty_dir(entry_path) {
            Ok(true) => {
                if let Err(source) = fs::remove_dir(entry_path) {
                    logging::log(
                        config,
                        Level::Error,
                        format!("failed to remove directory '{}': {source}", entry_path.display()),
                    );
                    reporter.mark_fatal();
                }
            }
            Ok(false) => {
                logging::log(
                    config,
                    Level::Warning,
                    format!("'{}' is not empty after shredding, leaving it in place", entry_path.display()),
                );
            }
            Err(_) => {}
        }
    }
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnixPlatform;
    use tempfile::tempdir;

    fn base_config() -> Config {
        Config {
            passes: 1,
            recursive: true,
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
    fn non_recursive_directory_is_left_untouched() {
        let dir = tempdir().unwrap();
        let file_a = dir.path().join("x");
        fs::write(&file_a, b"hello").unwrap();

        let platform = UnixPlatform::new();
        let mut config = base_config();
        config.recursive = false;
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        walk(&platform, &config, &reporter, &rename_guard, &random, dir.path());

        assert!(dir.path().exists());
        assert!(file_a.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn recursive_directory_is_emptied_and_removed() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a"), b"one").unwrap();
        fs::write(root.join("b"), b"two").unwrap();

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        walk(&platform, &config, &reporter, &rename_guard, &random, &root);

        assert!(!root.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn recursive_cleanup_removes_nested_subdirectories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("dir2");
        let sub = root.join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(root.join("a"), b"one").unwrap();
        fs::write(sub.join("c"), b"three").unwrap();

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        walk(&platform, &config, &reporter, &rename_guard, &random, &root);

        assert!(!sub.exists());
        assert!(!root.exists());
        assert!(!reporter.is_fatal());
    }

    #[test]
    fn missing_path_sets_fatal_flag() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let platform = UnixPlatform::new();
        let config = base_config();
        let reporter = ErrorReporter::new();
        let rename_guard = RenameGuard::new();
        let random = RandomSource::new();

        walk(&platform, &config, &reporter, &rename_guard, &random, &missing);

        assert!(reporter.is_fatal());
    }
}
