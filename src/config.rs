/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::args::Args;

/// Immutable, run-wide configuration. Built once from `Args` and shared
/// read-only by every component; no component may mutate it after
/// construction.
#[derive(Clone, Debug)]
pub struct Config {
    pub passes: u32,
    pub recursive: bool,
    pub keep: bool,
    pub verbose: bool,
    pub follow_symlinks: bool,
    pub secure: bool,
    pub dry_run: bool,
    pub verify: bool,
    pub force: bool,
    pub internal: bool,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Config {
            passes: args.overwrite_count,
            recursive: args.recursive,
            keep: args.keep_files,
            verbose: args.verbose,
            follow_symlinks: args.follow_symlinks,
            secure: args.secure,
            dry_run: args.dry,
            verify: !args.no_verify,
            force: args.force,
            internal: args.internal,
        }
    }
}

/// Aggregates the process-wide fatal-error flag. Any component may set
/// it through `mark_fatal`; only `main` reads it, once, at exit.
#[derive(Clone, Default)]
pub struct ErrorReporter {
    fatal: Arc<AtomicBool>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_fatal(&self) {
        self.fatal.store(true, Ordering::SeqCst);
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            0
        }
    }
}

/// Guards the `chmod -> rename -> scrub -> unlink` sequence so two engine
/// invocations never race for the same randomly generated temp name. The
/// engine runs single-threaded (spec.md §5), but the guard is kept as a
/// real mutex rather than a no-op so the invariant is enforced by the
/// type system, not by convention.
#[derive(Clone, Default)]
pub struct RenameGuard {
    inner: Arc<Mutex<()>>,
}

impl RenameGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
