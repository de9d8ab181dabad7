/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

mod args;
mod config;
mod engine;
mod error;
mod hasher;
mod logging;
mod overwrite;
mod permissions;
mod platform;
mod random;
mod walker;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use args::{Args, EarlyExit};
use config::{Config, ErrorReporter, RenameGuard};
use platform::UnixPlatform;
use random::RandomSource;

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("failed to initialize logging: {err:#}");
        return ExitCode::from(1);
    }

    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(early_exit) = args::scan_early_exit(&raw_args) {
        early_exit.print();
        return ExitCode::from(2);
    }

    let normalized = args::normalize_long_flag_case(&raw_args);
    let parsed = match Args::try_parse_from(normalized) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let config = Config::from_args(&parsed);

    if config.internal {
        print_internal_summary(&config, &parsed.paths);
        if !confirm() {
            return ExitCode::from(3);
        }
    }

    let platform = UnixPlatform::new();
    let reporter = ErrorReporter::new();
    let rename_guard = RenameGuard::new();
    let random = RandomSource::new();

    for raw_path in &parsed.paths {
        let path = PathBuf::from(raw_path);
        walker::walk(&platform, &config, &reporter, &rename_guard, &random, &path);
    }

    ExitCode::from(reporter.exit_code() as u8)
}

fn print_internal_summary(config: &Config, paths: &[String]) {
    logging::log(
        config,
        logging::Level::Internal,
        format!(
            "passes={} recursive={} keep={} verbose={} follow_symlinks={} secure={} dry_run={} verify={} force={}",
            config.passes,
            config.recursive,
            config.keep,
            config.verbose,
            config.follow_symlinks,
            config.secure,
            config.dry_run,
            config.verify,
            config.force,
        ),
    );
    logging::log(
        config,
        logging::Level::Internal,
        format!("targets: {}", paths.join(", ")),
    );
}

/// Prompts `Continue? (y/N)` on standard input (spec.md §6's interactive
/// surface). Any reply other than `y`/`yes` (case-insensitive) declines.
fn confirm() -> bool {
    print!("Continue? (y/N) ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut reply = String::new();
    if io::stdin().read_line(&mut reply).is_err() {
        return false;
    }
    let reply = reply.trim();
    reply.eq_ignore_ascii_case("y") || reply.eq_ignore_ascii_case("yes")
}
