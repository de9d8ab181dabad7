/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt::Display;

use anyhow::Context;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::Config;

/// One of spec.md §6's five log levels. INFO and INTERNAL are only
/// emitted when the matching config flag is set; the rest are always
/// emitted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Level {
    Info,
    Warning,
    Error,
    DryRun,
    Internal,
}

/// Installs the process-wide log4rs backend. The format
/// `[MM-DD-YYYY HH:MM:SS] [LEVEL] message` is produced by embedding the
/// bracketed level tag directly in the logged message (via [`log`])
/// rather than through log4rs's own `{l}` token, since spec.md's level
/// set (INFO/WARNING/ERROR/DRY_RUN/INTERNAL) doesn't map one-to-one onto
/// the `log` crate's five standard levels.
pub fn init() -> anyhow::Result<()> {
    let encoder = Box::new(PatternEncoder::new("[{d(%m-%d-%Y %H:%M:%S)}] {m}{n}"));
    let stdout = ConsoleAppender::builder()
        .encoder(encoder)
        .target(Target::Stdout)
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Trace))
        .with_context(|| "failed to build log4rs configuration")?;
    log4rs::init_config(config).with_context(|| "failed to init logger")?;
    Ok(())
}

/// Emits a message at the given spec-level, filtered by `config`.
pub fn log(config: &Config, level: Level, message: impl Display) {
    match level {
        Level::Info => {
            if config.verbose {
                log::info!("[INFO] {message}");
            }
        }
        Level::Internal => {
            if config.internal {
                log::info!("[INTERNAL] {message}");
            }
        }
        Level::Warning => log::warn!("[WARNING] {message}"),
        Level::Error => log::error!("[ERROR] {message}"),
        Level::DryRun => log::info!("[DRY_RUN] {message}"),
    }
}
