/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use clap::Parser;

const SHORT_USAGE: &str = "\
usage: shredder [-rkvesdcf] [-n COUNT] [--internal] PATH...

Overwrite and delete files and directories securely.
Run with -H for the full option list.";

const FULL_USAGE: &str = "\
usage: shredder [-rkvesdcf] [-n COUNT] [--internal] PATH...

  -n, --overwrite-count COUNT  number of overwrite passes (default 3)
  -r, --recursive              descend into directories
  -k, --keep-files              overwrite but do not unlink
  -v, --verbose                 emit INFO-level log events
  -e, --follow-symlinks         follow symbolic links
  -s, --secure                  use the fixed pattern schedule
  -d, --dry                     simulate without mutating anything
  -c, --no-verify                skip post-pass verification
  -f, --force                    attempt permission elevation when denied
      --internal                 emit diagnostics, confirm before starting
  -h, --help                    short usage
  -H, --full-help                this text
  -V, --version                  version line
  -C, --copyright                copyright text";

const VERSION_LINE: &str = concat!("shredder ", env!("CARGO_PKG_VERSION"));

const COPYRIGHT_TEXT: &str = "\
shredder - secure multi-pass erasure utility
Licensed under the Mozilla Public License, v. 2.0.";

/// Parsed, validated CLI surface (external collaborator per spec.md §1).
#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true, no_binary_name = true)]
pub struct Args {
    /// Number of top-level overwrite passes.
    #[arg(short = 'n', long = "overwrite-count", default_value_t = 3)]
    pub overwrite_count: u32,

    /// Descend into directories.
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Overwrite but do not unlink.
    #[arg(short = 'k', long = "keep-files")]
    pub keep_files: bool,

    /// Emit INFO-level events.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Follow symbolic links.
    #[arg(short = 'e', long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Use the fixed-pattern schedule in the overwrite kernel.
    #[arg(short = 's', long = "secure")]
    pub secure: bool,

    /// Simulate without mutation.
    #[arg(short = 'd', long = "dry")]
    pub dry: bool,

    /// Skip post-pass verification.
    #[arg(short = 'c', long = "no-verify")]
    pub no_verify: bool,

    /// Attempt permission elevation when read or write is denied.
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Emit diagnostic events and request confirmation before starting.
    #[arg(long = "internal")]
    pub internal: bool,

    /// Target files and/or directories.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Outcome of the pre-clap short-circuit scan for `-h/-H/-V/-C`.
pub enum EarlyExit {
    Help,
    FullHelp,
    Version,
    Copyright,
}

impl EarlyExit {
    pub fn print(&self) {
        match self {
            EarlyExit::Help => println!("{SHORT_USAGE}"),
            EarlyExit::FullHelp => println!("{FULL_USAGE}"),
            EarlyExit::Version => println!("{VERSION_LINE}"),
            EarlyExit::Copyright => println!("{COPYRIGHT_TEXT}"),
        }
    }
}

/// Scans raw argv for the informational flags that must exit 2 rather
/// than go through normal clap parsing (clap's own `--help`/`--version`
/// exit 0, which spec.md's exit-code table does not allow). Short flags
/// are matched case-sensitively; long flags case-insensitively, per
/// spec.md §6.
pub fn scan_early_exit(raw_args: &[String]) -> Option<EarlyExit> {
    for arg in raw_args {
        if arg == "-h" || arg.eq_ignore_ascii_case("--help") {
            return Some(EarlyExit::Help);
        }
        if arg == "-H" || arg.eq_ignore_ascii_case("--full-help") {
            return Some(EarlyExit::FullHelp);
        }
        if arg == "-V" || arg.eq_ignore_ascii_case("--version") {
            return Some(EarlyExit::Version);
        }
        if arg == "-C" || arg.eq_ignore_ascii_case("--copyright") {
            return Some(EarlyExit::Copyright);
        }
    }
    None
}

/// Lower-cases the option-name portion of long flags (`--FOO=bar` ->
/// `--foo=bar`) so long options are case-insensitive as spec.md §6
/// requires, without touching short flags or option values.
pub fn normalize_long_flag_case(raw_args: &[String]) -> Vec<String> {
    raw_args
        .iter()
        .map(|arg| {
            if let Some(rest) = arg.strip_prefix("--") {
                match rest.split_once('=') {
                    Some((name, value)) => format!("--{}={}", name.to_ascii_lowercase(), value),
                    None => format!("--{}", rest.to_ascii_lowercase()),
                }
            } else {
                arg.clone()
            }
        })
        .collect()
}
