//! C9 — Command-line front-end.
//!
//! A primary `merge` subcommand plus small utility subcommands for
//! read-only discovery and squash maintenance. The verbose/quiet
//! resolution follows this lineage's own `LogLevelArg` idiom:
//! a mutually-exclusive repeated-count pair resolved by walking
//! `log::LevelFilter::iter()`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;

const ABOUT: &str = "Merges a meta repository and its submodules into a single monorepo, preserving history.";

#[derive(Parser, Debug)]
#[command(about = ABOUT)]
pub struct Cli {
    #[clap(flatten)]
    pub log_level: LogLevelArg,

    /// Path to an optional `RunConfig` TOML file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct LogLevelArg {
    /// Use `-v` for debug or `-vv` for trace log messages.
    #[arg(long, short = 'v', global = true, default_value = "0", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use `-q` to hide info, `-qq` to hide warnings, or `-qqq` to also hide errors.
    #[arg(long, short = 'q', global = true, default_value = "0", action = clap::ArgAction::Count)]
    quiet: u8,
}

impl LogLevelArg {
    pub fn value(&self) -> anyhow::Result<log::LevelFilter> {
        let levels = log::LevelFilter::iter().collect_vec();
        let mut level_i16 = levels
            .iter()
            .find_position(|level| *level == &DEFAULT_LOG_LEVEL)
            .expect("default log level must be valid")
            .0 as i16;
        level_i16 += self.verbose as i16;
        level_i16 -= self.quiet as i16;
        if level_i16 < 0 {
            anyhow::bail!(
                "too quiet: {} below {}",
                -level_i16,
                levels.first().unwrap().as_str()
            );
        } else if level_i16 as usize >= levels.len() {
            anyhow::bail!(
                "too verbose: {} above {}",
                level_i16 as usize - levels.len() + 1,
                levels.last().unwrap().as_str()
            );
        }
        Ok(levels[level_i16 as usize])
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the full migration: meta import, per-submodule import, report
    /// aggregation, and an optional squash pass.
    Merge(MergeArgs),
    /// Discovers every submodule referenced by the meta repository and
    /// writes a strategy-file template, without touching a mono repository.
    DumpTemplate(DumpTemplateArgs),
    /// Discovery-only: lists every branch of every referenced submodule.
    ReportBranches(DumpTemplateArgs),
    /// Reports whether every branch of an existing mono repository is
    /// squashable, without modifying it.
    CheckSquashable(MonoArgs),
    /// Collapses each squashable branch's contiguous bookkeeping commits
    /// into one commit.
    Squash(MonoArgs),
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Meta repository location (URL or local path).
    pub meta: String,

    /// Mono repository location. Initialized from scratch with default
    /// branch `main` if it does not already exist.
    #[arg(long, default_value = "mono")]
    pub mono: PathBuf,

    /// Strategy file approving which discovered submodules are consumed.
    #[arg(long)]
    pub strategy: Option<PathBuf>,

    /// Branch whitelist JSON (list of branch-name strings); default
    /// branches are always retained.
    #[arg(long)]
    pub whitelist: Option<PathBuf>,

    /// Instead of running the migration, discover submodules and write a
    /// strategy template to this path, then exit.
    #[arg(long)]
    pub dump_template: Option<PathBuf>,

    /// Check whether every mono branch is squashable after the run.
    #[arg(long)]
    pub check_squashable: bool,

    /// Squash every squashable mono branch after the run.
    #[arg(long)]
    pub squash: bool,

    /// Tee the full trace log to this file. Not implemented: the span/scope
    /// instrumentation this flag would feed is ambient plumbing only
    ///, the persisted-log feature itself is out of scope.
    #[arg(long)]
    pub dump_log: Option<PathBuf>,

    #[arg(long, default_value = "migration_report.json")]
    pub report_json: PathBuf,

    #[arg(long, default_value = "migration_report.txt")]
    pub report_text: PathBuf,
}

#[derive(Args, Debug)]
pub struct DumpTemplateArgs {
    /// Meta repository location (URL or local path).
    pub meta: String,

    /// Branch whitelist JSON (list of branch-name strings).
    #[arg(long)]
    pub whitelist: Option<PathBuf>,

    /// Where to write the strategy template. Defaults to stdout for
    /// `report-branches`-style human output when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MonoArgs {
    /// Existing mono repository location.
    pub mono: PathBuf,
}
