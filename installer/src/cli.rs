//! Command-line surface.
//!
//! Static flags come from the derive parser; one `--skip-<slug>-step` switch
//! per catalog step is appended at runtime so the flag set always mirrors the
//! registry.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::core::plan::RunOptions;
use crate::steps::KEEP_EDGE_TARGET;

#[derive(Parser, Debug)]
#[command(
    name = "installer",
    version,
    about = "Unattended installer that applies a fixed sequence of system changes"
)]
pub struct Cli {
    /// Run without the installing overlay (foreground, console status only).
    #[arg(long)]
    pub developer_mode: bool,

    /// Run without uninstalling Microsoft Edge.
    #[arg(long)]
    pub keep_edge: bool,

    /// Installer config file. A missing file means built-in defaults.
    #[arg(long, default_value = "installer.toml")]
    pub config: PathBuf,

    /// Also append logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Parsed command line.
#[derive(Debug)]
pub struct CliArgs {
    pub cli: Cli,
    /// Slugs whose skip switch was given, in catalog order.
    pub skipped: Vec<String>,
}

impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        let mut mode_overrides = Vec::new();
        if self.cli.keep_edge {
            mode_overrides.push(KEEP_EDGE_TARGET.to_string());
        }
        RunOptions {
            skip: self.skipped.clone(),
            mode_overrides,
            developer_mode: self.cli.developer_mode,
        }
    }
}

pub fn skip_flag_id(slug: &str) -> String {
    format!("skip_{}_step", slug.replace('-', "_"))
}

pub fn command(slugs: &[&str]) -> clap::Command {
    let skip_args = slugs.iter().map(|slug| {
        Arg::new(skip_flag_id(slug))
            .long(format!("skip-{slug}-step"))
            .action(ArgAction::SetTrue)
            .help(format!("Skip the {} step", slug.replace('-', " ")))
    });
    Cli::command().args(skip_args)
}

/// Parse `args` (including the binary name) against the catalog's slugs.
pub fn parse_from<I, T>(slugs: &[&str], args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command(slugs).try_get_matches_from(args)?;
    from_matches(slugs, &matches)
}

fn from_matches(slugs: &[&str], matches: &ArgMatches) -> Result<CliArgs, clap::Error> {
    let cli = Cli::from_arg_matches(matches)?;
    let skipped = slugs
        .iter()
        .filter(|slug| matches.get_flag(&skip_flag_id(slug)))
        .map(|slug| slug.to_string())
        .collect();
    Ok(CliArgs { cli, skipped })
}
