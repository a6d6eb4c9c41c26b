//! Unattended installer entry point.
//!
//! Order of operations: parse the command line, install logging, check
//! privileges, resolve the run plan, then hand off to the execution mode
//! switch. Nothing touches the system before the plan is fully resolved.

use std::process::ExitCode;

use clap::error::ErrorKind;
use tracing::{error, info};

use installer::cli::{self, CliArgs};
use installer::core::types::ConfigurationError;
use installer::exit_codes;
use installer::io::privilege::{PrivilegeCheck, SystemPrivilegeCheck};
use installer::io::reporter::ConsoleReporter;
use installer::io::restart::SystemRestart;
use installer::launch::{launch, plan_run};
use installer::logging;
use installer::presentation::TerminalSurface;
use installer::steps;

fn main() -> ExitCode {
    ExitCode::from(run() as u8)
}

fn run() -> i32 {
    let args = match cli::parse_from(&steps::slugs(), std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = err.print();
                return exit_codes::OK;
            }
            let config_err = ConfigurationError::InvalidArguments(err.render().to_string());
            eprintln!("{config_err}");
            return exit_codes::CONFIG;
        }
    };

    if let Err(err) = logging::init(args.cli.log_file.as_deref()) {
        eprintln!("{err:#}");
        return exit_codes::CONFIG;
    }

    if let Err(err) = SystemPrivilegeCheck.ensure() {
        error!(err = %format!("{err:#}"), "privilege check failed");
        eprintln!("{err:#}");
        return exit_codes::PRIVILEGE;
    }

    install(&args)
}

fn install(args: &CliArgs) -> i32 {
    let plan = match plan_run(&args.cli.config, args.run_options()) {
        Ok(plan) => plan,
        Err(err) => {
            error!(err = %err, "invalid run configuration");
            eprintln!("{err}");
            return exit_codes::CONFIG;
        }
    };

    let title = plan.config.presentation.title.clone();
    let subtitle = plan.config.presentation.subtitle.clone();
    let result = launch(plan, ConsoleReporter, SystemRestart, move || {
        TerminalSurface::new(std::io::stdout(), title, subtitle)
    });

    match result {
        Ok(outcome) => {
            info!(completed = outcome.is_completed(), "installer finished");
            outcome.exit_code()
        }
        Err(err) => {
            error!(err = %format!("{err:#}"), "installer failed to run");
            eprintln!("{err:#}");
            exit_codes::ABORTED
        }
    }
}
