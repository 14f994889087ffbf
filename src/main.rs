// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! spacey-lower - validate JavaScript and lower it to Spacey IR
//!
//! ## Features
//!
//! - Compiles several files concurrently with tokio
//! - Prints diagnostics as `file:line:col: severity: message`
//! - Interactive REPL that shows the IR of each entry

mod repl;

use clap::Parser;
use owo_colors::OwoColorize;
use spacey_frontend::{AsyncFrontend, CompiledUnit, Frontend, FrontendConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Validate JavaScript and lower it to Spacey IR
#[derive(Parser, Debug)]
#[command(name = "spacey-lower")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Treat every program as strict mode code
    #[arg(long, env = "SPACEY_STRICT")]
    strict: bool,

    /// Defer lowering of large function bodies until requested
    #[arg(long, env = "SPACEY_LAZY")]
    lazy: bool,

    /// Minimum body size in bytes for a body to be deferred
    #[arg(long, value_name = "BYTES", default_value_t = 64)]
    lazy_threshold: usize,

    /// Lower deferred bodies too before printing
    #[arg(long, requires = "lazy")]
    force_lazy: bool,

    /// Maximum number of errors reported per file
    #[arg(long, value_name = "N", default_value_t = 20)]
    max_errors: usize,

    /// Print the IR of every compiled file
    #[arg(long)]
    dump_ir: bool,

    /// Stop after semantic validation
    #[arg(long, conflicts_with = "dump_ir")]
    validate_only: bool,

    /// Compile a snippet instead of files
    #[arg(short = 'e', long = "eval", value_name = "CODE", conflicts_with = "files")]
    eval: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// JavaScript files to compile
    files: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> FrontendConfig {
        FrontendConfig::new()
            .with_strict(self.strict)
            .with_lazy(self.lazy)
            .with_lazy_threshold(self.lazy_threshold)
            .with_max_errors(self.max_errors)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(code) = &cli.eval {
        return run_eval(&cli, code);
    }
    if cli.files.is_empty() {
        return run_repl(cli.config());
    }
    run_files(&cli).await
}

/// Start the interactive REPL
fn run_repl(config: FrontendConfig) -> ExitCode {
    match repl::Repl::new(config) {
        Ok(mut repl) => {
            if let Err(e) = repl.run() {
                eprintln!("{}: {:?}", "REPL Error".red().bold(), e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "{}: Failed to initialize REPL: {:?}",
                "Error".red().bold(),
                e
            );
            ExitCode::FAILURE
        }
    }
}

/// Compile files concurrently and report each in command line order.
async fn run_files(cli: &Cli) -> ExitCode {
    let frontend = AsyncFrontend::new(cli.config())
        .with_validate_only(cli.validate_only)
        .with_force_lazy(cli.force_lazy);
    tracing::debug!(files = cli.files.len(), "compiling files");
    let results = frontend.compile_files(&cli.files).await;

    let mut failed = false;
    for (path, result) in cli.files.iter().zip(results) {
        match result {
            Ok(unit) => failed |= !report_unit(cli, &unit),
            Err(e) => {
                eprintln!(
                    "{}: {}: {}",
                    "Error".red().bold(),
                    path.display().cyan(),
                    e
                );
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Prints a compiled unit. Returns false if it failed.
fn report_unit(cli: &Cli, unit: &CompiledUnit) -> bool {
    for diagnostic in &unit.diagnostics {
        print_diagnostic(diagnostic);
    }
    if let Some(error) = &unit.error {
        if unit.diagnostics.is_empty() {
            print_diagnostic(error);
        }
        return false;
    }

    if cli.dump_ir
        && let Some(ir) = &unit.ir
    {
        println!("{}", format!("; {}", unit.name).dimmed());
        print!("{ir}");
    } else if !cli.validate_only {
        println!(
            "{} {} ({} functions)",
            "ok".green().bold(),
            unit.name,
            unit.functions
        );
    }
    true
}

/// Compile a snippet given with `-e`.
fn run_eval(cli: &Cli, code: &str) -> ExitCode {
    let mut frontend = Frontend::new(cli.config());
    let result = if cli.validate_only {
        frontend.check("<eval>", code).map(|_| ())
    } else {
        frontend.compile("<eval>", code).map(|_| ())
    };
    let result = result.and_then(|()| {
        if cli.force_lazy {
            frontend.compile_all_lazy()?;
        }
        Ok(())
    });

    for diagnostic in frontend.diagnostics().iter() {
        print_diagnostic(&frontend.format_diagnostic(diagnostic));
    }
    match result {
        Ok(()) => {
            if !cli.validate_only {
                print!("{}", frontend.module_to_string());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if frontend.diagnostics().is_empty() {
                print_diagnostic(&frontend.format_error(&e));
            }
            ExitCode::FAILURE
        }
    }
}

/// Print a `file:line:col: severity: message` line, coloring the severity.
pub(crate) fn print_diagnostic(line: &str) {
    for (marker, colored) in [
        (": error: ", ": error: ".red().bold().to_string()),
        (": note: ", ": note: ".cyan().to_string()),
        (": SyntaxError: ", ": SyntaxError: ".red().bold().to_string()),
    ] {
        if let Some(at) = line.find(marker) {
            let (location, rest) = line.split_at(at);
            eprintln!("{}{}{}", location.bold(), colored, &rest[marker.len()..]);
            return;
        }
    }
    eprintln!("{}", line.red());
}
