use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};
use unrealscript::headers::Prompter;
use unrealscript::{BuildError, BuildOptions, EditorConfig, make_scripts};

#[derive(Parser, Debug)]
#[command(name = "ucc")]
#[command(about = "UnrealScript package compiler")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile every package the editor ini lists
    Make {
        /// Editor ini holding the [Editor.EditorEngine] section
        #[arg(long, default_value = "UnrealEd.ini")]
        ini: PathBuf,

        /// Build switches: FULL, LISTUNREFERENCED, NOCONFORM, nodelete, auto,
        /// DEBUG, SILENTBUILD, SHOWDEP, bootstrap
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        switches: Vec<String>,
    },
}

/// Asks on the terminal.
struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn confirm(&mut self, question: &str) -> bool {
        print!("{} [y/N] ", question);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn init_logging(silent: bool) {
    let default = if silent { "warn" } else { "info" };
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    match args.command {
        Commands::Make { ini, switches } => {
            let options = BuildOptions::parse(&switches.join(" "));
            init_logging(options.silent);

            let config = EditorConfig::load(&ini)
                .with_context(|| format!("reading {}", ini.display()))?;
            let mut prompter: Box<dyn Prompter> = options
                .fixed_prompter()
                .unwrap_or_else(|| Box::new(ConsolePrompter));

            let report = make_scripts(&config, &options, prompter.as_mut())?;
            for failure in &report.failures {
                eprintln!("{}", failure.log_line);
            }
            for function in &report.unreferenced {
                println!("Unreferenced: {}", function);
            }
            if report.succeeded() {
                println!(
                    "Success - 0 error(s), {} warning(s)",
                    report.warnings
                );
                Ok(ExitCode::SUCCESS)
            } else {
                let err = BuildError::ClassesFailed {
                    count: report.failures.len(),
                };
                eprintln!("Failure - {}, {} warning(s)", err, report.warnings);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
