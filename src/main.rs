//! # catalyze CLI Entry Point
//!
//! Parses arguments with clap and routes each subcommand to its handler
//! in [`catalyze::commands`].

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;

use catalyze::commands::{self, GlobalOptions};

#[derive(Parser)]
#[command(name = "catalyze")]
#[command(about = "A fast build tool for C projects", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Compile jobs per wave [default: number of logical cores]
    #[arg(short, long, global = true, value_name = "N")]
    jobs: Option<usize>,

    /// Print every compiler and linker command
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the named targets, or every executable target
    Build {
        targets: Vec<String>,
        /// Write compile_commands.json into the build directory
        #[arg(long)]
        compile_commands: bool,
    },
    /// Build and run the named targets, or every executable target
    Run {
        targets: Vec<String>,
        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Build and run debug targets
    Debug { targets: Vec<String> },
    /// Build and run test targets
    Test { targets: Vec<String> },
    /// Create config.cat and src/main.c in the current directory
    Init,
    /// Create a new project directory
    New { name: String },
    /// List the targets defined in config.cat
    Targets,
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn dispatch(cli: Cli) -> Result<()> {
    let global = GlobalOptions {
        jobs: cli.jobs,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Build {
            targets,
            compile_commands,
        } => commands::build::build(&targets, compile_commands, &global),
        Commands::Run { targets, args } => commands::run::run(&targets, &args, &global),
        Commands::Debug { targets } => commands::run::debug(&targets, &global),
        Commands::Test { targets } => commands::run::test(&targets, &global),
        Commands::Init => commands::scaffold::init(),
        Commands::New { name } => commands::scaffold::new(&name),
        Commands::Targets => commands::targets::list(),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
