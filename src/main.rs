//! Flagexorcist CLI entry point.

use clap::Parser;
use flagexorcist::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    flagexorcist::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Audit(args) => match cli::run_audit(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
        Commands::Init(args) => match cli::run_init(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
