//! `form-tree`: inspect identity trees and convert form addresses.
//!
//! Usage:
//!   form-tree [--config <file>] <command> [args]
//!
//! Documents are read from stdin. Set `RUST_LOG=debug` for diagnostics on
//! stderr.

use clap::Parser;
use form_tree::cli::{run, Cli};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut buf = String::new();
    if cli.command.reads_input() {
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    match run(&cli, &buf) {
        Ok(result) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{result}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
