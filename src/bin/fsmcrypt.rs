//! fsmcrypt command-line tool.

use clap::Parser;
use colored::Colorize;

use fsmcrypt::cli::{run, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
