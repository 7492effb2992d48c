//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use pathbuilder_cli::CliError;

fn main() {
    match pathbuilder_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("pathbuilder: {err}");
            std::process::exit(1);
        }
    }
}
