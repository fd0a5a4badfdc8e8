use std::process::ExitCode;

use clap::Parser;

use graft_earley::Error;
use graft_lang::{LoadError, Loader};

/// Load and run a graft module.
#[derive(Parser)]
#[command(name = "graft", version)]
struct Args {
    /// Source file path, without the `.graft` extension.
    source: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match Loader::new().load(&args.source) {
        Ok(_) => ExitCode::SUCCESS,
        Err(LoadError::Parse {
            path,
            source: Error::Ambiguous { candidates },
        }) => {
            eprintln!("in file {}: ambiguous parse", path.display());
            for candidate in candidates {
                eprintln!("{:?}", candidate);
            }
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
