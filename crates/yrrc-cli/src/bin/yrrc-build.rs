use yrrc_cli::cli::BuildCli;
use yrrc_core::logging;

fn main() {
    // Fall back to stderr when the state directory is not writable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = BuildCli::run_from_args() {
        eprintln!("yrrc-build error: {:#}", err);
        std::process::exit(1);
    }
}
