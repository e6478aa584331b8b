use yrrc_cli::cli::FetchCli;
use yrrc_core::logging;

#[tokio::main]
async fn main() {
    // Fall back to stderr when the state directory is not writable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = FetchCli::run_from_args().await {
        eprintln!("yrrc-fetch error: {:#}", err);
        std::process::exit(1);
    }
}
