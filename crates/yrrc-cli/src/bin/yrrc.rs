use yrrc_cli::cli::RulesCli;
use yrrc_core::logging;

fn main() {
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = RulesCli::run_from_args() {
        eprintln!("yrrc error: {:#}", err);
        std::process::exit(1);
    }
}
