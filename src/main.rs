use mixmeter::cli::{Config, Opt};
use std::sync::Arc;
use structopt::StructOpt;

// boilerplate

/// Wrap the run method so we can pass it command line args, setup logging, and handle errors
/// gracefully.
fn main() {
    let opts = Opt::from_args();
    setup_logger(opts.verbosity);
    let config = match Config::load(opts.config_file.as_ref()) {
        Ok(config) => Arc::new(config),
        Err(err) => return log_error(err),
    };
    if let Err(err) = mixmeter::run_monitor(config, opts) {
        log_error(err);
    }
}

fn log_error(err: anyhow::Error) {
    log::error!("{}", err);
    for e in err.chain().skip(1) {
        log::error!("caused by {}", e);
    }
}

/// Make the logger match our verbosity. This is custom because we don't want to see all messages
/// from other packages, only `mixmeter`.
fn setup_logger(verbosity: u32) {
    use log::LevelFilter;
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_timed_builder()
        .filter(None, LevelFilter::Warn)
        .filter(Some("mixmeter"), level)
        .init()
}
