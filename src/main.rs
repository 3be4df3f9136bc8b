use assembly_tally::cli::CliArgs;
use assembly_tally::core::processor;
use assembly_tally::error::AppResult;
use assembly_tally::logging::{log, setup_logging, LogLevel};
use clap::Parser;
use std::process::ExitCode;
use tokio::runtime::Builder;

fn main() -> ExitCode {
    setup_logging();

    let cli_args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => e.exit(),
    };
    let fail_on_error = cli_args.fail_on_error();

    let config = match cli_args.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log(LogLevel::Error, &format!("CLI Argument Error: {}", e));
            return ExitCode::from(2);
        }
    };

    // Fetch attempts run strictly one after another.
    let runtime = match Builder::new_current_thread()
        .enable_all()
        .thread_name("assembly-tally")
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log(
                LogLevel::Error,
                &format!("FATAL: Failed to build Tokio runtime: {}", e),
            );
            return failure_exit(fail_on_error);
        }
    };

    let main_result: AppResult<i32> = runtime.block_on(processor::run(config));

    match main_result {
        Ok(exit_code) => ExitCode::from(exit_code as u8),
        Err(e) => {
            log(LogLevel::Error, &format!("Run aborted: {}", e));
            log(LogLevel::Error, &format!("Details: {:?}", e));
            failure_exit(fail_on_error)
        }
    }
}

/// Errors are reported in the log only, unless `--fail-on-error` was given.
fn failure_exit(fail_on_error: bool) -> ExitCode {
    if fail_on_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
