//! Shell-queue binary entry point.

use std::process::ExitCode;

use shell_queue::cli::{self, Args};
use shell_queue::config::Config;
use shell_queue::{logging, Command, Session, ShellQueueError};
use tracing::{debug, error};

/// Exit status when the session cannot be used at all.
const EXIT_FAILURE: u8 = 125;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'shell-queue --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(&args, &config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Run every command through one session; returns the last exit code.
fn run(args: &Args, config: &Config) -> Result<u8, Box<dyn std::error::Error>> {
    let session_config = config.to_session_config(args.root)?;
    let session = Session::open(session_config)?;
    debug!(session = %session.id(), commands = args.commands.len(), "running commands");

    let mut last = 0;
    for statement in &args.commands {
        let command = Command::new(statement.as_str()).on_line(|_, line| println!("{}", line));
        match session.execute(command) {
            Ok(output) => {
                if !output.success() {
                    eprintln!("shell-queue: `{}` exited with {}", statement, output.exit_code);
                }
                last = output.exit_code;
            }
            Err(ShellQueueError::Timeout) => {
                session.close();
                return Err(format!("timed out: {}", statement).into());
            }
            Err(e) => {
                session.close();
                return Err(e.into());
            }
        }
    }

    session.close();
    // Shell statuses are 0..=255; anything else is reported as a failure
    Ok(u8::try_from(last).unwrap_or(EXIT_FAILURE))
}
