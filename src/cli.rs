//! Command-line interface for shell-queue.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Start the shell through the escalation broker.
    pub root: bool,
    /// Shell program (overrides config file).
    pub shell: Option<String>,
    /// Per-command timeout in seconds.
    pub timeout: Option<u64>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Commands to run, in order.
    pub commands: Vec<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('r') | Long("root") => {
                result.root = true;
            }
            Short('s') | Long("shell") => {
                result.shell = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("timeout", value.clone()))?;
                if secs == 0 {
                    return Err(ArgsError::InvalidValue("timeout", value));
                }
                result.timeout = Some(secs);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                let command = val
                    .into_string()
                    .map_err(|v| ArgsError::InvalidValue("command", v.to_string_lossy().into()))?;
                result.commands.push(command);
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"shell-queue {version}
Run commands in order through one persistent shell

USAGE:
    shell-queue [OPTIONS] <COMMAND>...

OPTIONS:
    -r, --root              Start the shell through the escalation broker (su)
    -s, --shell <PROGRAM>   Shell program [default: /bin/sh]
    -t, --timeout <SECS>    Per-command timeout in seconds
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SHELL_QUEUE_SHELL       Shell program (overrides config)
    SHELL_QUEUE_ESCALATION  Escalation broker command line (overrides config)
    SHELL_QUEUE_TIMEOUT     Per-command timeout in seconds (overrides config)
    SHELL_QUEUE_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Commands share one shell, so the cd carries over
    shell-queue 'cd /var/log' 'ls -la'

    # Run as root
    shell-queue -r 'id'

    # Give up on anything slower than five seconds
    shell-queue -t 5 'sleep 1; echo done'
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("shell-queue {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("shell-queue")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(!result.root);
        assert!(result.shell.is_none());
        assert!(result.timeout.is_none());
        assert!(result.commands.is_empty());
    }

    #[test]
    fn test_commands_in_order() {
        let result = parse_args_from(args(&["cd /tmp", "pwd"])).unwrap();
        assert_eq!(result.commands, vec!["cd /tmp", "pwd"]);
    }

    #[test]
    fn test_root_and_shell() {
        let result = parse_args_from(args(&["-r", "-s", "/bin/bash", "id"])).unwrap();
        assert!(result.root);
        assert_eq!(result.shell, Some("/bin/bash".to_string()));
        assert_eq!(result.commands, vec!["id"]);
    }

    #[test]
    fn test_long_options() {
        let result =
            parse_args_from(args(&["--root", "--shell", "/bin/dash", "--timeout", "9"])).unwrap();
        assert!(result.root);
        assert_eq!(result.shell, Some("/bin/dash".to_string()));
        assert_eq!(result.timeout, Some(9));
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);

        let result = parse_args_from(args(&["--version"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(parse_args_from(args(&["-t", "soon"])).is_err());
        assert!(parse_args_from(args(&["-t", "0"])).is_err());
    }

    #[test]
    fn test_unknown_option() {
        let result = parse_args_from(args(&["--port", "80"]));
        assert!(matches!(result, Err(ArgsError::Lexopt(_))));
    }

    #[test]
    fn test_double_dash_passes_commands() {
        let result = parse_args_from(args(&["--", "-r"])).unwrap();
        assert!(!result.root);
        assert_eq!(result.commands, vec!["-r"]);
    }
}
