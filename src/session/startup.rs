//! Text written to a freshly spawned shell.

use tracing::warn;

use super::SessionConfig;
use crate::demux::Marker;

/// Quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Build the startup script ending with the ready handshake.
///
/// Escalation brokers reset the environment, so variables and the working
/// directory are applied from inside the shell rather than at spawn time.
pub fn preamble(config: &SessionConfig, ready: &Marker) -> String {
    let mut lines = vec![
        "stty -echo 2>/dev/null".to_string(),
        "PS1=''; PS2=''; export PS1 PS2".to_string(),
        "unset PROMPT_COMMAND 2>/dev/null".to_string(),
    ];

    for (key, value) in &config.env {
        if is_identifier(key) {
            lines.push(format!("export {}={}", key, shell_quote(value)));
        } else {
            warn!(key = %key, "skipping invalid environment variable name");
        }
    }

    if let Some(dir) = &config.working_dir {
        lines.push(format!("cd {}", shell_quote(&dir.to_string_lossy())));
    }

    lines.push(ready.echo_command());

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Text that runs `script` and then reports its status via `marker`.
///
/// The script goes through `eval` as one quoted word, so an unterminated
/// quote, a missing `fi` or a trailing backslash fails inside `eval` with a
/// non-zero status instead of absorbing the sentinel line.
pub fn dispatch_text(script: &str, marker: &Marker) -> String {
    format!("eval {}\n{}\n", shell_quote(script), marker.sentinel_command())
}
