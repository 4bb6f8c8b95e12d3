//! Script and REPL drivers for a [`SessionExecutor`].

use crate::session::{OutputFormat, SessionError, SessionExecutor};
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: {source}")]
    Line { line: usize, source: SessionError },
}

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

/// What a script does after a line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    #[default]
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptSummary {
    /// Lines that produced output.
    pub executed: usize,
    pub failed: usize,
}

/// A failed command in the session's output format. JSON sessions get one
/// object per line so their stderr stays machine readable too.
pub fn render_error(format: OutputFormat, line: usize, command: &str, err: &SessionError) -> String {
    match format {
        OutputFormat::Text => format!("Error at line {} ({}): {}", line, command, err),
        OutputFormat::Json => json!({
            "line": line,
            "command": command,
            "error": err.to_string(),
        })
        .to_string(),
    }
}

/// Execute a session script. Blank lines and `#` comments are skipped by the
/// command grammar, but still count towards line numbers.
pub async fn run_script(
    executor: &mut SessionExecutor,
    output: OutputHandlers,
    path: &Path,
    on_error: OnError,
) -> Result<ScriptSummary, CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut summary = ScriptSummary::default();

    for (index, line) in content.lines().enumerate() {
        let number = index + 1;
        match executor.execute_line(line) {
            Ok(Some(result)) => {
                summary.executed += 1;
                (output.out)(&result);
            }
            Ok(None) => {}
            Err(err) => {
                summary.failed += 1;
                (output.err)(&render_error(executor.format(), number, line.trim(), &err));
                if on_error == OnError::Stop {
                    return Err(CliError::Line {
                        line: number,
                        source: err,
                    });
                }
                warn!(line = number, "Continuing after failed line");
            }
        }
    }

    info!(
        executed = summary.executed,
        failed = summary.failed,
        "Script finished"
    );
    Ok(summary)
}

enum ReplInput {
    Command(String),
    Blank,
    /// EOF, an exit command or Ctrl-C.
    Exit,
}

fn classify_line(line: Option<String>) -> ReplInput {
    let Some(line) = line else {
        return ReplInput::Exit;
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        ReplInput::Blank
    } else if EXIT_COMMANDS.iter().any(|c| trimmed.eq_ignore_ascii_case(c)) {
        ReplInput::Exit
    } else {
        ReplInput::Command(trimmed.to_string())
    }
}

/// Interactive loop over stdin. Failed commands are reported and the loop
/// goes on; only stdin errors end it early.
pub async fn run_repl(
    executor: &mut SessionExecutor,
    output: OutputHandlers,
    banner: &[&str],
    prompt: &str,
) -> Result<(), CliError> {
    for line in banner {
        (output.out)(line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut number = 0;

    loop {
        print!("{}", prompt);
        stdout.flush()?;

        let input = tokio::select! {
            line = lines.next_line() => classify_line(line?),
            _ = tokio::signal::ctrl_c() => {
                (output.out)("Interrupted.");
                ReplInput::Exit
            }
        };

        match input {
            ReplInput::Command(command) => {
                number += 1;
                match executor.execute_line(&command) {
                    Ok(Some(result)) => (output.out)(&result),
                    Ok(None) => {}
                    Err(err) => {
                        (output.err)(&render_error(executor.format(), number, &command, &err))
                    }
                }
            }
            ReplInput::Blank => continue,
            ReplInput::Exit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::session::SessionClock;
    use crate::tracker::ManualClock;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn executor(format: OutputFormat) -> SessionExecutor {
        SessionExecutor::new(
            EngineConfig::default(),
            SessionClock::Manual(ManualClock::new(0)),
            format,
        )
    }

    fn script(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_classify_line() {
        assert!(matches!(
            classify_line(Some("  status ".into())),
            ReplInput::Command(ref s) if s == "status"
        ));
        assert!(matches!(classify_line(Some("   ".into())), ReplInput::Blank));
        assert!(matches!(classify_line(Some("QUIT".into())), ReplInput::Exit));
        assert!(matches!(classify_line(None), ReplInput::Exit));
    }

    #[test]
    fn test_render_error_follows_format() {
        let err = SessionError::NoDocument;
        assert_eq!(
            render_error(OutputFormat::Text, 3, "select 'p'", &err),
            "Error at line 3 (select 'p'): No document loaded"
        );
        let value: serde_json::Value =
            serde_json::from_str(&render_error(OutputFormat::Json, 3, "select 'p'", &err)).unwrap();
        assert_eq!(value["line"], 3);
        assert_eq!(value["command"], "select 'p'");
        assert_eq!(value["error"], "No document loaded");
    }

    static STOP_ERR: Mutex<Vec<String>> = Mutex::new(Vec::new());

    #[tokio::test]
    async fn test_script_stops_at_first_failure() {
        let file = script("start\n\nselect 'p'\nstatus\n");
        let mut session = executor(OutputFormat::Text);
        let output = OutputHandlers {
            out: |_| {},
            err: |msg| STOP_ERR.lock().unwrap().push(msg.to_string()),
        };

        let result = run_script(&mut session, output, file.path(), OnError::Stop).await;
        assert!(matches!(
            result,
            Err(CliError::Line { line: 3, source: SessionError::NoDocument })
        ));
        assert_eq!(
            *STOP_ERR.lock().unwrap(),
            vec!["Error at line 3 (select 'p'): No document loaded".to_string()]
        );
    }

    static CONTINUE_OUT: Mutex<Vec<String>> = Mutex::new(Vec::new());

    #[tokio::test]
    async fn test_script_continues_when_asked() {
        let file = script("# setup\nstart\nselect 'p'\nadvance 10\nstatus\n");
        let mut session = executor(OutputFormat::Json);
        let output = OutputHandlers {
            out: |msg| CONTINUE_OUT.lock().unwrap().push(msg.to_string()),
            err: |_| {},
        };

        let summary = run_script(&mut session, output, file.path(), OnError::Continue)
            .await
            .unwrap();
        assert_eq!(
            summary,
            ScriptSummary {
                executed: 3,
                failed: 1
            }
        );
        let out = CONTINUE_OUT.lock().unwrap();
        assert_eq!(out[0], r#"{"state":"inspecting"}"#);
        assert_eq!(out[1], r#"{"now_ms":10}"#);
    }

    #[tokio::test]
    async fn test_missing_script_is_io_error() {
        let mut session = executor(OutputFormat::Text);
        let output = OutputHandlers {
            out: |_| {},
            err: |_| {},
        };
        let result = run_script(
            &mut session,
            output,
            Path::new("/nonexistent/session.txt"),
            OnError::Stop,
        )
        .await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
