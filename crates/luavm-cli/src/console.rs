//! Terminal input: the line source for attach sessions and Ctrl-C
//! handling around long backend calls.

use luavm_core::{LineEvent, LineSource};
use std::future::Future;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Line editor with history, one per attach session.
pub struct ConsoleLines {
    editor: DefaultEditor,
}

impl ConsoleLines {
    /// Create a line editor on the controlling terminal.
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

/// Map an editor result onto a session event.
pub fn line_event(result: Result<String, ReadlineError>) -> std::io::Result<LineEvent> {
    match result {
        Ok(line) => Ok(LineEvent::Line(line)),
        Err(ReadlineError::Eof) => Ok(LineEvent::EndOfInput),
        Err(ReadlineError::Interrupted) => Ok(LineEvent::Interrupted),
        Err(ReadlineError::Io(e)) => Err(e),
        Err(e) => Err(std::io::Error::other(e.to_string())),
    }
}

impl LineSource for ConsoleLines {
    fn read_line(&mut self, prompt: &str) -> std::io::Result<LineEvent> {
        line_event(self.editor.readline(prompt))
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            tracing::debug!(error = %e, "Could not record history entry");
        }
    }
}

/// Resolve when Ctrl-C is pressed. If no handler can be installed this
/// never resolves and the default signal behaviour stays in place.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run `task` unless Ctrl-C arrives first, in which case `task` is dropped
/// and `None` returned.
///
/// The prompts read keys in raw mode, so the signal only arrives while a
/// backend call is in flight.
pub async fn interruptible<F: Future>(task: F) -> Option<F::Output> {
    tokio::select! {
        output = task => Some(output),
        _ = interrupted() => {
            tracing::debug!("Interrupted by Ctrl-C");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_event_mapping() {
        assert_eq!(
            line_event(Ok("x = 1".into())).unwrap(),
            LineEvent::Line("x = 1".into())
        );
        assert_eq!(line_event(Err(ReadlineError::Eof)).unwrap(), LineEvent::EndOfInput);
        assert_eq!(
            line_event(Err(ReadlineError::Interrupted)).unwrap(),
            LineEvent::Interrupted
        );
        let err = line_event(Err(ReadlineError::Io(std::io::Error::other("tty gone")))).unwrap_err();
        assert_eq!(err.to_string(), "tty gone");
    }

    #[tokio::test]
    async fn test_interruptible_completes() {
        assert_eq!(interruptible(async { 7 }).await, Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interruptible_stops_on_sigint() {
        let kill = format!("kill -INT {}", std::process::id());
        let task = async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            tokio::process::Command::new("sh")
                .args(["-c", &kill])
                .status()
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            "finished"
        };
        assert_eq!(interruptible(task).await, None);
    }
}
