//! Interactive session driver for an attached VM.

use crate::error::Result;
use crate::guard::AttachGuard;
use luavm_vm::VmBackend;
use std::fmt;
use std::io::Write;

/// Trimmed inputs that end a session.
pub const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// One event from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A line of input, without the trailing newline.
    Line(String),
    /// The input stream ended (Ctrl-D).
    EndOfInput,
    /// The operator pressed Ctrl-C.
    Interrupted,
}

/// Source of operator input for an attach session.
pub trait LineSource {
    /// Show `prompt` and read the next event.
    fn read_line(&mut self, prompt: &str) -> std::io::Result<LineEvent>;

    /// Remember a line that was sent to the VM.
    fn add_history(&mut self, _line: &str) {}
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Operator typed `exit` or `quit`.
    ExitCommand,
    /// Input stream ended.
    EndOfInput,
    /// Operator interrupted the session.
    Interrupted,
    /// The VM could not be talked to.
    BackendFailure,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCommand => write!(f, "exit command"),
            Self::EndOfInput => write!(f, "end of input"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::BackendFailure => write!(f, "backend failure"),
        }
    }
}

/// Outcome of [`run_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Why the session ended.
    pub reason: ExitReason,
    /// Lines forwarded to the VM.
    pub lines_sent: usize,
}

/// Prompt shown while attached to `id`.
pub fn prompt_for(id: &str) -> String {
    format!("lua[{id}]> ")
}

fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.contains(&line.trim())
}

/// Run the interactive loop for the VM held by `guard`.
///
/// Reads lines from `lines`, forwards each non-blank line to the VM and
/// writes the VM's answer to `out`. Detaching is left to the guard, so the
/// record is released however this function returns.
///
/// # Errors
///
/// Only errors from the line source or the output sink are returned;
/// backend failures end the session with [`ExitReason::BackendFailure`].
pub async fn run_session<B, L, W>(
    backend: &mut B,
    guard: &AttachGuard<'_>,
    lines: &mut L,
    out: &mut W,
) -> Result<SessionSummary>
where
    B: VmBackend + ?Sized,
    L: LineSource + ?Sized,
    W: Write + ?Sized,
{
    let id = guard.id();
    let prompt = prompt_for(id);
    let mut lines_sent = 0;

    let reason = loop {
        let line = match lines.read_line(&prompt)? {
            LineEvent::Line(line) => line,
            LineEvent::EndOfInput => break ExitReason::EndOfInput,
            LineEvent::Interrupted => break ExitReason::Interrupted,
        };

        if is_exit_command(&line) {
            break ExitReason::ExitCommand;
        }
        if line.trim().is_empty() {
            continue;
        }

        lines.add_history(&line);
        if let Err(e) = backend.send_input(id, &line).await {
            tracing::warn!(vm_id = %id, error = %e, "Failed to send input");
            writeln!(out, "Error talking to VM '{id}': {e}")?;
            break ExitReason::BackendFailure;
        }
        lines_sent += 1;

        match backend.read_output(id).await {
            Ok(output) => {
                let output = output.trim_end();
                if !output.is_empty() {
                    writeln!(out, "{output}")?;
                }
            }
            Err(e) => {
                tracing::warn!(vm_id = %id, error = %e, "Failed to read output");
                writeln!(out, "Error talking to VM '{id}': {e}")?;
                break ExitReason::BackendFailure;
            }
        }
    };

    out.flush()?;
    tracing::info!(vm_id = %id, reason = %reason, lines_sent, "Session ended");
    Ok(SessionSummary { reason, lines_sent })
}
