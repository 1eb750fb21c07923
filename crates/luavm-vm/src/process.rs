//! Lua interpreter subprocess with a line-oriented REPL.
//!
//! The interpreter is started with a small bootstrap chunk that reads stdin
//! line by line, evaluates each complete chunk and prints [`READY_MARKER`]
//! after every line. The host counts markers to know when a VM has finished
//! answering, instead of sleeping for a fixed time.

use crate::config::VmOptions;
use crate::error::{Result, VmError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Line printed by the bootstrap after each input line has been handled.
pub const READY_MARKER: &str = "__luavm_ready__";

/// REPL bootstrap passed to the interpreter with `-e`.
///
/// Works on Lua 5.1 through 5.4: expressions are echoed like the stock REPL,
/// incomplete chunks are buffered until they compile.
const REPL_BOOTSTRAP: &str = r##"
io.stdout:setvbuf("no")
local load = loadstring or load
local MARKER = "__luavm_ready__"
local pending = nil
local function compile(src)
  local fn = load("return " .. src, "=stdin")
  if fn then return fn end
  return load(src, "=stdin")
end
local function show(ok, ...)
  if not ok then
    print("error: " .. tostring((...)))
  elseif select("#", ...) > 0 then
    print(...)
  end
end
for line in io.stdin:lines() do
  local src = pending and (pending .. "\n" .. line) or line
  local fn, err = compile(src)
  if fn then
    pending = nil
    show(pcall(fn))
  elseif err and err:find("<eof>'?$") then
    pending = src
  else
    pending = nil
    print("error: " .. tostring(err))
  end
  print(MARKER)
  io.stdout:flush()
end
"##;

#[derive(Debug)]
enum Output {
    Line(String),
    Ready,
    Closed,
}

/// A running Lua interpreter.
pub struct LuaProcess {
    child: Child,
    stdin: ChildStdin,
    output_rx: mpsc::UnboundedReceiver<Output>,
    readers: Vec<JoinHandle<()>>,
    /// Lines written whose ready marker has not been read yet.
    pending: usize,
    exited: bool,
}

impl LuaProcess {
    /// Spawn the interpreter with the REPL bootstrap.
    pub fn spawn(interpreter: &Path, options: &VmOptions) -> Result<Self> {
        tracing::debug!(interpreter = %interpreter.display(), ?options, "Spawning Lua interpreter");

        let mut command = Command::new(interpreter);
        command.arg("-e").arg(REPL_BOOTSTRAP);
        if options.networked {
            command.env("LUAVM_NETWORKED", "1");
        }
        Self::spawn_command(command)
    }

    /// Spawn any program speaking the ready-marker protocol.
    fn spawn_command(mut command: Command) -> Result<Self> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| VmError::Spawn {
            program: command.as_std().get_program().to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VmError::Config("interpreter stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VmError::Config("interpreter stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VmError::Config("interpreter stderr not captured".into()))?;

        let (tx, output_rx) = mpsc::unbounded_channel();
        let readers = vec![
            tokio::spawn(forward_lines(stdout, tx.clone(), true)),
            tokio::spawn(forward_lines(stderr, tx, false)),
        ];

        tracing::debug!(pid = ?child.id(), "Lua interpreter spawned");
        Ok(Self {
            child,
            stdin,
            output_rx,
            readers,
            pending: 0,
            exited: false,
        })
    }

    /// OS process id, if the process is still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether the interpreter has closed its output.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Write text to the interpreter's stdin.
    ///
    /// A trailing newline is appended when missing so that the last line is
    /// evaluated.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        if self.exited {
            return Err(VmError::Exited("interpreter".into()));
        }
        let mut payload = text.to_string();
        if !payload.ends_with('\n') {
            payload.push('\n');
        }
        let lines = payload.matches('\n').count();

        self.stdin.write_all(payload.as_bytes()).await?;
        self.stdin.flush().await?;
        self.pending += lines;
        tracing::trace!(lines, pending = self.pending, "Input written");
        Ok(())
    }

    /// Collect output until every pending line has been answered or `wait`
    /// elapses. Output arriving after the deadline is returned by the next
    /// call.
    pub async fn read_output(&mut self, wait: Duration) -> Result<String> {
        let deadline = tokio::time::Instant::now() + wait;
        let mut lines = Vec::new();

        while self.pending > 0 && !self.exited {
            match tokio::time::timeout_at(deadline, self.output_rx.recv()).await {
                Ok(Some(event)) => self.absorb(event, &mut lines),
                Ok(None) => self.exited = true,
                Err(_) => {
                    tracing::debug!(pending = self.pending, "Output wait elapsed");
                    break;
                }
            }
        }

        // Whatever else is already queued, typically stderr.
        while let Ok(event) = self.output_rx.try_recv() {
            self.absorb(event, &mut lines);
        }

        Ok(lines.join("\n"))
    }

    fn absorb(&mut self, event: Output, lines: &mut Vec<String>) {
        match event {
            Output::Line(line) => lines.push(line),
            Output::Ready => self.pending = self.pending.saturating_sub(1),
            Output::Closed => {
                self.exited = true;
                self.pending = 0;
            }
        }
    }

    /// Kill the interpreter and stop the reader tasks.
    pub async fn kill(&mut self) -> Result<()> {
        if let Err(e) = self.child.kill().await {
            // An already exited child is fine, anything else is not.
            if self.child.try_wait()?.is_none() {
                return Err(e.into());
            }
            tracing::debug!(error = %e, "Interpreter already exited");
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.exited = true;
        self.pending = 0;
        Ok(())
    }
}

async fn forward_lines<R>(stream: R, tx: mpsc::UnboundedSender<Output>, is_stdout: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let event = if is_stdout && line == READY_MARKER {
                    Output::Ready
                } else {
                    Output::Line(line)
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read interpreter output");
                break;
            }
        }
    }
    if is_stdout {
        let _ = tx.send(Output::Closed);
    }
}
