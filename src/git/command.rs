use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

use crate::error::{ChangehelperError, Result};

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `-1` when the process was killed by a signal
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

fn drain<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run `program` with `args` in `dir` and wait for it.
///
/// Stdout and stderr are drained on two threads so that neither pipe can
/// fill up while the other is being read. A non-zero exit is not an error
/// here; callers decide.
pub fn run_command(dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!(dir = %dir.display(), command = %command_line, "running");

    let exec_error = |reason: String| ChangehelperError::Exec {
        command: command_line.clone(),
        reason,
    };

    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| exec_error(e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| exec_error("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| exec_error("stderr was not captured".to_string()))?;

    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let stdout = stdout_reader
        .join()
        .map_err(|_| exec_error("stdout reader panicked".to_string()))??;
    let stderr = stderr_reader
        .join()
        .map_err(|_| exec_error("stderr reader panicked".to_string()))??;

    let status = child.wait()?;
    let code = status.code().unwrap_or(-1);
    debug!(command = %command_line, code, "finished");
    if !stderr.trim().is_empty() {
        debug!(command = %command_line, stderr = %stderr.trim(), "stderr");
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        code,
    })
}
