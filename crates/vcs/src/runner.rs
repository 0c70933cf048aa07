//! Minimal external-command runner used by the git facade.
//! （git 門面使用的精簡外部指令執行器。）
//!
//! Wraps `std::process::Command` with captured output, an optional working
//! directory, and an optional timeout that kills the process on expiry.
//! 封裝 `std::process::Command`，擷取輸出、支援工作目錄與逾時強制終止。

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors that may surface while spawning or reaping a command.
/// （啟動或等待指令時可能發生的錯誤。）
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn process: {0}")]
    Spawn(io::Error),
    #[error("failed to read process output: {0}")]
    Output(io::Error),
    #[error("failed to poll process status: {0}")]
    Poll(io::Error),
    #[error("failed to terminate process: {0}")]
    Kill(io::Error),
}

/// One external command invocation.
/// （單次外部指令呼叫的設定。）
#[derive(Clone, Debug)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Creates an invocation of the given program.
    /// （以指定的程式建立指令。）
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    /// Appends arguments to the command line.
    /// （加入指令參數。）
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    /// （設定工作目錄。）
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Applies an execution timeout; the process is killed on expiry.
    /// （設定執行逾時；逾時後強制終止進程。）
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the command and captures its output.
    /// （執行指令並擷取輸出。）
    pub fn run(&self) -> Result<ToolOutput, ToolError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        log::debug!("running {} {}", self.program, self.args.join(" "));

        let start = Instant::now();
        let mut child = command.spawn().map_err(ToolError::Spawn)?;

        let mut timed_out = false;
        let output = match self.timeout {
            Some(timeout) => loop {
                if child.try_wait().map_err(ToolError::Poll)?.is_some() {
                    break child.wait_with_output().map_err(ToolError::Output)?;
                }
                if start.elapsed() >= timeout {
                    child.kill().map_err(ToolError::Kill)?;
                    timed_out = true;
                    break child.wait_with_output().map_err(ToolError::Output)?;
                }
                thread::sleep(Duration::from_millis(15));
            },
            None => child.wait_with_output().map_err(ToolError::Output)?,
        };

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            timed_out,
        })
    }
}

/// Captured result of a command invocation.
/// （指令執行完成後的結果。）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl ToolOutput {
    /// Indicates whether the command exited successfully (code `0`).
    /// （判斷指令是否以 0 結束。）
    pub fn success(&self) -> bool {
        !self.timed_out && matches!(self.exit_code, Some(0))
    }

    /// Returns stdout as trimmed UTF-8 text (lossy).
    /// （以寬鬆 UTF-8 取得修剪後的標準輸出。）
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim_end().to_string()
    }

    /// Returns stderr as trimmed UTF-8 text (lossy).
    /// （以寬鬆 UTF-8 取得修剪後的錯誤輸出。）
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn captures_stdout_and_exit_code() {
        let output = ToolCommand::new("sh")
            .args(["-c", "printf 'hello'"])
            .run()
            .expect("command should execute");
        assert!(output.success());
        assert_eq!(output.stdout_text(), "hello");
        assert!(output.stderr_text().is_empty());
    }

    #[test]
    fn honours_the_working_directory() {
        let temp = tempdir().expect("tempdir should be created");
        let output = ToolCommand::new("sh")
            .args(["-c", "pwd"])
            .current_dir(temp.path())
            .run()
            .expect("command should execute");
        assert!(output.success());
        assert!(output.stdout_text().ends_with(
            temp.path()
                .file_name()
                .and_then(|name| name.to_str())
                .expect("tempdir name should be UTF-8")
        ));
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let output = ToolCommand::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .run()
            .expect("command should execute");
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr_text(), "oops");
    }

    #[test]
    fn timeout_kills_the_process() {
        let output = ToolCommand::new("sh")
            .args(["-c", "sleep 5"])
            .timeout(Some(Duration::from_millis(100)))
            .run()
            .expect("command should be reaped after the kill");
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let err = ToolCommand::new("codepp-no-such-binary")
            .run()
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn(_)));
    }
}
