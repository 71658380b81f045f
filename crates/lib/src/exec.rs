//! External-command execution with timeouts and retries.
//!
//! Every external program the pipeline drives (`pkg`, `bash configure`,
//! `gmake`, `strip`, `ldd`, the produced `java`) goes through [`Runner`].
//! The runner applies process-wide environment overrides, which is also
//! the test seam: integration tests point `PATH` at a directory of fake
//! executables and exercise the real spawning code.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
  /// The program was not found on `PATH`.
  #[error("command not found: {0}")]
  NotFound(String),

  /// The command ran and exited non-zero (or was killed by a signal).
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },

  /// The wall-clock bound elapsed; the child was killed.
  #[error("command timed out after {timeout:?}: {cmd}")]
  TimedOut { cmd: String, timeout: Duration },

  /// Spawning or waiting failed for another reason.
  #[error("io error running {cmd}: {source}")]
  Io {
    cmd: String,
    #[source]
    source: std::io::Error,
  },
}

/// A single external command invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
  program: OsString,
  args: Vec<OsString>,
  envs: BTreeMap<String, OsString>,
  cwd: Option<PathBuf>,
  timeout: Option<Duration>,
}

impl Cmd {
  pub fn new(program: impl AsRef<std::ffi::OsStr>) -> Self {
    Self {
      program: program.as_ref().to_os_string(),
      args: Vec::new(),
      envs: BTreeMap::new(),
      cwd: None,
      timeout: None,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
  {
    for arg in args {
      self.args.push(arg.as_ref().to_os_string());
    }
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl AsRef<std::ffi::OsStr>) -> Self {
    self.envs.insert(key.into(), value.as_ref().to_os_string());
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Wall-clock bound for the whole invocation.
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Human-readable form for logs and error messages.
  pub fn display(&self) -> String {
    let mut parts = vec![self.program.to_string_lossy().into_owned()];
    parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
  }
}

/// Runs external commands, applying environment overrides shared by the
/// whole run (e.g. `ASSUME_ALWAYS_YES` for pkg, `PATH` in tests).
#[derive(Debug, Clone, Default)]
pub struct Runner {
  envs: BTreeMap<String, OsString>,
}

impl Runner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn env(mut self, key: impl Into<String>, value: impl AsRef<std::ffi::OsStr>) -> Self {
    self.envs.insert(key.into(), value.as_ref().to_os_string());
    self
  }

  /// Run a command capturing stdout/stderr. Non-zero exit is an error.
  pub async fn output(&self, cmd: &Cmd) -> Result<Output, ExecError> {
    let mut command = self.command(cmd);
    command.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!(cmd = %cmd.display(), "running");
    let output = match cmd.timeout {
      Some(timeout) => tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ExecError::TimedOut {
          cmd: cmd.display(),
          timeout,
        })?,
      None => command.output().await,
    }
    .map_err(|source| spawn_error(cmd, source))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.trim().is_empty() {
        debug!(cmd = %cmd.display(), stderr = %stderr.trim(), "command stderr");
      }
      return Err(ExecError::Failed {
        cmd: cmd.display(),
        code: output.status.code(),
      });
    }

    Ok(output)
  }

  /// Run a command with inherited stdio, for long externals whose logs
  /// should pass straight through (configure, gmake). Non-zero exit is
  /// an error.
  pub async fn status(&self, cmd: &Cmd) -> Result<(), ExecError> {
    let mut command = self.command(cmd);

    debug!(cmd = %cmd.display(), "running (streamed)");
    let status = match cmd.timeout {
      Some(timeout) => tokio::time::timeout(timeout, command.status())
        .await
        .map_err(|_| ExecError::TimedOut {
          cmd: cmd.display(),
          timeout,
        })?,
      None => command.status().await,
    }
    .map_err(|source| spawn_error(cmd, source))?;

    if !status.success() {
      return Err(ExecError::Failed {
        cmd: cmd.display(),
        code: status.code(),
      });
    }

    Ok(())
  }

  fn command(&self, cmd: &Cmd) -> Command {
    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args);
    for (key, value) in &self.envs {
      command.env(key, value);
    }
    for (key, value) in &cmd.envs {
      command.env(key, value);
    }
    if let Some(cwd) = &cmd.cwd {
      command.current_dir(cwd);
    }
    // A dropped future (timeout) must not leave the child running.
    command.kill_on_drop(true);
    command
  }
}

fn spawn_error(cmd: &Cmd, source: std::io::Error) -> ExecError {
  if source.kind() == std::io::ErrorKind::NotFound {
    ExecError::NotFound(cmd.program.to_string_lossy().into_owned())
  } else {
    ExecError::Io {
      cmd: cmd.display(),
      source,
    }
  }
}

/// Bounded retry policy: `attempts` tries with a fixed `backoff` pause
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
  pub attempts: u32,
  pub backoff: Duration,
}

impl Retry {
  pub const fn new(attempts: u32, backoff: Duration) -> Self {
    Self { attempts, backoff }
  }
}

/// Run `op` up to `policy.attempts` times. Every failed attempt is logged
/// as a warning; the last error is returned on exhaustion. Callers decide
/// whether exhaustion is fatal.
pub async fn retry<T, E, F, Fut>(what: &str, policy: Retry, mut op: F) -> Result<T, E>
where
  E: std::fmt::Display,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let attempts = policy.attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(error) if attempt < attempts => {
        warn!(what, attempt, max = attempts, %error, "attempt failed, retrying");
        tokio::time::sleep(policy.backoff).await;
        attempt += 1;
      }
      Err(error) => {
        warn!(what, attempt, max = attempts, %error, "attempt failed, giving up");
        return Err(error);
      }
    }
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  fn sh(script: &str) -> Cmd {
    Cmd::new("/bin/sh").arg("-c").arg(script)
  }

  #[tokio::test]
  async fn output_captures_stdout() {
    let out = Runner::new().output(&sh("echo hello")).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
  }

  #[tokio::test]
  async fn cmd_env_reaches_the_child() {
    let cmd = sh("echo $MARKER").env("MARKER", "set-by-cmd");
    let out = Runner::new().output(&cmd).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "set-by-cmd");
  }

  #[tokio::test]
  async fn runner_env_reaches_the_child() {
    let runner = Runner::new().env("MARKER", "set-by-runner");
    let out = runner.output(&sh("echo $MARKER")).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "set-by-runner");
  }

  #[tokio::test]
  async fn nonzero_exit_is_failed() {
    let err = Runner::new().output(&sh("exit 3")).await.unwrap_err();
    assert!(matches!(err, ExecError::Failed { code: Some(3), .. }));
  }

  #[tokio::test]
  async fn missing_program_is_not_found() {
    let err = Runner::new()
      .output(&Cmd::new("definitely-not-a-real-program"))
      .await
      .unwrap_err();
    assert!(matches!(err, ExecError::NotFound(_)));
  }

  #[tokio::test]
  async fn timeout_kills_the_child() {
    let cmd = sh("sleep 5").timeout(Duration::from_millis(50));
    let err = Runner::new().output(&cmd).await.unwrap_err();
    assert!(matches!(err, ExecError::TimedOut { .. }));
  }

  #[tokio::test]
  async fn retry_returns_first_success() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, ExecError> =
      retry("flaky", Retry::new(3, Duration::ZERO), || async {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n < 2 {
          Err(ExecError::NotFound("flaky".into()))
        } else {
          Ok(n)
        }
      })
      .await;
    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn retry_exhaustion_returns_last_error() {
    let calls = AtomicU32::new(0);
    let result: Result<(), ExecError> =
      retry("always-down", Retry::new(3, Duration::ZERO), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ExecError::NotFound("always-down".into()))
      })
      .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn display_joins_program_and_args() {
    let cmd = Cmd::new("pkg").args(["update", "-f"]);
    assert_eq!(cmd.display(), "pkg update -f");
  }
}
