//! Artifact verification: run the produced runtime, inspect its linkage.
//!
//! The version query is the real test; the `ldd` listing is purely
//! informational because a fully static binary legitimately reports no
//! dynamic dependencies (and some `ldd` implementations exit non-zero
//! when told so).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::exec::{Cmd, ExecError, Runner};

#[derive(Debug, Error)]
pub enum VerifyError {
  #[error("runtime binary not found: {0}")]
  JavaMissing(PathBuf),

  #[error("runtime binary is not executable: {0}")]
  NotExecutable(PathBuf),

  #[error("version query failed: {0}")]
  VersionQuery(#[source] ExecError),
}

/// What verification observed.
#[derive(Debug)]
pub struct VerifyReport {
  /// Output of `java -version`.
  pub version_output: String,
  /// Output of `ldd` on the binary, `None` when it listed nothing (or
  /// was unavailable).
  pub dynamic_deps: Option<String>,
}

/// Verify an assembled image: the runtime exists, runs, and its linkage
/// is reported.
pub async fn verify(image_dir: &Path, runner: &Runner) -> Result<VerifyReport, VerifyError> {
  let java = image_dir.join("bin").join("java");

  if !java.is_file() {
    return Err(VerifyError::JavaMissing(java));
  }
  if !is_executable(&java) {
    return Err(VerifyError::NotExecutable(java));
  }

  let output = runner
    .output(&Cmd::new(&java).arg("-version"))
    .await
    .map_err(VerifyError::VersionQuery)?;

  // java prints its version banner to stderr.
  let stderr = String::from_utf8_lossy(&output.stderr);
  let stdout = String::from_utf8_lossy(&output.stdout);
  let version_output = if stderr.trim().is_empty() {
    stdout.trim().to_string()
  } else {
    stderr.trim().to_string()
  };
  info!(output = %version_output, "runtime answered version query");

  let dynamic_deps = match runner.output(&Cmd::new("ldd").arg(&java)).await {
    Ok(out) => {
      let listing = String::from_utf8_lossy(&out.stdout).trim().to_string();
      if listing.is_empty() { None } else { Some(listing) }
    }
    Err(error) => {
      debug!(%error, "ldd reported nothing (static binary or ldd unavailable)");
      None
    }
  };

  Ok(VerifyReport {
    version_output,
    dynamic_deps,
  })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  std::fs::metadata(path)
    .map(|m| m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
  true
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use std::fs;
  use std::os::unix::fs::PermissionsExt;

  use tempfile::TempDir;

  use super::*;

  fn write_java(image: &Path, script: &str, mode: u32) {
    let bin = image.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let java = bin.join("java");
    fs::write(&java, format!("#!/bin/sh\n{script}\n")).unwrap();
    fs::set_permissions(&java, fs::Permissions::from_mode(mode)).unwrap();
  }

  #[tokio::test]
  async fn missing_java_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = verify(temp.path(), &Runner::new()).await.unwrap_err();
    assert!(matches!(err, VerifyError::JavaMissing(_)));
  }

  #[tokio::test]
  async fn non_executable_java_is_fatal() {
    let temp = TempDir::new().unwrap();
    write_java(temp.path(), "exit 0", 0o644);
    let err = verify(temp.path(), &Runner::new()).await.unwrap_err();
    assert!(matches!(err, VerifyError::NotExecutable(_)));
  }

  #[tokio::test]
  async fn version_banner_is_captured_from_stderr() {
    let temp = TempDir::new().unwrap();
    write_java(
      temp.path(),
      r#"echo 'openjdk version "17.0.12"' >&2"#,
      0o755,
    );
    // Empty PATH: ldd is unavailable, which must stay non-fatal.
    let empty = TempDir::new().unwrap();
    let runner = Runner::new().env("PATH", empty.path());

    let report = verify(temp.path(), &runner).await.unwrap();
    assert!(report.version_output.contains("openjdk version"));
    assert!(report.dynamic_deps.is_none());
  }

  #[tokio::test]
  async fn failing_version_query_is_fatal() {
    let temp = TempDir::new().unwrap();
    write_java(temp.path(), "exit 2", 0o755);
    let err = verify(temp.path(), &Runner::new()).await.unwrap_err();
    assert!(matches!(err, VerifyError::VersionQuery(_)));
  }
}
