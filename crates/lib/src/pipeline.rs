//! The seven-step build pipeline.
//!
//! Prepare → Fetch → Configure → Build → Assemble → Package → Verify,
//! strictly sequential. The first failing step aborts the run with a
//! [`StepError`] naming it; the only loops are the bounded retries
//! inside the prepare step. A Ctrl-C removes the transient trees before
//! the process exits.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use jrebuild_platform::{HostInfo, Os};

use crate::assemble::{self, AssembleError, AssembleReport};
use crate::build::{self, BuildStepError};
use crate::config::BuildConfig;
use crate::configure::{self, ConfigureError};
use crate::exec::Runner;
use crate::fetch::{self, FetchError, FetchOutcome};
use crate::package::{self, PackageError, PackageReport};
use crate::prepare::{self, PrepareError, PrepareReport};
use crate::verify::{self, VerifyError, VerifyReport};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Prepare,
  Fetch,
  Configure,
  Build,
  Assemble,
  Package,
  Verify,
}

impl Step {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Prepare => "prepare",
      Self::Fetch => "fetch",
      Self::Configure => "configure",
      Self::Build => "build",
      Self::Assemble => "assemble",
      Self::Package => "package",
      Self::Verify => "verify",
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A step failed; the pipeline stopped there.
#[derive(Debug, Error)]
#[error("{step} step failed: {source}")]
pub struct StepError {
  pub step: Step,
  #[source]
  pub source: StepFailure,
}

#[derive(Debug, Error)]
pub enum StepFailure {
  #[error(transparent)]
  Prepare(#[from] PrepareError),
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Configure(#[from] ConfigureError),
  #[error(transparent)]
  Build(#[from] BuildStepError),
  #[error(transparent)]
  Assemble(#[from] AssembleError),
  #[error(transparent)]
  Package(#[from] PackageError),
  #[error(transparent)]
  Verify(#[from] VerifyError),
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct PipelineReport {
  pub prepare: PrepareReport,
  pub fetch: FetchOutcome,
  pub assemble: AssembleReport,
  pub package: PackageReport,
  pub verify: VerifyReport,
  pub elapsed: Duration,
}

/// One build run over an immutable config and host description.
pub struct Pipeline<'a> {
  config: &'a BuildConfig,
  host: &'a HostInfo,
  runner: Runner,
}

impl<'a> Pipeline<'a> {
  pub fn new(config: &'a BuildConfig, host: &'a HostInfo) -> Self {
    Self {
      config,
      host,
      runner: Runner::new(),
    }
  }

  /// Use a custom runner (tests swap in a private `PATH`).
  pub fn with_runner(config: &'a BuildConfig, host: &'a HostInfo, runner: Runner) -> Self {
    Self {
      config,
      host,
      runner,
    }
  }

  pub async fn run(&self) -> Result<PipelineReport, StepError> {
    if self.host.platform.os != Os::FreeBsd {
      warn!(os = %self.host.platform.os, "not a FreeBSD host, the build will likely not link statically");
    }

    install_interrupt_cleanup(vec![self.config.source_dir(), self.config.image_dir()]);

    let started = Instant::now();

    let prepare = self
      .step(Step::Prepare, prepare::prepare(self.config, &self.runner))
      .await?;

    let fetch = {
      let step_started = Instant::now();
      info!(step = %Step::Fetch, "starting");
      let outcome = fetch::fetch_source(self.config).map_err(|e| fail(Step::Fetch, e))?;
      info!(step = %Step::Fetch, elapsed = ?step_started.elapsed(), "completed");
      outcome
    };

    self
      .step(
        Step::Configure,
        configure::configure(self.config, &self.runner),
      )
      .await?;

    self
      .step(
        Step::Build,
        build::build_images(self.config, &self.runner, self.host.cpus),
      )
      .await?;

    // If the run dies between here and a finished archive, the partial
    // image is useless; remove it on the way out.
    let guard = CleanupGuard::new(self.config.image_dir());

    let assemble = {
      info!(step = %Step::Assemble, "starting");
      assemble::assemble(self.config).map_err(|e| fail(Step::Assemble, e))?
    };

    let package = self
      .step(
        Step::Package,
        package::package(self.config, &self.runner, self.host),
      )
      .await?;
    guard.disarm();

    let verify = self
      .step(
        Step::Verify,
        verify::verify(&self.config.image_dir(), &self.runner),
      )
      .await?;

    Ok(PipelineReport {
      prepare,
      fetch,
      assemble,
      package,
      verify,
      elapsed: started.elapsed(),
    })
  }

  async fn step<T, E>(
    &self,
    step: Step,
    fut: impl Future<Output = Result<T, E>>,
  ) -> Result<T, StepError>
  where
    E: Into<StepFailure>,
  {
    let started = Instant::now();
    info!(step = %step, "starting");
    let value = fut.await.map_err(|e| fail(step, e))?;
    info!(step = %step, elapsed = ?started.elapsed(), "completed");
    Ok(value)
  }
}

fn fail(step: Step, source: impl Into<StepFailure>) -> StepError {
  StepError {
    step,
    source: source.into(),
  }
}

/// Remove the transient trees on Ctrl-C, then exit 130.
fn install_interrupt_cleanup(paths: Vec<PathBuf>) {
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!("interrupted, removing transient build directories");
      for path in &paths {
        if path.exists() {
          if let Err(error) = std::fs::remove_dir_all(path) {
            eprintln!("failed to remove {}: {}", path.display(), error);
          }
        }
      }
      std::process::exit(130);
    }
  });
}

/// Removes a directory on drop unless disarmed.
#[derive(Debug)]
pub struct CleanupGuard {
  path: PathBuf,
  armed: bool,
}

impl CleanupGuard {
  pub fn new(path: PathBuf) -> Self {
    Self { path, armed: true }
  }

  /// The output is complete; keep it.
  pub fn disarm(mut self) {
    self.armed = false;
  }
}

impl Drop for CleanupGuard {
  fn drop(&mut self) {
    if self.armed && self.path.exists() {
      debug!(path = %self.path.display(), "removing partial output");
      if let Err(error) = std::fs::remove_dir_all(&self.path) {
        warn!(path = %self.path.display(), %error, "cleanup failed");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn cleanup_guard_removes_dir_on_drop() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("partial");
    std::fs::create_dir_all(dir.join("sub")).unwrap();

    let guard = CleanupGuard::new(dir.clone());
    drop(guard);
    assert!(!dir.exists());
  }

  #[test]
  fn disarmed_guard_keeps_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("done");
    std::fs::create_dir_all(&dir).unwrap();

    let guard = CleanupGuard::new(dir.clone());
    guard.disarm();
    assert!(dir.exists());
  }

  #[test]
  fn step_names_match_execution_order() {
    let order = [
      Step::Prepare,
      Step::Fetch,
      Step::Configure,
      Step::Build,
      Step::Assemble,
      Step::Package,
      Step::Verify,
    ];
    let names: Vec<_> = order.iter().map(|s| s.as_str()).collect();
    assert_eq!(
      names,
      ["prepare", "fetch", "configure", "build", "assemble", "package", "verify"]
    );
  }
}
