//! Build execution: the upstream parallel `gmake images` invocation.
//!
//! Parallelism is sized to the host CPU count; everything else is the
//! upstream build's business, including its own logs, which pass
//! straight through.

use thiserror::Error;
use tracing::info;

use crate::config::BuildConfig;
use crate::exec::{Cmd, ExecError, Runner};

#[derive(Debug, Error)]
pub enum BuildStepError {
  #[error("gmake images failed: {0}")]
  Make(#[source] ExecError),
}

/// Run `gmake images` in the source tree with `JOBS` sized to the host.
pub async fn build_images(
  config: &BuildConfig,
  runner: &Runner,
  cpus: usize,
) -> Result<(), BuildStepError> {
  let jobs = cpus.max(1);
  info!(jobs, timeout = ?config.build_timeout, "building images");

  let cmd = Cmd::new("gmake")
    .arg("images")
    .arg(format!("JOBS={jobs}"))
    .current_dir(config.source_dir())
    .timeout(config.build_timeout);

  runner.status(&cmd).await.map_err(BuildStepError::Make)
}
