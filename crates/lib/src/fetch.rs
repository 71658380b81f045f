//! Shallow fetch of the OpenJDK source tree.
//!
//! The tree for version N lands at `<work>/jdkNu`. A directory that
//! already contains `.git` is trusted and the clone is skipped, so
//! re-running the pipeline (or resuming after a build failure) never
//! re-downloads the sources. Clones are depth 1: the pipeline builds one
//! tip, history is dead weight.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::versions::{self, UnsupportedVersion};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error(transparent)]
  Version(#[from] UnsupportedVersion),

  /// Failed to clone the repository.
  #[error("failed to clone '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to check out the cloned worktree.
  #[error("failed to check out worktree at '{path}': {source}")]
  Checkout {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

/// What the fetch step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The source tree was already present; no clone was performed.
  Existing,
  /// A fresh shallow clone was created.
  Cloned,
}

/// Fetch the source tree for the configured version.
///
/// The version is resolved against the fixed repository table first, so
/// an unsupported version fails before any network activity.
pub fn fetch_source(config: &BuildConfig) -> Result<FetchOutcome, FetchError> {
  let url = versions::source_repo(&config.version)?;
  let dest = config.source_dir();

  if dest.join(".git").exists() {
    info!(path = %dest.display(), "source tree already present, skipping clone");
    return Ok(FetchOutcome::Existing);
  }

  info!(url, path = %dest.display(), "cloning source tree (depth 1)");
  clone_shallow(url, &dest)?;
  debug!(path = %dest.display(), "clone complete");

  Ok(FetchOutcome::Cloned)
}

/// Depth-1 clone with checkout.
fn clone_shallow(url: &str, dest: &Path) -> Result<(), FetchError> {
  let mut prepared = gix::prepare_clone(url, dest)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN));

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (_repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Checkout {
      path: dest.to_path_buf(),
      source: Box::new(e),
    })?;

  Ok(())
}
