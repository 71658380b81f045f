//! Error types for jrebuild-platform

use thiserror::Error;

/// Errors that can occur in platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("unsupported operating system: {0}")]
  UnsupportedOs(String),

  #[error("unsupported CPU architecture: {0}")]
  UnsupportedArch(String),

  #[error("failed to get hostname")]
  Hostname,
}
