//! Build configuration.
//!
//! A `BuildConfig` is constructed once at process start from CLI flags
//! and environment variables, then passed read-only to every pipeline
//! step. The target version is validated here, so an unsupported version
//! fails before any step runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use jrebuild_platform::Platform;

use crate::versions::{self, UnsupportedVersion};

/// Version built when neither the CLI nor `JDK_VERSION` names one.
pub const DEFAULT_VERSION: &str = "17";

/// Default wall-clock bound for network-facing pkg and clone operations.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(600);

/// Default wall-clock bound for the configure and gmake invocations.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(3 * 60 * 60);

/// Default attempt count for retried network operations.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default pause between retry attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// Where pkg repository channel configuration lives on FreeBSD.
const PKG_REPO_CONF: &str = "/usr/local/etc/pkg/repos/FreeBSD.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Version(#[from] UnsupportedVersion),

  #[error("invalid duration in {var}: '{value}'")]
  InvalidDuration {
    var: &'static str,
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  #[error("invalid number in {var}: '{value}'")]
  InvalidNumber {
    var: &'static str,
    value: String,
    #[source]
    source: std::num::ParseIntError,
  },
}

/// Immutable parameters for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Target JDK version, e.g. "17". Always present in the tables.
  pub version: String,
  /// Directory the run works in: sources, image, and archive land here.
  pub work_dir: PathBuf,
  /// pkg repository channel configuration file rewritten by the prepare
  /// step. Relocatable so tests never touch the real one.
  pub pkg_repo_conf: PathBuf,
  /// Wall-clock bound for pkg operations.
  pub network_timeout: Duration,
  /// Wall-clock bound for configure and gmake.
  pub build_timeout: Duration,
  /// Attempt count for retried network operations.
  pub retry_attempts: u32,
  /// Pause between retry attempts.
  pub retry_backoff: Duration,
  /// Suppress interactive pkg prompts.
  pub assume_yes: bool,
}

impl BuildConfig {
  /// Build a config from defaults, the environment, and an optional
  /// explicit version (CLI beats `JDK_VERSION` beats the default).
  pub fn from_env(version: Option<&str>, work_dir: &Path) -> Result<Self, ConfigError> {
    Self::from_lookup(version, work_dir, |var| std::env::var(var).ok())
  }

  /// Same as [`from_env`](Self::from_env) with an explicit variable
  /// lookup, so tests can inject an environment.
  pub fn from_lookup(
    version: Option<&str>,
    work_dir: &Path,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> Result<Self, ConfigError> {
    let version = match version {
      Some(v) => v.to_string(),
      None => lookup("JDK_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
    };
    // Fail unsupported versions here, before any step runs.
    versions::source_repo(&version)?;

    let network_timeout =
      duration_var(&lookup, "JREBUILD_NETWORK_TIMEOUT")?.unwrap_or(DEFAULT_NETWORK_TIMEOUT);
    let build_timeout =
      duration_var(&lookup, "JREBUILD_BUILD_TIMEOUT")?.unwrap_or(DEFAULT_BUILD_TIMEOUT);
    let retry_backoff =
      duration_var(&lookup, "JREBUILD_RETRY_BACKOFF")?.unwrap_or(DEFAULT_RETRY_BACKOFF);

    let retry_attempts = match lookup("JREBUILD_RETRY_ATTEMPTS") {
      Some(value) => value.parse().map_err(|source| ConfigError::InvalidNumber {
        var: "JREBUILD_RETRY_ATTEMPTS",
        value,
        source,
      })?,
      None => DEFAULT_RETRY_ATTEMPTS,
    };

    let assume_yes = match lookup("ASSUME_ALWAYS_YES") {
      Some(value) => matches!(value.to_lowercase().as_str(), "1" | "yes" | "true"),
      None => true,
    };

    Ok(Self {
      version,
      work_dir: work_dir.to_path_buf(),
      pkg_repo_conf: PathBuf::from(PKG_REPO_CONF),
      network_timeout,
      build_timeout,
      retry_attempts,
      retry_backoff,
      assume_yes,
    })
  }

  /// Where the OpenJDK source tree is cloned, e.g. `<work>/jdk17u`.
  pub fn source_dir(&self) -> PathBuf {
    self.work_dir.join(format!("jdk{}u", self.version))
  }

  /// Where the pruned runtime image is staged, e.g. `<work>/openjdk-17-jre`.
  pub fn image_dir(&self) -> PathBuf {
    self.work_dir.join(format!("openjdk-{}-jre", self.version))
  }

  /// Full path of the final archive for the given platform.
  pub fn archive_path(&self, platform: Platform) -> PathBuf {
    self.work_dir.join(archive_file_name(&self.version, platform))
  }
}

/// Deterministic archive name: `openjdk-<v>-jre-<os>-<arch>-static.tar.gz`.
pub fn archive_file_name(version: &str, platform: Platform) -> String {
  format!(
    "openjdk-{}-jre-{}-{}-static.tar.gz",
    version, platform.os, platform.arch
  )
}

fn duration_var(
  lookup: &impl Fn(&str) -> Option<String>,
  var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
  match lookup(var) {
    Some(value) => humantime::parse_duration(&value)
      .map(Some)
      .map_err(|source| ConfigError::InvalidDuration { var, value, source }),
    None => Ok(None),
  }
}
