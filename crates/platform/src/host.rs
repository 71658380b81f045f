//! Host facts gathered once per run

use serde::Serialize;
use sysinfo::System;
use tracing::debug;

use crate::error::PlatformError;
use crate::platform::Platform;

/// Facts about the build host, gathered once and passed around read-only.
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
  pub platform: Platform,
  /// Full OS version string, e.g. "FreeBSD 14.2-RELEASE"
  pub os_version: String,
  pub hostname: String,
  pub username: String,
  /// Logical CPU count, used to size build parallelism
  pub cpus: usize,
  /// Total memory in bytes
  pub total_memory: u64,
}

impl HostInfo {
  /// Detect the current host.
  pub fn detect() -> Result<Self, PlatformError> {
    let platform = Platform::current()?;

    let mut sys = System::new_all();
    sys.refresh_all();

    let os_version = match (System::name(), System::os_version()) {
      (Some(name), Some(version)) => format!("{} {}", name, version),
      (Some(name), None) => name,
      _ => "unknown".to_string(),
    };

    let hostname = System::host_name().ok_or(PlatformError::Hostname)?;
    let username = whoami::username();

    let cpus = sys.cpus().len().max(1);
    let total_memory = sys.total_memory();

    debug!(%platform, %os_version, %hostname, cpus, "detected host");

    Ok(Self {
      platform,
      os_version,
      hostname,
      username,
      cpus,
      total_memory,
    })
  }
}
