//! OS and architecture identifiers
//!
//! The string forms follow the platform's own naming (`uname`), which is
//! also what ends up in artifact file names: `freebsd`, `amd64`, `arm64`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  FreeBsd,
  Linux,
  Darwin,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Result<Self, PlatformError> {
    match std::env::consts::OS {
      "freebsd" => Ok(Self::FreeBsd),
      "linux" => Ok(Self::Linux),
      "macos" => Ok(Self::Darwin),
      other => Err(PlatformError::UnsupportedOs(other.to_string())),
    }
  }

  /// Returns the OS name as used in artifact names
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::FreeBsd => "freebsd",
      Self::Linux => "linux",
      Self::Darwin => "darwin",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  Amd64,
  Arm64,
}

impl Arch {
  /// Detect the current architecture at runtime
  pub fn current() -> Result<Self, PlatformError> {
    match std::env::consts::ARCH {
      "x86_64" => Ok(Self::Amd64),
      "aarch64" => Ok(Self::Arm64),
      other => Err(PlatformError::UnsupportedArch(other.to_string())),
    }
  }

  /// Returns the architecture name as used in artifact names (`uname -m` form)
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Combined platform identifier (e.g., "freebsd-amd64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  pub const fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  pub fn current() -> Result<Self, PlatformError> {
    Ok(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.os, self.arch)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_platform_detects() {
    let platform = Platform::current().unwrap();
    assert!(!platform.to_string().is_empty());
  }

  #[test]
  fn arch_uses_uname_identifiers() {
    // FreeBSD calls x86_64 "amd64"; artifact names follow suit
    assert_eq!(Arch::Amd64.as_str(), "amd64");
    assert_eq!(Arch::Arm64.as_str(), "arm64");
  }

  #[test]
  fn platform_display_joins_os_and_arch() {
    let platform = Platform::new(Os::FreeBsd, Arch::Amd64);
    assert_eq!(platform.to_string(), "freebsd-amd64");
  }
}
