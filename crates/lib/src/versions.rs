//! Fixed version tables: source repository and bootstrap toolchain.
//!
//! Both tables are deliberately static. An unrecognized version fails the
//! repository lookup (fatal, before any network activity); the bootstrap
//! lookup instead falls back to a documented default, which callers must
//! surface as a warning.

use thiserror::Error;

/// Versions with entries in both tables.
pub const SUPPORTED_VERSIONS: &[&str] = &["11", "17", "21"];

/// Requested version has no source repository mapping.
#[derive(Debug, Error)]
#[error("unsupported JDK version '{0}' (supported: 11, 17, 21)")]
pub struct UnsupportedVersion(pub String);

/// Upstream source repository for a target version.
pub fn source_repo(version: &str) -> Result<&'static str, UnsupportedVersion> {
  match version {
    "11" => Ok("https://github.com/openjdk/jdk11u.git"),
    "17" => Ok("https://github.com/openjdk/jdk17u.git"),
    "21" => Ok("https://github.com/openjdk/jdk21u.git"),
    other => Err(UnsupportedVersion(other.to_string())),
  }
}

/// A bootstrap JDK selection: the FreeBSD package that provides it and
/// the prefix it installs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootstrap {
  pub package: &'static str,
  pub prefix: &'static str,
  /// True when the requested version had no mapping and the default was
  /// substituted. The caller logs this.
  pub fallback: bool,
}

/// Default bootstrap used for versions outside the table.
const DEFAULT_BOOTSTRAP: Bootstrap = Bootstrap {
  package: "openjdk17",
  prefix: "/usr/local/openjdk17",
  fallback: true,
};

/// Bootstrap toolchain for a target version. A JDK of version N builds
/// with a boot JDK of version N (or N-1, which the ports packages track).
pub fn bootstrap_toolchain(version: &str) -> Bootstrap {
  match version {
    "11" => Bootstrap {
      package: "openjdk11",
      prefix: "/usr/local/openjdk11",
      fallback: false,
    },
    "17" => Bootstrap {
      package: "openjdk17",
      prefix: "/usr/local/openjdk17",
      fallback: false,
    },
    "21" => Bootstrap {
      package: "openjdk21",
      prefix: "/usr/local/openjdk21",
      fallback: false,
    },
    _ => DEFAULT_BOOTSTRAP,
  }
}
