//! Build configuration: bootstrap JDK selection and the upstream
//! configure step.
//!
//! The flag set is fixed and version-templated. Static linking is forced
//! twice over: through the configure extras and through `CFLAGS`/`LDFLAGS`
//! in the environment, because parts of the upstream build read one and
//! parts the other.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::consts::{STATIC_CFLAGS, STATIC_LDFLAGS};
use crate::exec::{Cmd, ExecError, Runner};
use crate::versions;

#[derive(Debug, Error)]
pub enum ConfigureError {
  #[error("bootstrap JDK not found at '{0}' (is the package installed?)")]
  BootstrapMissing(PathBuf),

  #[error("source tree has no configure script at '{0}'")]
  SourceMissing(PathBuf),

  #[error("configure failed: {0}")]
  Configure(#[source] ExecError),
}

/// Run the upstream configure step for the configured version.
pub async fn configure(config: &BuildConfig, runner: &Runner) -> Result<(), ConfigureError> {
  let bootstrap = versions::bootstrap_toolchain(&config.version);
  if bootstrap.fallback {
    warn!(
      version = %config.version,
      bootstrap = bootstrap.package,
      "no bootstrap mapping for version, using default"
    );
  }

  let boot_jdk = PathBuf::from(bootstrap.prefix);
  if !boot_jdk.is_dir() {
    return Err(ConfigureError::BootstrapMissing(boot_jdk));
  }

  let source_dir = config.source_dir();
  if !source_dir.join("configure").is_file() {
    return Err(ConfigureError::SourceMissing(source_dir));
  }

  info!(boot_jdk = %boot_jdk.display(), "running configure");

  let cmd = Cmd::new("bash")
    .arg("configure")
    .args(configure_flags(config, &boot_jdk))
    .env("CC", "cc")
    .env("CXX", "c++")
    .env("CFLAGS", STATIC_CFLAGS)
    .env("LDFLAGS", STATIC_LDFLAGS)
    .current_dir(&source_dir)
    .timeout(config.build_timeout);

  runner.status(&cmd).await.map_err(ConfigureError::Configure)
}

/// The fixed, version-templated flag set.
pub fn configure_flags(config: &BuildConfig, boot_jdk: &Path) -> Vec<String> {
  vec![
    format!("--with-boot-jdk={}", boot_jdk.display()),
    "--with-vendor-name=jrebuild".to_string(),
    format!("--with-vendor-version-string=jrebuild-{}", config.version),
    "--with-version-opt=static".to_string(),
    "--with-jvm-variants=server".to_string(),
    "--with-native-debug-symbols=none".to_string(),
    "--disable-warnings-as-errors".to_string(),
    format!("--with-extra-cflags={}", STATIC_CFLAGS),
    format!("--with-extra-ldflags={}", STATIC_LDFLAGS),
  ]
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn config_in(dir: &Path) -> BuildConfig {
    BuildConfig::from_lookup(Some("17"), dir, |_| None).unwrap()
  }

  #[test]
  fn flags_pin_boot_jdk_and_static_linking() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());
    let flags = configure_flags(&config, Path::new("/usr/local/openjdk17"));

    assert!(flags.contains(&"--with-boot-jdk=/usr/local/openjdk17".to_string()));
    assert!(flags.contains(&"--disable-warnings-as-errors".to_string()));
    assert!(flags.contains(&"--with-native-debug-symbols=none".to_string()));
    assert!(
      flags
        .iter()
        .any(|f| f.starts_with("--with-extra-ldflags=") && f.contains("-static-libgcc"))
    );
  }

  #[tokio::test]
  async fn missing_bootstrap_prefix_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mut config = config_in(temp.path());
    // Point at a version whose bootstrap prefix cannot exist in the test
    // environment while keeping the lookup inside the table.
    config.version = "11".to_string();

    let err = configure(&config, &Runner::new()).await.unwrap_err();
    assert!(matches!(err, ConfigureError::BootstrapMissing(_)));
  }
}
