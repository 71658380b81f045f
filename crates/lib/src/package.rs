//! Packaging: symbol stripping, release metadata, tarball creation.
//!
//! Stripping is best-effort per file: `strip` refuses some inputs (shell
//! wrappers, already-stripped binaries) and none of that should sink a
//! build that is otherwise done. The archive name is a pure function of
//! version and platform.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use jrebuild_platform::HostInfo;

use crate::config::BuildConfig;
use crate::consts::RELEASE_INFO_FILE;
use crate::exec::{Cmd, Runner};

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("image directory not found: {0}")]
  ImageMissing(PathBuf),

  #[error("failed to write metadata file '{path}': {source}")]
  Metadata {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to create archive '{path}': {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Summary of the package step.
#[derive(Debug)]
pub struct PackageReport {
  pub archive: PathBuf,
  pub archive_size: u64,
  /// Executables successfully stripped.
  pub stripped: usize,
  /// Files `strip` refused; logged and ignored.
  pub strip_failures: usize,
}

/// Strip, write metadata, and archive the staged image.
pub async fn package(
  config: &BuildConfig,
  runner: &Runner,
  host: &HostInfo,
) -> Result<PackageReport, PackageError> {
  let image = config.image_dir();
  if !image.is_dir() {
    return Err(PackageError::ImageMissing(image));
  }

  let (stripped, strip_failures) = strip_binaries(runner, &image).await;
  info!(stripped, strip_failures, "stripped debug symbols");

  write_release_info(config, host, &image)?;

  let archive = config.archive_path(host.platform);
  create_archive(config, &image, &archive)?;

  let archive_size = std::fs::metadata(&archive)
    .map(|m| m.len())
    .unwrap_or_default();
  info!(archive = %archive.display(), size = archive_size, "archive created");

  Ok(PackageReport {
    archive,
    archive_size,
    stripped,
    strip_failures,
  })
}

/// Best-effort `strip` over every executable regular file in the tree.
async fn strip_binaries(runner: &Runner, image: &Path) -> (usize, usize) {
  let mut stripped = 0;
  let mut failures = 0;

  for entry in WalkDir::new(image).into_iter().filter_map(Result::ok) {
    if !entry.file_type().is_file() || !is_executable(entry.path()) {
      continue;
    }
    match runner.output(&Cmd::new("strip").arg(entry.path())).await {
      Ok(_) => stripped += 1,
      Err(error) => {
        debug!(path = %entry.path().display(), %error, "strip failed, continuing");
        failures += 1;
      }
    }
  }

  (stripped, failures)
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
  false
}

/// Plain-text metadata consumed by humans and by downstream artifact
/// storage.
fn write_release_info(
  config: &BuildConfig,
  host: &HostInfo,
  image: &Path,
) -> Result<(), PackageError> {
  let path = image.join(RELEASE_INFO_FILE);
  let contents = format!(
    "VERSION={}\nBUILD_TIMESTAMP={}\nARCH={}\nOS_VERSION={}\nBUILD_HOST={}\n",
    config.version,
    Utc::now().to_rfc3339(),
    host.platform.arch,
    host.os_version,
    host.hostname,
  );
  std::fs::write(&path, contents).map_err(|source| PackageError::Metadata { path, source })
}

/// Gzip tarball of the image, nested under a single top-level directory
/// so extraction stays tidy.
fn create_archive(config: &BuildConfig, image: &Path, archive: &Path) -> Result<(), PackageError> {
  let map_err = |source| PackageError::Archive {
    path: archive.to_path_buf(),
    source,
  };

  let file = File::create(archive).map_err(map_err)?;
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder.follow_symlinks(false);
  builder
    .append_dir_all(format!("openjdk-{}-jre", config.version), image)
    .map_err(map_err)?;
  let encoder = builder.into_inner().map_err(map_err)?;
  encoder.finish().map_err(map_err)?;
  Ok(())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use std::fs;
  use std::os::unix::fs::PermissionsExt;

  use jrebuild_platform::{Arch, HostInfo, Os, Platform};
  use tempfile::TempDir;

  use super::*;

  fn config_in(dir: &Path) -> BuildConfig {
    BuildConfig::from_lookup(Some("17"), dir, |_| None).unwrap()
  }

  fn freebsd_host() -> HostInfo {
    HostInfo {
      platform: Platform::new(Os::FreeBsd, Arch::Amd64),
      os_version: "FreeBSD 14.2-RELEASE".to_string(),
      hostname: "builder01".to_string(),
      username: "ci".to_string(),
      cpus: 8,
      total_memory: 16 << 30,
    }
  }

  /// A runner whose PATH holds only the given fake tools.
  fn runner_with_fake(dir: &Path, name: &str, script: &str) -> Runner {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    Runner::new().env("PATH", dir)
  }

  fn fake_image(config: &BuildConfig) {
    let image = config.image_dir();
    fs::create_dir_all(image.join("bin")).unwrap();
    fs::write(image.join("bin/java"), b"\x7fELF").unwrap();
    fs::set_permissions(
      image.join("bin/java"),
      fs::Permissions::from_mode(0o755),
    )
    .unwrap();
    fs::write(image.join("bin/java.properties"), b"not a binary").unwrap();
  }

  #[tokio::test]
  async fn package_produces_deterministically_named_archive() {
    let temp = TempDir::new().unwrap();
    let fake_bin = TempDir::new().unwrap();
    let config = config_in(temp.path());
    fake_image(&config);

    let runner = runner_with_fake(fake_bin.path(), "strip", "exit 0");
    let report = package(&config, &runner, &freebsd_host()).await.unwrap();

    assert_eq!(
      report.archive.file_name().unwrap().to_str().unwrap(),
      "openjdk-17-jre-freebsd-amd64-static.tar.gz"
    );
    assert!(report.archive.exists());
    assert!(report.archive_size > 0);
    assert_eq!(report.stripped, 1);
    assert_eq!(report.strip_failures, 0);
  }

  #[tokio::test]
  async fn release_info_records_version_and_host() {
    let temp = TempDir::new().unwrap();
    let fake_bin = TempDir::new().unwrap();
    let config = config_in(temp.path());
    fake_image(&config);

    let runner = runner_with_fake(fake_bin.path(), "strip", "exit 0");
    package(&config, &runner, &freebsd_host()).await.unwrap();

    let info = fs::read_to_string(config.image_dir().join("release-info")).unwrap();
    assert!(info.contains("VERSION=17"));
    assert!(info.contains("ARCH=amd64"));
    assert!(info.contains("OS_VERSION=FreeBSD 14.2-RELEASE"));
    assert!(info.contains("BUILD_HOST=builder01"));
    assert!(info.contains("BUILD_TIMESTAMP="));
  }

  #[tokio::test]
  async fn strip_failures_are_swallowed() {
    let temp = TempDir::new().unwrap();
    let fake_bin = TempDir::new().unwrap();
    let config = config_in(temp.path());
    fake_image(&config);

    let runner = runner_with_fake(fake_bin.path(), "strip", "exit 1");
    let report = package(&config, &runner, &freebsd_host()).await.unwrap();

    assert_eq!(report.stripped, 0);
    assert_eq!(report.strip_failures, 1);
    assert!(report.archive.exists());
  }

  #[tokio::test]
  async fn missing_image_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());

    let err = package(&config, &Runner::new(), &freebsd_host())
      .await
      .unwrap_err();
    assert!(matches!(err, PackageError::ImageMissing(_)));
  }
}
