//! Shared helpers: fake external commands on a private PATH.
//!
//! The runner resolves programs through the PATH it passes to the child,
//! so pointing it at a temp directory of shell scripts lets the tests
//! exercise the real spawning, retry, and fallback code without touching
//! the system.

#![cfg(unix)]
#![allow(dead_code)] // each test crate uses a different subset

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jrebuild_lib::config::BuildConfig;
use jrebuild_lib::exec::Runner;
use jrebuild_platform::{Arch, HostInfo, Os, Platform};

/// Write an executable shell script named `name` into `dir`.
pub fn fake_bin(dir: &Path, name: &str, body: &str) {
  use std::os::unix::fs::PermissionsExt;
  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A runner that looks up the fake bin directory first, then the real
/// PATH. The fakes win for `pkg`/`which`, while the fake scripts can still
/// reach ordinary tools (`grep`, etc.) they shell out to.
pub fn runner_for(dir: &Path) -> Runner {
  let path = match std::env::var_os("PATH") {
    Some(existing) => {
      let mut entries = vec![dir.to_path_buf()];
      entries.extend(std::env::split_paths(&existing));
      std::env::join_paths(entries).expect("join PATH")
    }
    None => dir.as_os_str().to_os_string(),
  };
  Runner::new().env("PATH", path)
}

/// A config rooted in the test's work dir: relocatable repo conf, zero
/// backoff, short timeouts.
pub fn test_config(work_dir: &Path, version: &str) -> BuildConfig {
  BuildConfig {
    version: version.to_string(),
    work_dir: work_dir.to_path_buf(),
    pkg_repo_conf: work_dir.join("repos/FreeBSD.conf"),
    network_timeout: Duration::from_secs(10),
    build_timeout: Duration::from_secs(10),
    retry_attempts: 3,
    retry_backoff: Duration::ZERO,
    assume_yes: true,
  }
}

/// A fixed FreeBSD host description, independent of the test machine.
pub fn freebsd_host() -> HostInfo {
  HostInfo {
    platform: Platform::new(Os::FreeBsd, Arch::Amd64),
    os_version: "FreeBSD 14.2-RELEASE".to_string(),
    hostname: "builder01".to_string(),
    username: "ci".to_string(),
    cpus: 4,
    total_memory: 8 << 30,
  }
}

/// Invocation log path for fake pkg scripts.
pub fn invocation_log(work_dir: &Path) -> PathBuf {
  work_dir.join("pkg-invocations.log")
}

/// Lines of the invocation log whose first word is `subcommand`.
pub fn logged_calls(log: &Path, subcommand: &str) -> Vec<String> {
  match fs::read_to_string(log) {
    Ok(contents) => contents
      .lines()
      .filter(|line| line.split_whitespace().next() == Some(subcommand))
      .map(str::to_string)
      .collect(),
    Err(_) => Vec::new(),
  }
}
