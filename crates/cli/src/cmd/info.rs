//! Implementation of the `jrebuild info` command.

use anyhow::{Context, Result};

use jrebuild_lib::versions::SUPPORTED_VERSIONS;
use jrebuild_platform::HostInfo;

use crate::output::{format_bytes, print_json, print_stat};

pub fn cmd_info(json: bool) -> Result<()> {
  let host = HostInfo::detect().context("failed to detect host platform")?;

  if json {
    return print_json(&host);
  }

  println!("jrebuild v{}", env!("CARGO_PKG_VERSION"));
  println!();
  print_stat("Platform", &host.platform.to_string());
  print_stat("OS", &host.os_version);
  print_stat("Arch", host.platform.arch.as_str());
  print_stat("CPUs", &host.cpus.to_string());
  print_stat("Memory", &format_bytes(host.total_memory));
  print_stat("Host", &host.hostname);
  print_stat("User", &host.username);
  println!();
  print_stat("Supported versions", &SUPPORTED_VERSIONS.join(", "));

  Ok(())
}
