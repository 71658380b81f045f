//! Implementation of the `jrebuild prepare` command.

use std::path::Path;

use anyhow::{Context, Result};

use jrebuild_lib::config::BuildConfig;
use jrebuild_lib::exec::Runner;
use jrebuild_lib::prepare::prepare;

use crate::output::{print_stat, print_success, print_warning};

pub fn cmd_prepare(version: Option<&str>, work_dir: &Path) -> Result<()> {
  let config = BuildConfig::from_env(version, work_dir)?;

  let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
  let report = rt
    .block_on(prepare(&config, &Runner::new()))
    .context("prepare failed")?;

  print_success("host prepared");
  match report.channel {
    Some(channel) => print_stat("channel", channel),
    None => print_warning("package catalogue update failed, using the existing catalogue"),
  }
  print_stat("installed", &report.installed.len().to_string());
  if !report.skipped_optional.is_empty() {
    print_warning(&format!(
      "optional packages skipped: {}",
      report.skipped_optional.join(", ")
    ));
  }

  Ok(())
}
