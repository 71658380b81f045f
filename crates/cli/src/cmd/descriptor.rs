//! Implementation of the `jrebuild descriptor` command.

use anyhow::{Context, Result};

use jrebuild_lib::config::DEFAULT_VERSION;
use jrebuild_lib::descriptor::CiTask;

pub fn cmd_descriptor(version: Option<&str>) -> Result<()> {
  let task = CiTask::for_version(version.unwrap_or(DEFAULT_VERSION));
  let yaml = task.to_yaml().context("failed to serialize CI task")?;
  print!("{yaml}");
  Ok(())
}
