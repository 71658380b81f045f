//! Implementation of the `jrebuild fetch` command.

use std::path::Path;

use anyhow::Result;

use jrebuild_lib::config::BuildConfig;
use jrebuild_lib::fetch::{FetchOutcome, fetch_source};

use crate::output::{print_info, print_success};

pub fn cmd_fetch(version: Option<&str>, work_dir: &Path) -> Result<()> {
  let config = BuildConfig::from_env(version, work_dir)?;

  match fetch_source(&config)? {
    FetchOutcome::Existing => {
      print_info(&format!(
        "source tree already present at {}",
        config.source_dir().display()
      ));
    }
    FetchOutcome::Cloned => {
      print_success(&format!("cloned into {}", config.source_dir().display()));
    }
  }

  Ok(())
}
