//! Implementation of the `jrebuild build` command.
//!
//! Runs the full pipeline and reports the artifact on success, or the
//! failing step plus a work-dir listing for diagnosis.

use std::path::Path;

use anyhow::{Context, Result};

use jrebuild_lib::config::BuildConfig;
use jrebuild_lib::pipeline::Pipeline;
use jrebuild_platform::HostInfo;

use crate::output::{
  format_bytes, format_duration, print_error, print_info, print_stat, print_success,
};

pub fn cmd_build(version: Option<&str>, work_dir: &Path) -> Result<()> {
  let config = match BuildConfig::from_env(version, work_dir) {
    Ok(config) => config,
    Err(error) => {
      print_error(&error.to_string());
      std::process::exit(1);
    }
  };
  let host = HostInfo::detect().context("failed to detect host platform")?;

  print_info(&format!(
    "building static JRE {} on {} ({} cpus)",
    config.version, host.platform, host.cpus
  ));

  let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
  let pipeline = Pipeline::new(&config, &host);

  match rt.block_on(pipeline.run()) {
    Ok(report) => {
      println!();
      print_success(&format!("built {}", report.package.archive.display()));
      print_stat("archive", &format_bytes(report.package.archive_size));
      print_stat("files", &report.assemble.files_copied.to_string());
      print_stat("stripped", &report.package.stripped.to_string());
      print_stat("elapsed", &format_duration(report.elapsed));
      println!();
      println!("{}", report.verify.version_output);
      Ok(())
    }
    Err(error) => {
      print_error(&error.to_string());
      list_work_dir(&config);
      std::process::exit(1);
    }
  }
}

/// A quick listing of the work dir helps diagnose what a failed run left
/// behind.
fn list_work_dir(config: &BuildConfig) {
  eprintln!("work dir contents:");
  match std::fs::read_dir(&config.work_dir) {
    Ok(entries) => {
      for entry in entries.flatten() {
        eprintln!("  {}", entry.path().display());
      }
    }
    Err(error) => eprintln!("  (unreadable: {error})"),
  }
}
