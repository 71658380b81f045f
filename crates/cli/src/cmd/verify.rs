//! Implementation of the `jrebuild verify` command.

use std::path::Path;

use anyhow::{Context, Result};

use jrebuild_lib::exec::Runner;
use jrebuild_lib::verify::verify;

use crate::output::{print_info, print_success};

pub fn cmd_verify(image: &Path) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
  let report = rt.block_on(verify(image, &Runner::new()))?;

  print_success("runtime answered the version query");
  println!("{}", report.version_output);
  println!();

  match report.dynamic_deps {
    Some(deps) => {
      print_info("dynamic dependencies:");
      println!("{deps}");
    }
    None => print_info("no dynamic dependencies reported (static binary)"),
  }

  Ok(())
}
