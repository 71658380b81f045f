use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// jrebuild - static OpenJDK JRE builder for FreeBSD
#[derive(Parser)]
#[command(name = "jrebuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Directory the run works in (sources, image, archive)
  #[arg(long, global = true, default_value = ".")]
  work_dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the full pipeline and produce the JRE tarball
  Build {
    /// Target JDK version (default: $JDK_VERSION, then "17")
    version: Option<String>,
  },

  /// Prepare the host: package repositories, toolchain, build tools
  Prepare {
    /// Target JDK version (selects the bootstrap toolchain package)
    version: Option<String>,
  },

  /// Fetch the OpenJDK source tree (shallow clone, idempotent)
  Fetch {
    /// Target JDK version
    version: Option<String>,
  },

  /// Verify an assembled JRE image
  Verify {
    /// Path to the image directory (contains bin/java)
    image: PathBuf,
  },

  /// Print the CI task descriptor as YAML
  Descriptor {
    /// Target JDK version
    version: Option<String>,
  },

  /// Show host platform facts and the supported versions
  Info {
    /// Print as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // --verbose raises the default level; RUST_LOG still wins when set.
  let filter = if cli.verbose {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { version } => cmd::cmd_build(version.as_deref(), &cli.work_dir),
    Commands::Prepare { version } => cmd::cmd_prepare(version.as_deref(), &cli.work_dir),
    Commands::Fetch { version } => cmd::cmd_fetch(version.as_deref(), &cli.work_dir),
    Commands::Verify { image } => cmd::cmd_verify(&image),
    Commands::Descriptor { version } => cmd::cmd_descriptor(version.as_deref()),
    Commands::Info { json } => cmd::cmd_info(json),
  }
}
