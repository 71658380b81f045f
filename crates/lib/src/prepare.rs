//! Environment preparation: pkg repositories, bootstrap toolchain, build
//! dependencies.
//!
//! Network-facing pkg operations run under the retry policy and the
//! network timeout. Repository updates carry a channel fallback: the
//! `quarterly` channel gets the leading attempts, `latest` gets the final
//! one, and exhaustion of the whole budget is continue-anyway (the
//! existing catalogue may still serve the install). Essential package
//! installs stay fatal.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::consts::{
  ESSENTIAL_PACKAGES, OPTIONAL_PACKAGES, PKG_CHANNELS, RECOMMENDED_COMMANDS, REQUIRED_COMMANDS,
};
use crate::exec::{retry, Cmd, ExecError, Retry, Runner};
use crate::versions;

#[derive(Debug, Error)]
pub enum PrepareError {
  #[error("failed to write pkg repository config '{path}': {source}")]
  WriteRepoConf {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to install essential package '{package}': {source}")]
  EssentialInstall {
    package: String,
    #[source]
    source: ExecError,
  },

  #[error("required build tool missing after install: {0}")]
  MissingTool(&'static str),
}

/// Summary of what the prepare step did.
#[derive(Debug, Default)]
pub struct PrepareReport {
  /// Channel that served the catalogue update, `None` if every attempt
  /// failed and the run continued on the existing catalogue.
  pub channel: Option<&'static str>,
  /// Packages installed (bootstrap JDK, essentials, optionals that
  /// succeeded).
  pub installed: Vec<String>,
  /// Optional packages that failed to install.
  pub skipped_optional: Vec<String>,
}

/// Bring the host to a buildable state.
pub async fn prepare(config: &BuildConfig, runner: &Runner) -> Result<PrepareReport, PrepareError> {
  let mut report = PrepareReport::default();

  report.channel = configure_repositories(config, runner).await?;

  // Bootstrap JDK first: nothing else matters without it.
  let bootstrap = versions::bootstrap_toolchain(&config.version);
  if bootstrap.fallback {
    warn!(
      version = %config.version,
      bootstrap = bootstrap.package,
      "no bootstrap mapping for version, using default"
    );
  }

  let mut essentials = vec![bootstrap.package.to_string()];
  essentials.extend(ESSENTIAL_PACKAGES.iter().map(|p| p.to_string()));

  for package in &essentials {
    install_package(config, runner, package)
      .await
      .map_err(|source| PrepareError::EssentialInstall {
        package: package.clone(),
        source,
      })?;
    info!(%package, "installed");
    report.installed.push(package.clone());
  }

  for package in OPTIONAL_PACKAGES {
    match install_package(config, runner, package).await {
      Ok(()) => {
        debug!(package, "installed optional");
        report.installed.push(package.to_string());
      }
      Err(error) => {
        warn!(package, %error, "optional package failed to install, continuing");
        report.skipped_optional.push(package.to_string());
      }
    }
  }

  check_tools(runner).await?;

  Ok(report)
}

/// Point pkg at a channel and refresh the catalogue, falling back along
/// [`PKG_CHANNELS`]. The attempt budget is shared: with the default
/// policy of 3, `quarterly` gets two attempts and `latest` one.
async fn configure_repositories(
  config: &BuildConfig,
  runner: &Runner,
) -> Result<Option<&'static str>, PrepareError> {
  // pkg itself may be absent on a fresh image; failure here is not fatal
  // because it is usually already bootstrapped.
  let bootstrap_cmd = pkg_cmd(config, ["bootstrap", "-f"]);
  let policy = Retry::new(config.retry_attempts, config.retry_backoff);
  if let Err(error) = retry("pkg bootstrap", policy, || async {
    runner.output(&bootstrap_cmd).await.map(|_| ())
  })
  .await
  {
    warn!(%error, "pkg bootstrap failed, continuing");
  }

  let channels = PKG_CHANNELS;
  let total = config.retry_attempts.max(channels.len() as u32);
  let primary_attempts = total - (channels.len() as u32 - 1);

  for (index, &channel) in channels.iter().enumerate() {
    write_repo_conf(&config.pkg_repo_conf, channel)?;

    let attempts = if index == 0 { primary_attempts } else { 1 };
    info!(channel, attempts, "updating package catalogue");

    let update_cmd = pkg_cmd(config, ["update", "-f"]);
    let result = retry(
      "pkg update",
      Retry::new(attempts, config.retry_backoff),
      || async { runner.output(&update_cmd).await.map(|_| ()) },
    )
    .await;

    match result {
      Ok(()) => {
        info!(channel, "package catalogue updated");
        return Ok(Some(channel));
      }
      Err(error) => {
        warn!(channel, %error, "catalogue update failed on this channel");
      }
    }
  }

  warn!("catalogue update failed on all channels, continuing with the existing catalogue");
  Ok(None)
}

/// Rewrite the repository config file to select a channel.
fn write_repo_conf(path: &Path, channel: &str) -> Result<(), PrepareError> {
  let write = || -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, repo_conf_contents(channel))
  };
  write().map_err(|source| PrepareError::WriteRepoConf {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), channel, "wrote pkg repository config");
  Ok(())
}

fn repo_conf_contents(channel: &str) -> String {
  format!(
    r#"FreeBSD: {{
  url: "pkg+https://pkg.FreeBSD.org/${{ABI}}/{channel}",
  mirror_type: "srv",
  signature_type: "fingerprints",
  fingerprints: "/usr/share/keys/pkg",
  enabled: yes
}}
"#
  )
}

async fn install_package(
  config: &BuildConfig,
  runner: &Runner,
  package: &str,
) -> Result<(), ExecError> {
  let cmd = pkg_cmd(config, ["install", "-y", package]);
  runner.output(&cmd).await.map(|_| ())
}

fn pkg_cmd<const N: usize>(config: &BuildConfig, args: [&str; N]) -> Cmd {
  let mut cmd = Cmd::new("pkg").args(args).timeout(config.network_timeout);
  if let Some(repos_dir) = config.pkg_repo_conf.parent() {
    cmd = cmd.env("REPOS_DIR", repos_dir);
  }
  if config.assume_yes {
    cmd = cmd.env("ASSUME_ALWAYS_YES", "yes");
  }
  cmd
}

/// Post-install sanity: `gmake` is fatal when missing, the rest warn.
async fn check_tools(runner: &Runner) -> Result<(), PrepareError> {
  for &tool in REQUIRED_COMMANDS {
    if !command_exists(runner, tool).await {
      return Err(PrepareError::MissingTool(tool));
    }
  }
  for tool in RECOMMENDED_COMMANDS {
    if !command_exists(runner, tool).await {
      warn!(tool, "command not found, continuing");
    }
  }
  Ok(())
}

async fn command_exists(runner: &Runner, name: &str) -> bool {
  runner.output(&Cmd::new("which").arg(name)).await.is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repo_conf_selects_the_channel() {
    let conf = repo_conf_contents("quarterly");
    assert!(conf.contains("${ABI}/quarterly"));
    assert!(conf.contains("signature_type"));

    let conf = repo_conf_contents("latest");
    assert!(conf.contains("${ABI}/latest"));
  }
}
