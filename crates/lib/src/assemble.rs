//! Distribution assembly: locate the built JDK image and prune it down
//! to a runtime-only JRE.
//!
//! The upstream build drops its image at `build/<target>/images/jdk`
//! under the source tree; the target directory name encodes the platform
//! and is not worth predicting, so it is discovered. The copy lands in a
//! fresh staging directory which is then pruned in place.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::consts::{JDK_ONLY_DIRS, JDK_ONLY_FILES, JDK_ONLY_TOOLS};

#[derive(Debug, Error)]
pub enum AssembleError {
  #[error("no build image found under '{0}' (expected build/*/images/jdk)")]
  ImagesNotFound(PathBuf),

  #[error("failed to copy '{from}': {source}")]
  Copy {
    from: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Summary of the assemble step.
#[derive(Debug)]
pub struct AssembleReport {
  /// The staged, pruned image directory.
  pub image_dir: PathBuf,
  /// Files copied from the build image.
  pub files_copied: usize,
  /// Developer tools removed from `bin/`.
  pub tools_removed: usize,
}

/// Copy the built JDK image to the staging directory and prune it.
pub fn assemble(config: &BuildConfig) -> Result<AssembleReport, AssembleError> {
  let jdk_image = find_jdk_image(&config.source_dir())?;
  let dest = config.image_dir();

  // Always start from a fresh staging directory.
  if dest.exists() {
    fs::remove_dir_all(&dest)?;
  }

  info!(from = %jdk_image.display(), to = %dest.display(), "copying build image");
  let files_copied = copy_tree(&jdk_image, &dest)?;

  let tools_removed = prune_to_jre(&dest)?;
  info!(files_copied, tools_removed, "image pruned to JRE");

  Ok(AssembleReport {
    image_dir: dest,
    files_copied,
    tools_removed,
  })
}

/// Locate `build/<target>/images/jdk` under the source tree.
pub fn find_jdk_image(source_dir: &Path) -> Result<PathBuf, AssembleError> {
  let build_root = source_dir.join("build");
  let mut candidates = Vec::new();

  if build_root.is_dir() {
    for entry in fs::read_dir(&build_root)? {
      let image = entry?.path().join("images").join("jdk");
      if image.is_dir() {
        candidates.push(image);
      }
    }
  }

  candidates.sort();
  match candidates.len() {
    0 => Err(AssembleError::ImagesNotFound(build_root)),
    1 => Ok(candidates.swap_remove(0)),
    n => {
      warn!(count = n, using = %candidates[0].display(), "multiple build images found");
      Ok(candidates.swap_remove(0))
    }
  }
}

/// Recursive copy preserving permissions and symlinks.
fn copy_tree(from: &Path, to: &Path) -> Result<usize, AssembleError> {
  let mut copied = 0;
  for entry in WalkDir::new(from).follow_links(false) {
    let entry = entry.map_err(|e| AssembleError::Copy {
      from: from.to_path_buf(),
      source: e.into(),
    })?;
    let rel = entry.path().strip_prefix(from).map_err(|_| AssembleError::Copy {
      from: entry.path().to_path_buf(),
      source: std::io::Error::other("path escaped copy root"),
    })?;
    let target = to.join(rel);

    let copy_entry = || -> std::io::Result<()> {
      let file_type = entry.file_type();
      if file_type.is_dir() {
        fs::create_dir_all(&target)?;
      } else if file_type.is_symlink() {
        let link = fs::read_link(entry.path())?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(link, &target)?;
        #[cfg(not(unix))]
        fs::copy(entry.path(), &target).map(|_| ())?;
      } else {
        fs::copy(entry.path(), &target)?;
      }
      Ok(())
    };
    copy_entry().map_err(|source| AssembleError::Copy {
      from: entry.path().to_path_buf(),
      source,
    })?;

    if entry.file_type().is_file() {
      copied += 1;
    }
  }
  Ok(copied)
}

/// Remove developer-only content in place. Absent entries are no-ops, so
/// pruning an already-pruned tree succeeds.
pub fn prune_to_jre(image: &Path) -> Result<usize, AssembleError> {
  let mut removed = 0;

  let bin = image.join("bin");
  for tool in JDK_ONLY_TOOLS {
    let path = bin.join(tool);
    if path.exists() {
      fs::remove_file(&path)?;
      debug!(tool, "removed developer tool");
      removed += 1;
    }
  }

  for dir in JDK_ONLY_DIRS {
    let path = image.join(dir);
    if path.exists() {
      fs::remove_dir_all(&path)?;
      debug!(dir, "removed developer tree");
    }
  }

  for file in JDK_ONLY_FILES {
    let path = image.join(file);
    if path.exists() {
      fs::remove_file(&path)?;
      debug!(file, "removed developer file");
    }
  }

  Ok(removed)
}
