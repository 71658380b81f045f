//! CI task descriptor.
//!
//! The hosted-CI job this tool runs under is described here as data and
//! emitted as YAML, instead of living as a hand-maintained config file:
//! instance shape, global timeout, environment, a pkg cache keyed by a
//! fingerprint script, the command lines, and the artifact upload glob.

use std::collections::BTreeMap;

use serde::Serialize;

/// Machine shape the task requests.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
  pub image_family: String,
  pub cpu: u32,
  pub memory: String,
}

/// Dependency cache keyed by a fingerprint script.
#[derive(Debug, Clone, Serialize)]
pub struct Cache {
  pub folder: String,
  pub fingerprint_script: String,
}

/// Artifact upload pattern.
#[derive(Debug, Clone, Serialize)]
pub struct Artifacts {
  pub path: String,
}

/// A complete CI task definition.
#[derive(Debug, Clone, Serialize)]
pub struct CiTask {
  pub name: String,
  pub freebsd_instance: Instance,
  pub timeout_in: String,
  pub env: BTreeMap<String, String>,
  pub pkg_cache: Cache,
  pub build_script: Vec<String>,
  pub artifacts: Artifacts,
}

impl CiTask {
  /// The default task for a target version.
  pub fn for_version(version: &str) -> Self {
    let mut env = BTreeMap::new();
    env.insert("JDK_VERSION".to_string(), version.to_string());
    env.insert("ASSUME_ALWAYS_YES".to_string(), "yes".to_string());

    Self {
      name: format!("build-static-jre-{version}"),
      freebsd_instance: Instance {
        image_family: "freebsd-14-2".to_string(),
        cpu: 8,
        memory: "16G".to_string(),
      },
      timeout_in: "120m".to_string(),
      env,
      pkg_cache: Cache {
        folder: "/var/cache/pkg".to_string(),
        fingerprint_script: format!("echo openjdk-{version}-$(uname -rm)"),
      },
      build_script: vec!["jrebuild build".to_string()],
      artifacts: Artifacts {
        path: "openjdk-*-static.tar.gz".to_string(),
      },
    }
  }

  pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_task_pins_version_and_artifacts() {
    let task = CiTask::for_version("17");
    assert_eq!(task.env.get("JDK_VERSION").map(String::as_str), Some("17"));
    assert_eq!(task.artifacts.path, "openjdk-*-static.tar.gz");
    assert!(task.pkg_cache.fingerprint_script.contains("openjdk-17"));
  }

  #[test]
  fn yaml_round_trips_the_interesting_fields() {
    let yaml = CiTask::for_version("21").to_yaml().unwrap();
    assert!(yaml.contains("image_family: freebsd-14-2"));
    assert!(yaml.contains("timeout_in: 120m"));
    assert!(yaml.contains("JDK_VERSION: '21'"));
    assert!(yaml.contains("path: openjdk-*-static.tar.gz"));
  }
}
