use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::plan::PlanSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("no plan sources configured")]
    NoPlans,
}

/// Runtime configuration, read from a YAML file.
///
/// ```yaml
/// max_passes: 5
/// plans:
///   - family: sentinel
///     satellite: Sentinel-1A
///     files: [plans/s1a.kml]
///   - family: landsat
///     schedule: plans/landsat_cycles.json
///     wrs2: plans/wrs2.geojson
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub plans: Vec<PlanSpec>,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

fn default_max_passes() -> usize {
    5
}

impl Config {
    /// Relative plan paths are taken relative to the directory of the config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml(&content, &base)
    }

    pub fn from_yaml(yaml: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        if config.plans.is_empty() {
            return Err(ConfigError::NoPlans);
        }
        for plan in &mut config.plans {
            plan.resolve_paths(base);
        }
        Ok(config)
    }

    /// Every satellite named by the configured sources, in declaration order.
    pub fn satellites(&self) -> Vec<String> {
        self.plans.iter().flat_map(PlanSpec::satellites).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
plans:
  - family: sentinel
    satellite: Sentinel-1A
    files: [plans/s1a.kml]
  - family: sentinel
    satellite: Sentinel-2A
    files: [/srv/plans/s2a.kml]
    repeat_cycle: 10days
  - family: landsat
    schedule: plans/cycles.json
    wrs2: plans/wrs2.geojson
"#;

    #[test]
    fn parses_plans_with_defaults() {
        let config = Config::from_yaml(YAML, Path::new("/etc/next-pass")).unwrap();
        assert_eq!(config.max_passes, 5);
        assert_eq!(
            config.satellites(),
            vec!["Sentinel-1A", "Sentinel-2A", "Landsat-8", "Landsat-9"]
        );
        match &config.plans[0] {
            PlanSpec::Sentinel { files, .. } => {
                assert_eq!(files, &vec![PathBuf::from("/etc/next-pass/plans/s1a.kml")])
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn empty_plan_list_is_rejected() {
        let result = Config::from_yaml("plans: []\n", Path::new("."));
        assert!(matches!(result, Err(ConfigError::NoPlans)));
        let result = Config::from_yaml("max_passes: 3\n", Path::new("."));
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn reads_file_relative_to_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("next_pass.yaml");
        std::fs::write(&path, YAML).unwrap();
        let config = Config::from_file(&path).unwrap();
        match &config.plans[2] {
            PlanSpec::Landsat { schedule, .. } => {
                assert_eq!(schedule, &dir.path().join("plans/cycles.json"))
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }
}
