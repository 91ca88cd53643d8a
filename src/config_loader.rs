use crate::error::{Error, Result};
use crate::scenarios;
use crate::topology::TopologySpec;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate a topology description from a YAML file
pub fn load_topology(path: &Path) -> Result<TopologySpec> {
    info!("Loading topology from: {:?}", path);

    let file = File::open(path)?;
    let spec: TopologySpec = serde_yaml::from_reader(file)?;
    spec.validate()?;

    Ok(spec)
}

/// Parse and validate a topology description held in memory
pub fn parse_topology(yaml: &str) -> Result<TopologySpec> {
    let spec: TopologySpec = serde_yaml::from_str(yaml)?;
    spec.validate()?;
    Ok(spec)
}

/// Resolve a built-in scenario name, falling back to a file path
pub fn resolve_topology(name_or_path: &str) -> Result<TopologySpec> {
    if let Some(scenario) = scenarios::find(name_or_path) {
        info!("Using built-in topology: {}", scenario.name);
        return parse_topology(scenario.yaml);
    }

    let path = Path::new(name_or_path);
    if path.is_file() {
        return load_topology(path);
    }

    Err(Error::UnknownTopology(name_or_path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STAR: &str = r#"
name: star
nodes:
  - { id: r0, kind: router }
  - { id: h0, kind: host }
  - { id: h1, kind: host }
links:
  - { a: r0, b: h0 }
  - { a: r0, b: h1 }
"#;

    #[test]
    fn test_load_topology() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", STAR).unwrap();

        let spec = load_topology(temp_file.path()).unwrap();
        assert_eq!(spec.name, "star");
        assert_eq!(spec.links.len(), 2);
    }

    #[test]
    fn test_resolve_builtin_and_path() {
        assert_eq!(resolve_topology("forth").unwrap().name, "forth");

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", STAR).unwrap();
        let path = temp_file.path().to_string_lossy().to_string();
        assert_eq!(resolve_topology(&path).unwrap().name, "star");

        assert!(matches!(
            resolve_topology("/nonexistent/severn.yaml"),
            Err(Error::UnknownTopology(_))
        ));
    }

    #[test]
    fn test_invalid_yaml_and_validation() {
        assert!(matches!(parse_topology("name: [unclosed"), Err(Error::Yaml(_))));
        assert!(matches!(
            parse_topology("name: empty\nnodes: []\n"),
            Err(Error::Topology(_))
        ));
    }
}
