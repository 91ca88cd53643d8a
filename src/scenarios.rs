//! Built-in topologies.
//!
//! The course topologies ship embedded in the binary so they can be selected
//! by name; any other topology is loaded from a YAML file.

use crate::topology::TopologySpec;

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub yaml: &'static str,
}

impl Scenario {
    /// Parse the embedded description
    pub fn spec(&self) -> Result<TopologySpec, serde_yaml::Error> {
        serde_yaml::from_str(self.yaml)
    }
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "forth",
        yaml: include_str!("../topologies/forth.yaml"),
    },
    Scenario {
        name: "tyne",
        yaml: include_str!("../topologies/tyne.yaml"),
    },
    Scenario {
        name: "humber",
        yaml: include_str!("../topologies/humber.yaml"),
    },
    Scenario {
        name: "ouse",
        yaml: include_str!("../topologies/ouse.yaml"),
    },
    Scenario {
        name: "thames",
        yaml: include_str!("../topologies/thames.yaml"),
    },
    Scenario {
        name: "malin",
        yaml: include_str!("../topologies/malin.yaml"),
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|scenario| scenario.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Mode;

    #[test]
    fn test_every_scenario_parses_and_builds() {
        for scenario in SCENARIOS {
            let spec = scenario.spec().unwrap();
            assert_eq!(spec.name, scenario.name);
            spec.build(Mode::Router).unwrap();
            spec.build(Mode::Switch).unwrap();
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("humber").map(|s| s.name), Some("humber"));
        assert!(find("severn").is_none());
        assert_eq!(names().count(), 6);
    }
}
