//! Scenario schema types for TOML/JSON deserialization.
//!
//! A scenario names unit templates and lists armies of squads that refer to
//! those templates by name. Armies and squads are arrays so roster order
//! survives parsing; that order seeds each army's attack rotation.
//!
//! ```toml
//! [units.grunt]
//! type = "soldier"
//! health = 100
//! recharge = 400
//!
//! [[armies]]
//! name = "Red"
//!
//! [[armies.squads]]
//! name = "Alpha"
//! attack_strategy = "weak"
//! units = ["grunt", "grunt", "grunt", "grunt", "grunt"]
//! ```

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulatorConfig;
use crate::core::error::{Result, SkirmishError};

/// Unit templates keyed by name
pub type UnitTemplates = AHashMap<String, UnitTemplate>;

/// Stats for one named unit template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Spawner key, e.g. "soldier" or "vehicle"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub health: Option<f64>,
    #[serde(default)]
    pub experience: Option<f64>,
    /// Recharge duration in milliseconds; random within the unit's range if absent
    #[serde(default)]
    pub recharge: Option<f64>,
    /// Soldier template names crewing a vehicle
    #[serde(default)]
    pub operators: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadConfig {
    pub name: String,
    /// "random", "weak" or "strong"; random if absent
    #[serde(default, alias = "attackStrategy")]
    pub attack_strategy: Option<String>,
    /// Unit template names, in roster order
    pub units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyConfig {
    pub name: String,
    #[serde(default)]
    pub squads: Vec<SquadConfig>,
}

/// Complete scenario definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Optional overrides for the run loop
    #[serde(default)]
    pub simulator: Option<SimulatorConfig>,
    pub units: UnitTemplates,
    pub armies: Vec<ArmyConfig>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a scenario file, picking the format from its extension
    /// (`.json` is JSON, anything else is TOML).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let scenario = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        scenario.map_err(|e| SkirmishError::Scenario(format!("{}: {}", path.display(), e)))
    }

    /// Run loop settings: the scenario's own table or the defaults.
    pub fn simulator_config(&self) -> SimulatorConfig {
        self.simulator.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIRMISH: &str = r#"
[simulator]
max_ticks = 500

[units.grunt]
type = "soldier"
health = 90
experience = 5
recharge = 300

[units.tank]
type = "vehicle"
operators = ["grunt", "grunt"]

[[armies]]
name = "Red"

[[armies.squads]]
name = "Alpha"
attack_strategy = "weak"
units = ["grunt", "grunt", "tank", "grunt", "grunt"]

[[armies]]
name = "Blue"

[[armies.squads]]
name = "Bravo"
units = ["grunt", "grunt", "grunt", "grunt", "grunt"]
"#;

    #[test]
    fn test_parse_toml_scenario() {
        let scenario = Scenario::from_toml_str(SKIRMISH).unwrap();

        assert_eq!(scenario.units.len(), 2);
        let grunt = scenario.units.get("grunt").unwrap();
        assert_eq!(grunt.kind, "soldier");
        assert_eq!(grunt.health, Some(90.0));
        assert_eq!(grunt.recharge, Some(300.0));
        assert_eq!(
            scenario.units.get("tank").unwrap().operators.as_deref(),
            Some(&["grunt".to_string(), "grunt".to_string()][..])
        );

        let names: Vec<_> = scenario.armies.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Red", "Blue"]);
        assert_eq!(
            scenario.armies[0].squads[0].attack_strategy.as_deref(),
            Some("weak")
        );
        assert_eq!(scenario.armies[1].squads[0].attack_strategy, None);

        let config = scenario.simulator_config();
        assert_eq!(config.max_ticks, 500);
        assert_eq!(config.tick_interval_ms, SimulatorConfig::default().tick_interval_ms);
    }

    #[test]
    fn test_parse_json_scenario() {
        let json = r#"{
            "units": {"grunt": {"type": "soldier"}},
            "armies": [
                {"name": "Red", "squads": [{"name": "A", "attackStrategy": "strong", "units": ["grunt"]}]},
                {"name": "Blue", "squads": []}
            ]
        }"#;
        let scenario = Scenario::from_json_str(json).unwrap();
        assert_eq!(scenario.armies.len(), 2);
        assert_eq!(
            scenario.armies[0].squads[0].attack_strategy.as_deref(),
            Some("strong")
        );
        assert!(scenario.simulator.is_none());
    }

    #[test]
    fn test_missing_units_table_is_an_error() {
        let result = Scenario::from_toml_str("[[armies]]\nname = \"Red\"\n");
        assert!(matches!(result, Err(SkirmishError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Scenario::load(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(SkirmishError::Io(_))));
    }
}
