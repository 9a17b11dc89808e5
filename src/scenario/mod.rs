//! Scenario files: unit templates, army rosters and the spawners that
//! bring them to life

pub mod parser;
pub mod schema;
pub mod spawner;

pub use parser::ScenarioParser;
pub use schema::{ArmyConfig, Scenario, SquadConfig, UnitTemplate, UnitTemplates};
pub use spawner::{SpawnerRegistry, UnitSpawner};
