//! Scenario parsing: templates and rosters in, armies out

use crate::battle::{AttackStrategy, Army, Squad};
use crate::combat::constants::MIN_ARMIES;
use crate::combat::Combatant;
use crate::core::error::{Result, SkirmishError};
use crate::scenario::schema::{Scenario, SquadConfig, UnitTemplate, UnitTemplates};
use crate::scenario::spawner::SpawnerRegistry;

/// Builds armies from a scenario through a spawner registry
#[derive(Debug, Default)]
pub struct ScenarioParser {
    registry: SpawnerRegistry,
}

impl ScenarioParser {
    /// Parser using the built-in spawners
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SpawnerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SpawnerRegistry {
        &self.registry
    }

    /// Add or replace the spawner for unit templates of type `kind`.
    pub fn add_unit_spawner(
        &mut self,
        kind: impl Into<String>,
        spawner: impl Fn(&str, &UnitTemplate, &UnitTemplates) -> Result<Box<dyn Combatant>>
            + Send
            + Sync
            + 'static,
    ) {
        self.registry.register(kind, spawner);
    }

    /// Instantiate every army, squad and unit in roster order.
    pub fn parse(&self, scenario: &Scenario) -> Result<Vec<Army>> {
        if scenario.armies.len() < MIN_ARMIES {
            return Err(SkirmishError::Scenario(format!(
                "a battle needs at least {MIN_ARMIES} armies, got {}",
                scenario.armies.len()
            )));
        }

        scenario
            .armies
            .iter()
            .map(|army| -> Result<Army> {
                let squads = army
                    .squads
                    .iter()
                    .map(|squad| self.build_squad(squad, &scenario.units))
                    .collect::<Result<Vec<_>>>()?;
                let army = Army::new(&army.name, squads)?;
                tracing::debug!(army = %army.name(), squads = army.squads().len(), "army built");
                Ok(army)
            })
            .collect()
    }

    fn build_squad(&self, config: &SquadConfig, templates: &UnitTemplates) -> Result<Squad> {
        let strategy = match &config.attack_strategy {
            Some(strategy) => strategy.parse::<AttackStrategy>()?,
            None => AttackStrategy::default(),
        };
        let units = config
            .units
            .iter()
            .map(|name| self.registry.spawn(name, templates))
            .collect::<Result<Vec<_>>>()?;

        Squad::new(&config.name, strategy, units)
    }
}
