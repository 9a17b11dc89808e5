//! Unit spawner registry
//!
//! Spawners turn a named unit template into a live combatant. They are keyed
//! by the template's `type` string; `soldier` and `vehicle` are built in.

use std::fmt;

use ahash::AHashMap;
use rand::Rng;

use crate::combat::constants::{DEFAULT_HEALTH, MAX_CREW, MIN_CREW, MIN_EXPERIENCE};
use crate::combat::{Combatant, Soldier, Vehicle};
use crate::core::error::{Result, SkirmishError};
use crate::entity::interval_from_millis;
use crate::scenario::schema::{UnitTemplate, UnitTemplates};

pub const SOLDIER: &str = "soldier";
pub const VEHICLE: &str = "vehicle";

/// `(unit name, its template, every template) -> combatant`
pub type UnitSpawner =
    Box<dyn Fn(&str, &UnitTemplate, &UnitTemplates) -> Result<Box<dyn Combatant>> + Send + Sync>;

pub struct SpawnerRegistry {
    spawners: AHashMap<String, UnitSpawner>,
}

impl fmt::Debug for SpawnerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.spawners.keys().collect();
        kinds.sort();
        f.debug_struct("SpawnerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl Default for SpawnerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SpawnerRegistry {
    /// Registry with no spawners at all
    pub fn empty() -> Self {
        Self {
            spawners: AHashMap::new(),
        }
    }

    /// Registry with the built-in `soldier` and `vehicle` spawners
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(SOLDIER, |name, template, _| {
            let soldier: Box<dyn Combatant> = Box::new(spawn_soldier(name, template)?);
            Ok(soldier)
        });
        registry.register(VEHICLE, spawn_vehicle);
        registry
    }

    /// Add or replace the spawner for `kind`.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        spawner: impl Fn(&str, &UnitTemplate, &UnitTemplates) -> Result<Box<dyn Combatant>>
            + Send
            + Sync
            + 'static,
    ) {
        self.spawners.insert(kind.into(), Box::new(spawner));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.spawners.contains_key(kind)
    }

    /// Spawn the unit whose template is named `name`.
    pub fn spawn(&self, name: &str, templates: &UnitTemplates) -> Result<Box<dyn Combatant>> {
        let template = templates
            .get(name)
            .ok_or_else(|| SkirmishError::UnknownUnit(name.to_string()))?;
        let spawner = self
            .spawners
            .get(&template.kind)
            .ok_or_else(|| SkirmishError::UnknownUnitType(template.kind.clone()))?;
        spawner(name, template, templates)
    }
}

fn spawn_soldier(name: &str, template: &UnitTemplate) -> Result<Soldier> {
    let recharge = template
        .recharge
        .map(|ms| interval_from_millis(name, ms))
        .transpose()?;
    Soldier::with_stats(
        name,
        template.health.unwrap_or(DEFAULT_HEALTH),
        template.experience.unwrap_or(MIN_EXPERIENCE),
        recharge,
    )
}

fn spawn_vehicle(
    name: &str,
    template: &UnitTemplate,
    templates: &UnitTemplates,
) -> Result<Box<dyn Combatant>> {
    let crew = match &template.operators {
        Some(operators) => operators
            .iter()
            .enumerate()
            .map(|(seat, operator)| -> Result<Soldier> {
                let operator_template = templates
                    .get(operator)
                    .ok_or_else(|| SkirmishError::UnknownUnit(operator.clone()))?;
                if operator_template.kind != SOLDIER {
                    return Err(SkirmishError::Scenario(format!(
                        "vehicle {name:?} operator {operator:?} must be a soldier, got {:?}",
                        operator_template.kind
                    )));
                }
                spawn_soldier(&format!("{name} {operator} #{}", seat + 1), operator_template)
            })
            .collect::<Result<Vec<_>>>()?,
        None => {
            let seats = rand::thread_rng().gen_range(MIN_CREW..=MAX_CREW);
            (1..=seats)
                .map(|seat| Soldier::new(format!("{name} crew #{seat}")))
                .collect::<Result<Vec<_>>>()?
        }
    };

    let recharge = template
        .recharge
        .map(|ms| interval_from_millis(name, ms))
        .transpose()?;
    Ok(Box::new(Vehicle::with_stats(
        name,
        template.health.unwrap_or(DEFAULT_HEALTH),
        recharge,
        crew,
    )?))
}
