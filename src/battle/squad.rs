//! Squads: bounded unit rosters that attack as one
//!
//! A single attack attempt resolves in order: recharge gate, probability
//! comparison, damage. Each attempt ends in exactly one [`AttackStatus`],
//! reported to the attacker's attack listeners.

use std::fmt;
use std::mem;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::targeting::AttackStrategy;
use crate::combat::constants::{MAX_CREW, MAX_SQUAD_UNITS, MIN_CREW, MIN_SQUAD_UNITS};
use crate::combat::unit::mean;
use crate::combat::{Combatant, Soldier, Vehicle};
use crate::core::error::Result;
use crate::core::types::SquadId;
use crate::entity::{ActiveObject, ListenerId, Listeners};

/// Outcome of one attack attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStatus {
    /// A living unit of the attacker is still recharging
    Recharging,
    /// The target's attack probability is strictly higher
    LowProbability,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub target: String,
    pub target_id: SquadId,
    pub damage: f64,
    pub status: AttackStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub source: String,
    pub source_id: SquadId,
    pub damage: f64,
}

pub type AttackListener = dyn FnMut(&mut Squad, &AttackEvent) + Send;
pub type DamageListener = dyn FnMut(&mut Squad, &DamageEvent) + Send;
pub type SquadDeathListener = dyn FnMut(&mut Squad) + Send;

pub struct Squad {
    id: SquadId,
    object: ActiveObject,
    strategy: AttackStrategy,
    units: Vec<Box<dyn Combatant>>,
    on_attack: Listeners<AttackListener>,
    on_damage: Listeners<DamageListener>,
    on_death: Listeners<SquadDeathListener>,
    death_reported: bool,
}

impl fmt::Debug for Squad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Squad")
            .field("id", &self.id)
            .field("name", &self.object.name())
            .field("strategy", &self.strategy)
            .field("units", &self.units.len())
            .field("alive", &self.alive_count())
            .field("active", &self.object.is_active())
            .finish()
    }
}

impl Squad {
    /// Roster size is clamped into [5, 10]: extra units are dropped and
    /// missing ones are filled with fresh soldiers.
    pub fn new(
        name: impl Into<String>,
        strategy: AttackStrategy,
        mut units: Vec<Box<dyn Combatant>>,
    ) -> Result<Self> {
        let object = ActiveObject::new(name)?;

        if units.len() > MAX_SQUAD_UNITS {
            tracing::warn!(
                squad = %object.name(),
                requested = units.len(),
                max = MAX_SQUAD_UNITS,
                "squad too large, dropping extra units"
            );
            units.truncate(MAX_SQUAD_UNITS);
        }
        while units.len() < MIN_SQUAD_UNITS {
            let index = units.len() + 1;
            units.push(Box::new(Soldier::new(format!(
                "{} reserve #{index}",
                object.name()
            ))?));
        }

        Ok(Self {
            id: SquadId::new(),
            object,
            strategy,
            units,
            on_attack: Listeners::new(),
            on_damage: Listeners::new(),
            on_death: Listeners::new(),
            death_reported: false,
        })
    }

    /// Squad of `count` (clamped into [5, 10]) randomly chosen fresh
    /// soldiers and vehicles.
    pub fn generate(name: impl Into<String>, strategy: AttackStrategy, count: usize) -> Result<Self> {
        let count = count.clamp(MIN_SQUAD_UNITS, MAX_SQUAD_UNITS);
        let mut rng = rand::thread_rng();

        let mut units: Vec<Box<dyn Combatant>> = Vec::with_capacity(count);
        for index in 1..=count {
            if rng.gen_bool(0.5) {
                units.push(Box::new(Soldier::new(format!("Soldier #{index}"))?));
            } else {
                let name = format!("Vehicle #{index}");
                let crew = (1..=rng.gen_range(MIN_CREW..=MAX_CREW))
                    .map(|seat| Soldier::new(format!("{name} crew #{seat}")))
                    .collect::<Result<Vec<_>>>()?;
                units.push(Box::new(Vehicle::new(name, crew)?));
            }
        }

        Self::new(name, strategy, units)
    }

    pub fn id(&self) -> SquadId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn strategy(&self) -> AttackStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: AttackStrategy) {
        self.strategy = strategy;
    }

    pub fn object(&self) -> &ActiveObject {
        &self.object
    }

    pub fn units(&self) -> &[Box<dyn Combatant>] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [Box<dyn Combatant>] {
        &mut self.units
    }

    pub fn alive_units(&self) -> impl Iterator<Item = &dyn Combatant> + '_ {
        self.units
            .iter()
            .map(|unit| unit.as_ref())
            .filter(|unit| !unit.is_dead())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_units().count()
    }

    pub fn is_dead(&self) -> bool {
        self.alive_count() == 0
    }

    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    /// Mean over every unit, dead ones counting as zero
    pub fn attack_probability(&self) -> Result<f64> {
        let probabilities = self
            .units
            .iter()
            .map(|unit| unit.attack_probability())
            .collect::<Result<Vec<_>>>()?;
        Ok(mean(&probabilities))
    }

    /// Sum over living units
    pub fn damage(&self) -> Result<f64> {
        self.alive_units().map(|unit| unit.damage()).sum()
    }

    pub fn is_recharging(&self) -> bool {
        self.alive_units().any(|unit| unit.is_recharging())
    }

    pub fn recharge(&mut self) {
        for unit in self.units.iter_mut().filter(|unit| !unit.is_dead()) {
            unit.recharge();
        }
    }

    pub fn increase_units_experience(&mut self, amount: f64) {
        for unit in self.units.iter_mut().filter(|unit| !unit.is_dead()) {
            unit.increase_experience(amount);
        }
    }

    /// Ranking used by weak/strong targeting: health, experience and damage
    /// of every living unit, plus the living count.
    pub fn score(&self) -> Result<f64> {
        let mut score = 0.0;
        let mut alive = 0usize;
        for unit in self.alive_units() {
            score += unit.health() + unit.experience() + unit.damage()?;
            alive += 1;
        }
        Ok(score + alive as f64)
    }

    /// Split `event.damage` evenly across living units. Returns false if the
    /// squad was already dead.
    pub fn receive_damage(&mut self, event: DamageEvent) -> bool {
        if self.is_dead() {
            return false;
        }

        let share = event.damage / self.alive_count() as f64;
        for unit in self.units.iter_mut().filter(|unit| !unit.is_dead()) {
            unit.receive_damage(share);
        }

        let mut listeners = mem::take(&mut self.on_damage);
        for listener in listeners.iter_mut() {
            listener(self, &event);
        }
        restore(&mut self.on_damage, listeners);

        if self.is_dead() {
            self.report_death();
        }
        true
    }

    /// Resolve one attack attempt against `target`.
    pub fn attack(&mut self, target: &mut Squad) -> Result<AttackEvent> {
        let status = if self.is_recharging() {
            AttackStatus::Recharging
        } else if target.attack_probability()? > self.attack_probability()? {
            AttackStatus::LowProbability
        } else {
            AttackStatus::Success
        };

        let damage = match status {
            AttackStatus::Success => {
                let damage = self.damage()?;
                target.receive_damage(DamageEvent {
                    source: self.name().to_string(),
                    source_id: self.id,
                    damage,
                });
                damage
            }
            _ => 0.0,
        };

        let event = AttackEvent {
            target: target.name().to_string(),
            target_id: target.id(),
            damage,
            status,
        };

        let mut listeners = mem::take(&mut self.on_attack);
        for listener in listeners.iter_mut() {
            listener(self, &event);
        }
        restore(&mut self.on_attack, listeners);

        Ok(event)
    }

    fn report_death(&mut self) {
        if self.death_reported {
            return;
        }
        self.death_reported = true;
        tracing::info!(squad = %self.name(), "squad lost all of its units");

        let mut listeners = mem::take(&mut self.on_death);
        for listener in listeners.iter_mut() {
            listener(self);
        }
        restore(&mut self.on_death, listeners);
    }

    /// Activate the squad and every unit in it.
    pub fn spawn(&mut self) {
        self.object.activate();
        for unit in &mut self.units {
            unit.activate();
        }
    }

    /// Deactivate every unit, which resets their attributes.
    pub fn despawn(&mut self) {
        for unit in &mut self.units {
            unit.deactivate();
        }
        self.object.deactivate();
        self.death_reported = false;
    }

    pub fn add_attack_listener(
        &mut self,
        listener: impl FnMut(&mut Squad, &AttackEvent) + Send + 'static,
    ) -> ListenerId {
        self.on_attack.add(Box::new(listener))
    }

    pub fn remove_attack_listener(&mut self, id: ListenerId) -> bool {
        self.on_attack.remove(id)
    }

    pub fn add_damage_listener(
        &mut self,
        listener: impl FnMut(&mut Squad, &DamageEvent) + Send + 'static,
    ) -> ListenerId {
        self.on_damage.add(Box::new(listener))
    }

    pub fn remove_damage_listener(&mut self, id: ListenerId) -> bool {
        self.on_damage.remove(id)
    }

    pub fn add_death_listener(
        &mut self,
        listener: impl FnMut(&mut Squad) + Send + 'static,
    ) -> ListenerId {
        self.on_death.add(Box::new(listener))
    }

    pub fn remove_death_listener(&mut self, id: ListenerId) -> bool {
        self.on_death.remove(id)
    }
}

/// Put dispatched listeners back, keeping any registered during dispatch.
fn restore<F: ?Sized>(slot: &mut Listeners<F>, dispatched: Listeners<F>) {
    let added = mem::replace(slot, dispatched);
    slot.append(added);
}
