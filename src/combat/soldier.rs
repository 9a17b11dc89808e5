//! Soldier: the basic combatant, whose calculus reads experience

use std::time::Duration;

use rand::Rng;

use crate::combat::constants::{
    DEFAULT_HEALTH, EXPERIENCE_PER_DAMAGE, MAX_EXPERIENCE, MAX_RECHARGE_MS, MAX_ROLL,
    MIN_EXPERIENCE, MIN_RECHARGE_MS, SOLDIER_BASE_DAMAGE, SOLDIER_MIN_ROLL,
};
use crate::combat::unit::{clamp_recharge, random_recharge, Combatant, UnitCore};
use crate::core::error::Result;
use crate::entity::AttributeSpec;

pub const EXPERIENCE: &str = "experience";

pub fn clamp_experience(experience: f64) -> f64 {
    if experience.is_nan() {
        return MIN_EXPERIENCE;
    }
    experience.clamp(MIN_EXPERIENCE, MAX_EXPERIENCE)
}

#[derive(Debug)]
pub struct Soldier {
    core: UnitCore,
}

impl Soldier {
    /// Fresh soldier: full health, no experience, random recharge.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_stats(name, DEFAULT_HEALTH, MIN_EXPERIENCE, None)
    }

    pub fn with_stats(
        name: impl Into<String>,
        health: f64,
        experience: f64,
        recharge: Option<Duration>,
    ) -> Result<Self> {
        let range = MIN_RECHARGE_MS..=MAX_RECHARGE_MS;
        let recharge = match recharge {
            Some(duration) => clamp_recharge(duration, range),
            None => random_recharge(range),
        };
        let mut core = UnitCore::new(name, health, recharge)?;
        core.object_mut()
            .add_attribute(AttributeSpec::fixed(EXPERIENCE, clamp_experience(experience)))?;

        Ok(Self { core })
    }

    pub fn set_experience(&mut self, experience: f64) -> Result<()> {
        self.core
            .object_mut()
            .require_attribute_mut(EXPERIENCE)?
            .set_value(clamp_experience(experience))
    }
}

impl Combatant for Soldier {
    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "soldier"
    }

    /// `0.5 * (1 + health/100) * U(30 + experience, 100) / 100`
    fn calculate_attack_probability(&self) -> Result<f64> {
        let roll = rand::thread_rng().gen_range((SOLDIER_MIN_ROLL + self.experience())..=MAX_ROLL);
        Ok(0.5 * (1.0 + self.health() / 100.0) * roll / 100.0)
    }

    fn calculate_damage(&self) -> Result<f64> {
        Ok(SOLDIER_BASE_DAMAGE + self.experience() / EXPERIENCE_PER_DAMAGE)
    }

    fn experience(&self) -> f64 {
        self.core
            .object()
            .number(EXPERIENCE)
            .unwrap_or(MIN_EXPERIENCE)
    }

    fn increase_experience(&mut self, amount: f64) {
        if self.is_dead() {
            return;
        }
        let experience = clamp_experience(self.experience() + amount);
        if let Some(attribute) = self.core.object().attribute(EXPERIENCE) {
            attribute.store_number(experience);
        }
    }
}
