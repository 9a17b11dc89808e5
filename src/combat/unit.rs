//! Combatant capability and the shared unit core
//!
//! Every unit variant owns a [`UnitCore`] (name, health and recharge
//! attributes, death listeners) and implements [`Combatant`]. Variants
//! supply the probability and damage calculus; the defaults report
//! `NotImplemented`, which points at a unit that was built incompletely.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

use crate::combat::constants::{MAX_HEALTH, MIN_HEALTH};
use crate::combat::soldier::Soldier;
use crate::core::error::{Result, SkirmishError};
use crate::entity::{
    ActiveObject, AttributeSpec, ListenerId, Listeners, TimedAttribute, UpdatePolicy,
};

pub const HEALTH: &str = "health";
pub const IS_RECHARGING: &str = "isRecharging";

/// Called with the unit's name when it dies
pub type DeathListener = dyn FnMut(&str) + Send;

pub fn clamp_health(health: f64) -> f64 {
    if health.is_nan() {
        return MIN_HEALTH;
    }
    health.clamp(MIN_HEALTH, MAX_HEALTH)
}

/// Uniformly random recharge duration within `range_ms`
pub fn random_recharge(range_ms: RangeInclusive<u64>) -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(range_ms))
}

/// Clamp `duration` into `range_ms`
pub fn clamp_recharge(duration: Duration, range_ms: RangeInclusive<u64>) -> Duration {
    let min = Duration::from_millis(*range_ms.start());
    let max = Duration::from_millis(*range_ms.end());
    duration.clamp(min, max)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// State shared by every unit variant
#[derive(Debug)]
pub struct UnitCore {
    object: ActiveObject,
    on_death: Listeners<DeathListener>,
    death_reported: bool,
}

impl UnitCore {
    pub fn new(name: impl Into<String>, health: f64, recharge: Duration) -> Result<Self> {
        let mut object = ActiveObject::new(name)?;
        object.add_attribute(AttributeSpec::fixed(HEALTH, clamp_health(health)))?;

        let recharging = TimedAttribute::new(AttributeSpec::updating(
            IS_RECHARGING,
            false,
            UpdatePolicy::Overwrite,
            false,
            recharge,
        ))?
        .with_gate(|value| value.as_bool() == Some(true));
        object.insert_attribute(recharging);

        Ok(Self {
            object,
            on_death: Listeners::new(),
            death_reported: false,
        })
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn object(&self) -> &ActiveObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut ActiveObject {
        &mut self.object
    }

    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    pub fn health(&self) -> f64 {
        self.object.number(HEALTH).unwrap_or(MIN_HEALTH)
    }

    /// Set health, clamped to [0, 100]. Does not fire death listeners.
    pub fn set_health(&mut self, health: f64) -> Result<()> {
        self.object
            .require_attribute_mut(HEALTH)?
            .set_value(clamp_health(health))
    }

    pub(crate) fn write_health(&mut self, health: f64) {
        if let Some(attribute) = self.object.attribute(HEALTH) {
            attribute.store_number(clamp_health(health));
        }
    }

    pub fn recharge_flag(&self) -> bool {
        self.object.flag(IS_RECHARGING).unwrap_or(false)
    }

    /// Raise the recharge flag; the attribute timer lowers it one full
    /// recharge duration later.
    pub fn start_recharge(&mut self) {
        if let Some(attribute) = self.object.attribute(IS_RECHARGING) {
            attribute.store_flag(true);
            attribute.rearm();
        }
    }

    /// Drive the recharge timer by hand (no async runtime).
    pub fn tick_recharge(&self) -> bool {
        self.object
            .attribute(IS_RECHARGING)
            .is_some_and(TimedAttribute::tick)
    }

    pub fn recharge_duration(&self) -> Option<Duration> {
        self.object
            .attribute(IS_RECHARGING)
            .and_then(TimedAttribute::interval)
    }

    /// Set the recharge duration, clamped into `range_ms`.
    pub fn set_recharge_duration(
        &mut self,
        duration: Duration,
        range_ms: RangeInclusive<u64>,
    ) -> Result<()> {
        self.object
            .require_attribute_mut(IS_RECHARGING)?
            .set_interval(clamp_recharge(duration, range_ms))
    }

    pub fn activate(&mut self) {
        self.object.activate();
    }

    pub fn deactivate(&mut self) {
        self.object.deactivate();
        self.death_reported = false;
    }

    pub fn add_death_listener(&mut self, listener: impl FnMut(&str) + Send + 'static) -> ListenerId {
        self.on_death.add(Box::new(listener))
    }

    pub fn remove_death_listener(&mut self, id: ListenerId) -> bool {
        self.on_death.remove(id)
    }

    /// Fire death listeners once per death.
    pub(crate) fn report_death(&mut self) {
        if self.death_reported {
            return;
        }
        self.death_reported = true;
        tracing::debug!(unit = %self.object.name(), "unit died");

        let name = self.object.name();
        for listener in self.on_death.iter_mut() {
            listener(name);
        }
    }
}

/// What squads, armies and targeting need from a unit
pub trait Combatant: Send {
    fn core(&self) -> &UnitCore;
    fn core_mut(&mut self) -> &mut UnitCore;

    /// Short type tag used in logs and scenario files
    fn kind(&self) -> &'static str;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn calculate_attack_probability(&self) -> Result<f64> {
        Err(SkirmishError::NotImplemented("attack probability calculus"))
    }

    fn calculate_damage(&self) -> Result<f64> {
        Err(SkirmishError::NotImplemented("damage calculus"))
    }

    /// Zero for dead units
    fn attack_probability(&self) -> Result<f64> {
        if self.is_dead() {
            return Ok(0.0);
        }
        self.calculate_attack_probability()
    }

    /// Zero for dead units
    fn damage(&self) -> Result<f64> {
        if self.is_dead() {
            return Ok(0.0);
        }
        self.calculate_damage()
    }

    fn health(&self) -> f64 {
        self.core().health()
    }

    fn experience(&self) -> f64 {
        0.0
    }

    fn increase_experience(&mut self, _amount: f64) {}

    fn crew(&self) -> &[Soldier] {
        &[]
    }

    fn is_dead(&self) -> bool {
        self.health() <= MIN_HEALTH
    }

    /// Take health loss without death bookkeeping.
    fn absorb_damage(&mut self, amount: f64) {
        let core = self.core_mut();
        let health = core.health() - amount;
        core.write_health(health);
    }

    fn receive_damage(&mut self, amount: f64) {
        if self.is_dead() {
            return;
        }
        self.absorb_damage(amount);
        if self.is_dead() {
            self.core_mut().report_death();
        }
    }

    fn recharge(&mut self) {
        if !self.is_dead() {
            self.core_mut().start_recharge();
        }
    }

    fn is_recharging(&self) -> bool {
        !self.is_dead() && self.core().recharge_flag()
    }

    fn is_active(&self) -> bool {
        self.core().is_active()
    }

    fn can_attack(&self) -> bool {
        self.is_active() && !self.is_recharging() && !self.is_dead()
    }

    fn activate(&mut self) {
        self.core_mut().activate();
    }

    fn deactivate(&mut self) {
        self.core_mut().deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Unit that forgot to provide its calculus
    struct Recruit {
        core: UnitCore,
    }

    impl Combatant for Recruit {
        fn core(&self) -> &UnitCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut UnitCore {
            &mut self.core
        }
        fn kind(&self) -> &'static str {
            "recruit"
        }
    }

    fn recruit(health: f64) -> Recruit {
        Recruit {
            core: UnitCore::new("recruit", health, Duration::from_millis(500)).unwrap(),
        }
    }

    #[test]
    fn test_missing_calculus_is_not_implemented() {
        let unit = recruit(50.0);
        assert!(matches!(
            unit.attack_probability(),
            Err(SkirmishError::NotImplemented(_))
        ));
        assert!(matches!(unit.damage(), Err(SkirmishError::NotImplemented(_))));
    }

    #[test]
    fn test_dead_unit_short_circuits_calculus() {
        let unit = recruit(0.0);
        assert_eq!(unit.attack_probability().unwrap(), 0.0);
        assert_eq!(unit.damage().unwrap(), 0.0);
    }

    #[test]
    fn test_health_is_clamped() {
        let mut unit = recruit(250.0);
        assert_eq!(unit.health(), MAX_HEALTH);
        unit.core_mut().set_health(-10.0).unwrap();
        assert_eq!(unit.health(), MIN_HEALTH);
    }

    #[test]
    fn test_death_listeners_fire_once() {
        let deaths = Arc::new(Mutex::new(Vec::new()));
        let mut unit = recruit(10.0);
        let log = Arc::clone(&deaths);
        unit.core_mut()
            .add_death_listener(move |name| log.lock().unwrap().push(name.to_string()));

        unit.receive_damage(4.0);
        assert_eq!(unit.health(), 6.0);
        unit.receive_damage(50.0);
        unit.receive_damage(50.0);

        assert!(unit.is_dead());
        assert_eq!(unit.health(), 0.0);
        assert_eq!(*deaths.lock().unwrap(), vec!["recruit"]);
    }

    #[test]
    fn test_dead_unit_never_recharges() {
        let mut unit = recruit(0.0);
        unit.recharge();
        assert!(!unit.is_recharging());
    }

    #[test]
    fn test_can_attack_requires_active_and_ready() {
        let mut unit = recruit(100.0);
        assert!(!unit.can_attack());

        unit.activate();
        assert!(unit.can_attack());

        unit.recharge();
        assert!(unit.is_recharging());
        assert!(!unit.can_attack());

        assert!(unit.core().tick_recharge());
        assert!(unit.can_attack());
    }

    #[test]
    fn test_recharge_duration_is_clamped() {
        let mut unit = recruit(100.0);
        unit.core_mut()
            .set_recharge_duration(Duration::from_millis(10), 100..=2000)
            .unwrap();
        assert_eq!(
            unit.core().recharge_duration(),
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn test_clamp_recharge_bounds() {
        assert_eq!(
            clamp_recharge(Duration::ZERO, 100..=2000),
            Duration::from_millis(100)
        );
        assert_eq!(
            clamp_recharge(Duration::from_secs(5), 100..=2000),
            Duration::from_millis(2000)
        );
        assert_eq!(
            clamp_recharge(Duration::from_millis(750), 100..=2000),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_random_recharge_in_range() {
        for _ in 0..50 {
            let duration = random_recharge(100..=2000);
            assert!(duration >= Duration::from_millis(100));
            assert!(duration <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 3.0]), 2.0);
    }
}
