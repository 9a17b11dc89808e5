//! Vehicle: a composite combatant operated by a crew of soldiers
//!
//! Probability, damage, experience, recharge and death all derive from the
//! living crew. Incoming damage is split between the hull and the crew by
//! [`split_damage`].

use std::time::Duration;

use rand::Rng;

use crate::combat::constants::{
    DEFAULT_HEALTH, EXPERIENCE_PER_DAMAGE, MAX_CREW, MIN_CREW, VEHICLE_BASE_DAMAGE,
    VEHICLE_HULL_SHARE, VEHICLE_MAX_RECHARGE_MS, VEHICLE_MIN_RECHARGE_MS,
    VEHICLE_PRIMARY_CREW_SHARE,
};
use crate::combat::soldier::Soldier;
use crate::combat::unit::{clamp_recharge, mean, random_recharge, Combatant, UnitCore};
use crate::core::error::Result;

/// How one hit is distributed across a vehicle and its living crew
#[derive(Debug, Clone, PartialEq)]
pub struct DamageSplit {
    pub hull: f64,
    /// Per living crew member, in crew order
    pub crew: Vec<f64>,
}

impl DamageSplit {
    pub fn total(&self) -> f64 {
        self.hull + self.crew.iter().sum::<f64>()
    }
}

/// Split `damage` between the hull and `living` crew members, with the
/// crew member at index `primary` taking the larger crew share.
///
/// With no living crew the hull takes everything. Otherwise the hull takes
/// 30%, the primary member takes half of the rest, and the remainder is
/// shared evenly by the other members. A lone member takes the whole rest.
pub fn split_damage(damage: f64, living: usize, primary: usize) -> DamageSplit {
    if living == 0 {
        return DamageSplit {
            hull: damage,
            crew: Vec::new(),
        };
    }

    let hull = damage * VEHICLE_HULL_SHARE;
    let rest = damage - hull;
    if living == 1 {
        return DamageSplit {
            hull,
            crew: vec![rest],
        };
    }

    let primary = primary.min(living - 1);
    let primary_share = rest * VEHICLE_PRIMARY_CREW_SHARE;
    let other_share = (rest - primary_share) / (living - 1) as f64;
    let crew = (0..living)
        .map(|i| if i == primary { primary_share } else { other_share })
        .collect();

    DamageSplit { hull, crew }
}

#[derive(Debug)]
pub struct Vehicle {
    core: UnitCore,
    crew: Vec<Soldier>,
}

impl Vehicle {
    /// Full-health vehicle with a random recharge in the vehicle range.
    pub fn new(name: impl Into<String>, crew: Vec<Soldier>) -> Result<Self> {
        Self::with_stats(name, DEFAULT_HEALTH, None, crew)
    }

    /// Crew size is clamped into [1, 3]: extra members are dropped and
    /// missing ones are filled with fresh soldiers.
    pub fn with_stats(
        name: impl Into<String>,
        health: f64,
        recharge: Option<Duration>,
        crew: Vec<Soldier>,
    ) -> Result<Self> {
        let range = VEHICLE_MIN_RECHARGE_MS..=VEHICLE_MAX_RECHARGE_MS;
        let recharge = match recharge {
            Some(duration) => clamp_recharge(duration, range),
            None => random_recharge(range),
        };
        let core = UnitCore::new(name, health, recharge)?;
        let crew = fit_crew(core.name(), crew)?;

        Ok(Self { core, crew })
    }

    pub fn crew_mut(&mut self) -> &mut [Soldier] {
        &mut self.crew
    }

    pub fn living_crew(&self) -> impl Iterator<Item = &Soldier> + '_ {
        self.crew.iter().filter(|soldier| !soldier.is_dead())
    }

    pub fn living_crew_count(&self) -> usize {
        self.living_crew().count()
    }

    /// Swap in a new crew. The old crew is despawned; the new one is
    /// spawned if the vehicle is active.
    pub fn replace_crew(&mut self, crew: Vec<Soldier>) -> Result<Vec<Soldier>> {
        let mut crew = fit_crew(self.core.name(), crew)?;
        if self.is_active() {
            for soldier in &mut crew {
                soldier.activate();
            }
        }

        let mut previous = std::mem::replace(&mut self.crew, crew);
        for soldier in &mut previous {
            soldier.deactivate();
        }
        Ok(previous)
    }
}

fn fit_crew(vehicle: &str, mut crew: Vec<Soldier>) -> Result<Vec<Soldier>> {
    if crew.len() > MAX_CREW {
        tracing::warn!(
            vehicle,
            requested = crew.len(),
            max = MAX_CREW,
            "crew too large, dropping extra members"
        );
        crew.truncate(MAX_CREW);
    }
    while crew.len() < MIN_CREW {
        let index = crew.len() + 1;
        crew.push(Soldier::new(format!("{vehicle} crew #{index}"))?);
    }
    Ok(crew)
}

impl Combatant for Vehicle {
    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "vehicle"
    }

    fn calculate_attack_probability(&self) -> Result<f64> {
        let probabilities = self
            .living_crew()
            .map(Combatant::attack_probability)
            .collect::<Result<Vec<_>>>()?;
        Ok(mean(&probabilities))
    }

    fn calculate_damage(&self) -> Result<f64> {
        Ok(VEHICLE_BASE_DAMAGE + self.experience() / EXPERIENCE_PER_DAMAGE)
    }

    /// Sum over living crew
    fn experience(&self) -> f64 {
        self.living_crew().map(Combatant::experience).sum()
    }

    fn increase_experience(&mut self, amount: f64) {
        for soldier in self.crew.iter_mut().filter(|s| !s.is_dead()) {
            soldier.increase_experience(amount);
        }
    }

    fn crew(&self) -> &[Soldier] {
        &self.crew
    }

    fn is_dead(&self) -> bool {
        self.core.health() <= 0.0 || self.living_crew_count() == 0
    }

    fn absorb_damage(&mut self, amount: f64) {
        let living: Vec<usize> = self
            .crew
            .iter()
            .enumerate()
            .filter(|(_, soldier)| !soldier.is_dead())
            .map(|(i, _)| i)
            .collect();
        let primary = if living.is_empty() {
            0
        } else {
            rand::thread_rng().gen_range(0..living.len())
        };

        let split = split_damage(amount, living.len(), primary);
        let health = self.core.health() - split.hull;
        self.core.write_health(health);
        for (&index, share) in living.iter().zip(split.crew) {
            self.crew[index].receive_damage(share);
        }
    }

    fn recharge(&mut self) {
        if self.is_dead() {
            return;
        }
        self.core.start_recharge();
        for soldier in self.crew.iter_mut().filter(|s| !s.is_dead()) {
            soldier.recharge();
        }
    }

    fn is_recharging(&self) -> bool {
        !self.is_dead()
            && (self.core.recharge_flag() || self.living_crew().any(Combatant::is_recharging))
    }

    fn activate(&mut self) {
        self.core.activate();
        for soldier in &mut self.crew {
            soldier.activate();
        }
    }

    fn deactivate(&mut self) {
        for soldier in &mut self.crew {
            soldier.deactivate();
        }
        self.core.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier(name: &str, experience: f64) -> Soldier {
        Soldier::with_stats(name, 100.0, experience, Some(Duration::from_millis(200))).unwrap()
    }

    fn tank(crew: Vec<Soldier>) -> Vehicle {
        Vehicle::with_stats("tank", 100.0, Some(Duration::from_millis(1500)), crew).unwrap()
    }

    #[test]
    fn test_split_two_crew() {
        let split = split_damage(100.0, 2, 1);
        assert_eq!(split.hull, 30.0);
        assert_eq!(split.crew, vec![35.0, 35.0]);
        assert_eq!(split.total(), 100.0);
    }

    #[test]
    fn test_split_one_crew() {
        let split = split_damage(100.0, 1, 0);
        assert_eq!(split.hull, 30.0);
        assert_eq!(split.crew, vec![70.0]);
    }

    #[test]
    fn test_split_three_crew_primary_takes_half() {
        let split = split_damage(100.0, 3, 2);
        assert_eq!(split.hull, 30.0);
        assert!((split.crew[2] - 35.0).abs() < 1e-12);
        assert!((split.crew[0] - 17.5).abs() < 1e-12);
        assert!((split.crew[1] - 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_split_without_crew_hits_hull() {
        let split = split_damage(12.0, 0, 0);
        assert_eq!(split.hull, 12.0);
        assert!(split.crew.is_empty());
    }

    #[test]
    fn test_crew_size_is_clamped() {
        let crowded = tank((0..5).map(|i| soldier(&format!("s{i}"), 0.0)).collect());
        assert_eq!(crowded.crew().len(), MAX_CREW);

        let empty = tank(Vec::new());
        assert_eq!(empty.crew().len(), MIN_CREW);
        assert_eq!(empty.crew()[0].name(), "tank crew #1");
    }

    #[test]
    fn test_damage_from_living_crew_experience() {
        let mut vehicle = tank(vec![soldier("a", 10.0), soldier("b", 20.0)]);
        assert!((vehicle.damage().unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(vehicle.experience(), 30.0);

        vehicle.crew_mut()[1].receive_damage(100.0);
        assert!((vehicle.damage().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_dead_when_crew_dead() {
        let mut vehicle = tank(vec![soldier("a", 0.0)]);
        assert!(!vehicle.is_dead());
        vehicle.crew_mut()[0].receive_damage(100.0);
        assert!(vehicle.is_dead());
        assert!(vehicle.health() > 0.0);
        assert_eq!(vehicle.attack_probability().unwrap(), 0.0);
    }

    #[test]
    fn test_receive_damage_distributes() {
        let mut vehicle = tank(vec![soldier("a", 0.0)]);
        vehicle.receive_damage(10.0);
        assert!((vehicle.health() - 97.0).abs() < 1e-12);
        assert!((vehicle.crew()[0].health() - 93.0).abs() < 1e-12);
    }

    #[test]
    fn test_recharge_covers_crew() {
        let mut vehicle = tank(vec![soldier("a", 0.0), soldier("b", 0.0)]);
        vehicle.activate();
        assert!(!vehicle.is_recharging());

        vehicle.recharge();
        assert!(vehicle.core().recharge_flag());
        assert!(vehicle.crew().iter().all(Combatant::is_recharging));

        // Hull clears first, crew still busy
        vehicle.core().tick_recharge();
        assert!(vehicle.is_recharging());

        for soldier in vehicle.crew() {
            soldier.core().tick_recharge();
        }
        assert!(!vehicle.is_recharging());
    }

    #[test]
    fn test_activation_cascades_to_crew() {
        let mut vehicle = tank(vec![soldier("a", 0.0), soldier("b", 0.0)]);
        vehicle.activate();
        assert!(vehicle.crew().iter().all(Combatant::is_active));
        vehicle.deactivate();
        assert!(vehicle.crew().iter().all(|s| !s.is_active()));
    }

    #[test]
    fn test_replace_crew_despawns_previous() {
        let mut vehicle = tank(vec![soldier("a", 0.0)]);
        vehicle.activate();

        let previous = vehicle.replace_crew(vec![soldier("b", 5.0)]).unwrap();
        assert_eq!(previous.len(), 1);
        assert!(!previous[0].is_active());
        assert!(vehicle.crew()[0].is_active());
        assert_eq!(vehicle.crew()[0].name(), "b");
    }

    #[test]
    fn test_experience_spreads_to_living_crew() {
        let mut vehicle = tank(vec![soldier("a", 1.0), soldier("b", 1.0)]);
        vehicle.crew_mut()[0].receive_damage(100.0);
        vehicle.increase_experience(2.0);
        assert_eq!(vehicle.crew()[0].experience(), 1.0);
        assert_eq!(vehicle.crew()[1].experience(), 3.0);
    }

    #[test]
    fn test_recharge_floor_survives_despawn() {
        let mut vehicle =
            Vehicle::with_stats("scout car", 100.0, Some(Duration::from_millis(200)), Vec::new())
                .unwrap();
        let floor = Some(Duration::from_millis(VEHICLE_MIN_RECHARGE_MS));
        assert_eq!(vehicle.core().recharge_duration(), floor);

        vehicle.activate();
        vehicle.deactivate();
        assert_eq!(vehicle.core().recharge_duration(), floor);
    }
}
