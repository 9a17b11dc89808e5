pub mod constants;
pub mod soldier;
pub mod unit;
pub mod vehicle;

pub use soldier::Soldier;
pub use unit::{Combatant, DeathListener, UnitCore};
pub use vehicle::{split_damage, DamageSplit, Vehicle};
