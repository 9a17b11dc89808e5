//! Battle system - squads, armies and target selection
//!
//! Death propagates upward: units die individually, a squad is dead once
//! every unit is, and an army is defeated once every squad is.

pub mod army;
pub mod squad;
pub mod targeting;

// Re-exports for convenient access
pub use army::{assign_enemies, Army, AttackReport};
pub use squad::{
    AttackEvent, AttackListener, AttackStatus, DamageEvent, DamageListener, Squad,
    SquadDeathListener,
};
pub use targeting::{select_target, AttackStrategy};
