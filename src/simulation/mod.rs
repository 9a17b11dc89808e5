pub mod events;
pub mod simulator;

pub use events::{BattleEvent, BattleEventType, BattleLog, BattleOutcome, UnitStatus};
pub use simulator::{ArmyStatus, BattleSummary, Simulator};
