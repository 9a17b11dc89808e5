//! Battle events and the human-readable battle log

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::battle::Squad;
use crate::combat::Combatant;
use crate::core::error::Result;
use crate::core::types::Tick;

/// How a battle ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory { winner: String },
    /// No army left standing, or the tick limit ran out
    Draw,
}

impl BattleOutcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Self::Victory { winner } => Some(winner),
            Self::Draw => None,
        }
    }
}

/// Health snapshot of one unit, with its crew for vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub name: String,
    pub health: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crew: Vec<UnitStatus>,
}

impl UnitStatus {
    pub fn of(unit: &dyn Combatant) -> Self {
        Self {
            name: unit.name().to_string(),
            health: unit.health(),
            crew: unit
                .crew()
                .iter()
                .map(|soldier| UnitStatus::of(soldier))
                .collect(),
        }
    }

    pub fn roster(squad: &Squad) -> Vec<Self> {
        squad.units().iter().map(|unit| Self::of(unit.as_ref())).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEventType {
    BattleStarted {
        armies: Vec<String>,
    },
    Missed {
        squad: String,
        target: String,
    },
    Hit {
        squad: String,
        target: String,
        damage: f64,
    },
    /// First blocked attempt of a recharge streak
    Recharging {
        squad: String,
    },
    Damaged {
        squad: String,
        source: String,
        damage: f64,
        units: Vec<UnitStatus>,
    },
    SquadDestroyed {
        squad: String,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub tick: Tick,
    #[serde(flatten)]
    pub event_type: BattleEventType,
}

impl BattleEvent {
    pub fn new(tick: Tick, event_type: BattleEventType) -> Self {
        Self { tick, event_type }
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event_type {
            BattleEventType::BattleStarted { armies } => {
                write!(f, "Battle started: {}", armies.join(" vs "))
            }
            BattleEventType::Missed { squad, target } => {
                write!(f, "{squad} missed attack on {target}")
            }
            BattleEventType::Hit {
                squad,
                target,
                damage,
            } => write!(
                f,
                "{squad} landed successful attack on {target}, making {damage} damage"
            ),
            BattleEventType::Recharging { squad } => write!(f, "{squad} is recharging."),
            BattleEventType::Damaged {
                squad,
                source,
                damage,
                units,
            } => {
                write!(f, "{squad} damaged by {source} with {damage} damage")?;
                for unit in units {
                    write!(f, "\n\t{} HP {}", unit.name, unit.health)?;
                    for member in &unit.crew {
                        write!(f, "\n\t{} {} HP {}", unit.name, member.name, member.health)?;
                    }
                }
                Ok(())
            }
            BattleEventType::SquadDestroyed { squad } => {
                write!(f, "{squad} lost all of its units")
            }
            BattleEventType::BattleEnded { outcome } => match outcome {
                BattleOutcome::Victory { winner } => write!(f, "{winner} won!"),
                BattleOutcome::Draw => write!(f, "Battle ended in a draw"),
            },
        }
    }
}

/// Writes every recorded event as text and mirrors it to tracing
pub struct BattleLog<W: Write> {
    writer: W,
    events: Vec<BattleEvent>,
}

impl BattleLog<io::Sink> {
    /// Log that keeps events in memory only
    pub fn in_memory() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> BattleLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, event: BattleEvent) -> Result<()> {
        let line = event.to_string();
        tracing::info!(tick = event.tick, "{line}");
        writeln!(self.writer, "{line}")?;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> fmt::Debug for BattleLog<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleLog")
            .field("events", &self.events.len())
            .finish()
    }
}
