//! Attack strategies and enemy squad selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::battle::squad::Squad;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{lock, Shared};

/// How a squad picks its target among living enemy squads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStrategy {
    /// Uniformly random
    #[default]
    Random,
    /// Lowest score
    Weak,
    /// Highest score
    Strong,
}

impl AttackStrategy {
    pub const ALL: [AttackStrategy; 3] = [Self::Random, Self::Weak, Self::Strong];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Weak => "weak",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for AttackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackStrategy {
    type Err = SkirmishError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SkirmishError::InvalidAttackStrategy(s.to_string()))
    }
}

/// Pick a target among `enemies`. Dead squads are never chosen; `None`
/// means no enemy is alive.
pub fn select_target(
    strategy: AttackStrategy,
    enemies: &[Shared<Squad>],
) -> Result<Option<Shared<Squad>>> {
    let mut living = Vec::with_capacity(enemies.len());
    for squad in enemies {
        let guard = lock(squad);
        if !guard.is_dead() {
            let score = match strategy {
                AttackStrategy::Random => 0.0,
                AttackStrategy::Weak | AttackStrategy::Strong => guard.score()?,
            };
            living.push((OrderedFloat(score), squad));
        }
    }

    let chosen = match strategy {
        AttackStrategy::Random => living.choose(&mut rand::thread_rng()).map(|(_, s)| *s),
        AttackStrategy::Weak => living.iter().min_by_key(|(score, _)| *score).map(|(_, s)| *s),
        AttackStrategy::Strong => living.iter().max_by_key(|(score, _)| *score).map(|(_, s)| *s),
    };

    Ok(chosen.map(Arc::clone))
}
