//! Armies: squad rosters with a fair attack rotation
//!
//! Every squad sits in the rotation exactly once. `attack()` pulls squads
//! from the head and re-enqueues them at the tail; dead squads are passed
//! over, so each living squad attacks once per full rotation.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::battle::squad::{AttackEvent, Squad};
use crate::battle::targeting::select_target;
use crate::combat::constants::MIN_ARMY_SQUADS;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{lock, shared, ArmyId, Shared, SquadId};
use crate::entity::ActiveObject;

/// One resolved attack attempt, attributed to the squad that made it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker: String,
    pub attacker_id: SquadId,
    #[serde(flatten)]
    pub event: AttackEvent,
}

#[derive(Debug)]
pub struct Army {
    id: ArmyId,
    object: ActiveObject,
    squads: Vec<Shared<Squad>>,
    /// Indices into `squads`
    rotation: VecDeque<usize>,
    enemies: Vec<Shared<Squad>>,
}

impl Army {
    pub fn new(name: impl Into<String>, squads: Vec<Squad>) -> Result<Self> {
        let object = ActiveObject::new(name)?;
        if squads.len() < MIN_ARMY_SQUADS {
            return Err(SkirmishError::RosterSize {
                what: "army",
                actual: squads.len(),
                min: MIN_ARMY_SQUADS,
            });
        }

        Ok(Self {
            id: ArmyId::new(),
            object,
            rotation: (0..squads.len()).collect(),
            squads: squads.into_iter().map(shared).collect(),
            enemies: Vec::new(),
        })
    }

    pub fn id(&self) -> ArmyId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    pub fn squads(&self) -> &[Shared<Squad>] {
        &self.squads
    }

    pub fn alive_squads(&self) -> Vec<Shared<Squad>> {
        self.squads
            .iter()
            .filter(|squad| !lock(squad).is_dead())
            .cloned()
            .collect()
    }

    pub fn is_defeated(&self) -> bool {
        self.squads.iter().all(|squad| lock(squad).is_dead())
    }

    /// Squad names in the order they will attack next
    pub fn rotation(&self) -> Vec<String> {
        self.rotation
            .iter()
            .map(|&index| lock(&self.squads[index]).name().to_string())
            .collect()
    }

    /// Recompute the enemy list from the living squads of every other army.
    pub fn set_enemies<'a>(&mut self, armies: impl IntoIterator<Item = &'a Army>) {
        self.enemies = armies
            .into_iter()
            .filter(|army| army.id != self.id)
            .flat_map(Army::alive_squads)
            .collect();
    }

    /// Living squads among the last assigned enemies
    pub fn enemies(&self) -> Vec<Shared<Squad>> {
        self.enemies
            .iter()
            .filter(|squad| !lock(squad).is_dead())
            .cloned()
            .collect()
    }

    /// Let the next living squad in the rotation attack an enemy picked by
    /// its strategy. Returns `None` when no squad could attack.
    pub fn attack(&mut self) -> Result<Option<AttackReport>> {
        for _ in 0..self.rotation.len() {
            let Some(index) = self.rotation.pop_front() else {
                return Ok(None);
            };
            self.rotation.push_back(index);

            let squad = &self.squads[index];
            let strategy = {
                let guard = lock(squad);
                if guard.is_dead() {
                    continue;
                }
                guard.strategy()
            };

            let Some(target) = select_target(strategy, &self.enemies)? else {
                return Ok(None);
            };
            if Arc::ptr_eq(squad, &target) {
                return Ok(None);
            }

            let mut attacker = lock(squad);
            let mut defender = lock(&target);
            let event = attacker.attack(&mut defender)?;
            return Ok(Some(AttackReport {
                attacker: attacker.name().to_string(),
                attacker_id: attacker.id(),
                event,
            }));
        }
        Ok(None)
    }

    /// Activate the army and cascade to every squad.
    pub fn spawn(&mut self) {
        for squad in &self.squads {
            lock(squad).spawn();
        }
        self.object.activate();
        tracing::debug!(army = %self.name(), squads = self.squads.len(), "army spawned");
    }

    pub fn despawn(&mut self) {
        for squad in &self.squads {
            lock(squad).despawn();
        }
        self.object.deactivate();
        tracing::debug!(army = %self.name(), "army despawned");
    }
}

/// Give every army the living squads of all the others as enemies.
pub fn assign_enemies(armies: &mut [Army]) {
    let enemy_lists: Vec<Vec<Shared<Squad>>> = armies
        .iter()
        .map(|army| {
            armies
                .iter()
                .filter(|other| other.id != army.id)
                .flat_map(Army::alive_squads)
                .collect()
        })
        .collect();

    for (army, enemies) in armies.iter_mut().zip(enemy_lists) {
        army.enemies = enemies;
    }
}
