//! Battle run loop
//!
//! Each tick every army gets one attack, enemies are reassigned, and the
//! events emitted by squad listeners are flushed to the battle log. The loop
//! ends when at most one army still has living squads or the tick limit is
//! reached.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{self, MissedTickBehavior};

use crate::battle::{assign_enemies, Army, AttackStatus, Squad};
use crate::core::config::SimulatorConfig;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{lock, Tick};
use crate::scenario::{Scenario, ScenarioParser};
use crate::simulation::events::{
    BattleEvent, BattleEventType, BattleLog, BattleOutcome, UnitStatus,
};

/// Survivors of one army when the battle ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyStatus {
    pub name: String,
    pub alive_squads: usize,
    pub alive_units: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub outcome: BattleOutcome,
    pub ticks: Tick,
    /// Attack attempts, whatever their outcome
    pub attacks: u64,
    pub successful_attacks: u64,
    pub armies: Vec<ArmyStatus>,
}

#[derive(Debug, Default)]
pub struct Simulator {
    parser: ScenarioParser,
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            parser: ScenarioParser::new(),
            config,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn parser_mut(&mut self) -> &mut ScenarioParser {
        &mut self.parser
    }

    /// Build the scenario's armies and fight until a winner emerges.
    pub async fn play_scenario<W: Write>(
        &self,
        scenario: &Scenario,
        log: &mut BattleLog<W>,
    ) -> Result<BattleSummary> {
        let armies = self.parser.parse(scenario)?;
        self.run(armies, log).await
    }

    pub async fn run<W: Write>(
        &self,
        mut armies: Vec<Army>,
        log: &mut BattleLog<W>,
    ) -> Result<BattleSummary> {
        self.config
            .validate()
            .map_err(|e| SkirmishError::Scenario(format!("invalid simulator config: {e}")))?;

        let (events, mut inbox) = mpsc::unbounded_channel();
        for army in &armies {
            for squad in army.squads() {
                install_listeners(&mut lock(squad), events.clone(), self.config.experience_gain);
            }
        }
        drop(events);

        assign_enemies(&mut armies);
        for army in &mut armies {
            army.spawn();
        }
        log.record(BattleEvent::new(
            0,
            BattleEventType::BattleStarted {
                armies: armies.iter().map(|army| army.name().to_string()).collect(),
            },
        ))?;
        tracing::info!(armies = armies.len(), "battle started");

        let mut ticker = (self.config.tick_interval_ms > 0).then(|| {
            let mut ticker = time::interval(self.config.tick_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let mut tick: Tick = 0;
        let mut attacks = 0u64;
        let mut successful_attacks = 0u64;

        let outcome = loop {
            if let Some(outcome) = decided(&armies) {
                break outcome;
            }
            if tick >= self.config.max_ticks {
                tracing::warn!(tick, "tick limit reached, calling a draw");
                break BattleOutcome::Draw;
            }

            match ticker.as_mut() {
                Some(ticker) => {
                    ticker.tick().await;
                }
                None => tokio::task::yield_now().await,
            }
            tick += 1;

            for army in &mut armies {
                if let Some(report) = army.attack()? {
                    attacks += 1;
                    if report.event.status == AttackStatus::Success {
                        successful_attacks += 1;
                    }
                }
            }
            assign_enemies(&mut armies);

            while let Ok(event_type) = inbox.try_recv() {
                log.record(BattleEvent::new(tick, event_type))?;
            }
        };

        let survivors = armies.iter().map(army_status).collect();
        for army in &mut armies {
            army.despawn();
        }
        log.record(BattleEvent::new(
            tick,
            BattleEventType::BattleEnded {
                outcome: outcome.clone(),
            },
        ))?;
        log.flush()?;
        tracing::info!(?outcome, ticks = tick, attacks, "battle finished");

        Ok(BattleSummary {
            outcome,
            ticks: tick,
            attacks,
            successful_attacks,
            armies: survivors,
        })
    }
}

/// Standard post-processing: recharge after every real attempt, experience
/// after every hit, and one "recharging" line per recharge streak.
fn install_listeners(squad: &mut Squad, events: UnboundedSender<BattleEventType>, gain: f64) {
    let attack_events = events.clone();
    let mut recharging = false;
    squad.add_attack_listener(move |squad, event| {
        if event.status != AttackStatus::Recharging {
            recharging = false;
            squad.recharge();
        }

        let message = match event.status {
            AttackStatus::LowProbability => Some(BattleEventType::Missed {
                squad: squad.name().to_string(),
                target: event.target.clone(),
            }),
            AttackStatus::Success => {
                squad.increase_units_experience(gain);
                Some(BattleEventType::Hit {
                    squad: squad.name().to_string(),
                    target: event.target.clone(),
                    damage: event.damage,
                })
            }
            AttackStatus::Recharging if !recharging => {
                recharging = true;
                Some(BattleEventType::Recharging {
                    squad: squad.name().to_string(),
                })
            }
            AttackStatus::Recharging => None,
        };
        if let Some(message) = message {
            let _ = attack_events.send(message);
        }
    });

    let damage_events = events.clone();
    squad.add_damage_listener(move |squad, event| {
        let _ = damage_events.send(BattleEventType::Damaged {
            squad: squad.name().to_string(),
            source: event.source.clone(),
            damage: event.damage,
            units: UnitStatus::roster(squad),
        });
    });

    squad.add_death_listener(move |squad| {
        let _ = events.send(BattleEventType::SquadDestroyed {
            squad: squad.name().to_string(),
        });
    });
}

/// The outcome once at most one army still has living squads
fn decided(armies: &[Army]) -> Option<BattleOutcome> {
    let mut standing = armies.iter().filter(|army| !army.is_defeated());
    match (standing.next(), standing.next()) {
        (Some(_), Some(_)) => None,
        (Some(army), None) => Some(BattleOutcome::Victory {
            winner: army.name().to_string(),
        }),
        (None, _) => Some(BattleOutcome::Draw),
    }
}

fn army_status(army: &Army) -> ArmyStatus {
    let alive = army.alive_squads();
    ArmyStatus {
        name: army.name().to_string(),
        alive_squads: alive.len(),
        alive_units: alive.iter().map(|squad| lock(squad).alive_count()).sum(),
    }
}
