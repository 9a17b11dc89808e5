//! Scenario loading and full battle runs
//!
//! Battles run under paused tokio time: unit recharge timers and the round
//! cadence are real tokio timers, so virtual time keeps these fast.

use std::path::PathBuf;

use skirmish::combat::{Combatant, Soldier};
use skirmish::core::config::SimulatorConfig;
use skirmish::core::error::SkirmishError;
use skirmish::scenario::{Scenario, ScenarioParser};
use skirmish::simulation::{BattleEventType, BattleLog, BattleOutcome, Simulator};

fn scenario_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data/scenarios")
        .join(file)
}

const SMALL: &str = r#"
[units.grunt]
type = "soldier"
health = 20
recharge = 200

[[armies]]
name = "Red"

[[armies.squads]]
name = "Red One"
units = ["grunt", "grunt", "grunt", "grunt", "grunt"]

[[armies.squads]]
name = "Red Two"
attack_strategy = "weak"
units = ["grunt", "grunt", "grunt", "grunt", "grunt"]

[[armies]]
name = "Blue"

[[armies.squads]]
name = "Blue One"
attack_strategy = "strong"
units = ["grunt", "grunt", "grunt", "grunt", "grunt"]

[[armies.squads]]
name = "Blue Two"
units = ["grunt", "grunt", "grunt", "grunt", "grunt"]
"#;

fn fast_config() -> SimulatorConfig {
    SimulatorConfig {
        tick_interval_ms: 20,
        max_ticks: 500_000,
        ..SimulatorConfig::default()
    }
}

#[test]
fn test_load_bundled_toml_scenario() {
    let scenario = Scenario::load(&scenario_path("border_skirmish.toml")).unwrap();
    assert_eq!(scenario.armies.len(), 2);
    assert_eq!(scenario.simulator_config().tick_interval_ms, 50);

    let armies = ScenarioParser::new().parse(&scenario).unwrap();
    let names: Vec<&str> = armies.iter().map(|army| army.name()).collect();
    assert_eq!(names, vec!["Northern Watch", "Southern Reach"]);
    assert_eq!(
        armies[0].rotation(),
        vec!["Ironclad".to_string(), "Hawkeye".to_string()]
    );

    let ironclad = skirmish::core::types::lock(&armies[0].squads()[0]);
    let apc = &ironclad.units()[0];
    assert_eq!(apc.kind(), "vehicle");
    assert_eq!(apc.crew().len(), 2);
    assert_eq!(apc.crew()[0].experience(), 5.0);
}

#[test]
fn test_load_bundled_json_scenario() {
    let scenario = Scenario::load(&scenario_path("skirmish.json")).unwrap();
    let config = scenario.simulator_config();
    assert_eq!(config.tick_interval_ms, 20);
    assert_eq!(config.experience_gain, SimulatorConfig::default().experience_gain);

    let armies = ScenarioParser::new().parse(&scenario).unwrap();
    assert_eq!(armies.len(), 2);
    for army in &armies {
        assert_eq!(army.squads().len(), 2);
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Scenario::load(&scenario_path("no_such_battle.toml"));
    assert!(matches!(result, Err(SkirmishError::Io(_))));
}

#[test]
fn test_scenario_errors() {
    let unknown_unit = SMALL.replacen(
        r#"units = ["grunt", "grunt", "grunt", "grunt", "grunt"]"#,
        r#"units = ["grunt", "ghost", "grunt", "grunt", "grunt"]"#,
        1,
    );
    let scenario = Scenario::from_toml_str(&unknown_unit).unwrap();
    assert!(matches!(
        ScenarioParser::new().parse(&scenario),
        Err(SkirmishError::UnknownUnit(name)) if name == "ghost"
    ));

    let bad_strategy = SMALL.replacen(r#""weak""#, r#""sneaky""#, 1);
    let scenario = Scenario::from_toml_str(&bad_strategy).unwrap();
    assert!(matches!(
        ScenarioParser::new().parse(&scenario),
        Err(SkirmishError::InvalidAttackStrategy(_))
    ));

    let mut lonely = Scenario::from_toml_str(SMALL).unwrap();
    lonely.armies.truncate(1);
    assert!(matches!(
        ScenarioParser::new().parse(&lonely),
        Err(SkirmishError::Scenario(_))
    ));

    let mut thin = Scenario::from_toml_str(SMALL).unwrap();
    thin.armies[1].squads.truncate(1);
    assert!(matches!(
        ScenarioParser::new().parse(&thin),
        Err(SkirmishError::RosterSize { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_small_battle_produces_a_winner() {
    let scenario = Scenario::from_toml_str(SMALL).unwrap();
    let mut log = BattleLog::new(Vec::new());
    let summary = Simulator::new(fast_config())
        .play_scenario(&scenario, &mut log)
        .await
        .unwrap();

    let winner = summary.outcome.winner().unwrap().to_string();
    assert!(winner == "Red" || winner == "Blue");
    assert!(summary.successful_attacks > 0);
    assert!(summary.attacks >= summary.successful_attacks);

    let loser = summary.armies.iter().find(|army| army.name != winner).unwrap();
    assert_eq!(loser.alive_squads, 0);
    assert_eq!(loser.alive_units, 0);

    let text = String::from_utf8(log.into_inner()).unwrap();
    assert!(text.contains("landed successful attack on"));
    assert!(text.contains("lost all of its units"));
    assert!(text.trim_end().ends_with(&format!("{winner} won!")));
}

#[tokio::test(start_paused = true)]
async fn test_bundled_scenario_runs_to_completion() {
    let scenario = Scenario::load(&scenario_path("border_skirmish.toml")).unwrap();
    let config = SimulatorConfig {
        max_ticks: 500_000,
        ..scenario.simulator_config()
    };
    let mut log = BattleLog::in_memory();
    let summary = Simulator::new(config)
        .play_scenario(&scenario, &mut log)
        .await
        .unwrap();

    assert!(matches!(summary.outcome, BattleOutcome::Victory { .. }));
    let destroyed = log
        .events()
        .iter()
        .filter(|event| matches!(event.event_type, BattleEventType::SquadDestroyed { .. }))
        .count();
    assert!(destroyed >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_custom_spawner_decides_the_battle() {
    let scenario = Scenario::from_toml_str(&SMALL.replace(
        "[units.grunt]",
        "[units.elite]\ntype = \"elite\"\n\n[units.grunt]",
    ))
    .unwrap();
    let mut scenario = scenario;
    for squad in &mut scenario.armies[0].squads {
        squad.units = vec!["elite".to_string(); 5];
    }

    let mut simulator = Simulator::new(fast_config());
    simulator
        .parser_mut()
        .add_unit_spawner("elite", |name, _template, _templates| {
            let soldier = Soldier::with_stats(name, 100.0, 50.0, None)?;
            Ok(Box::new(soldier) as Box<dyn Combatant>)
        });

    let mut log = BattleLog::in_memory();
    let summary = simulator.play_scenario(&scenario, &mut log).await.unwrap();
    assert_eq!(summary.outcome.winner(), Some("Red"));
}
