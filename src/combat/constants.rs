//! Combat system constants - all tunable values in one place

// Health
pub const MIN_HEALTH: f64 = 0.0;
pub const MAX_HEALTH: f64 = 100.0;
pub const DEFAULT_HEALTH: f64 = MAX_HEALTH;

// Experience
pub const MIN_EXPERIENCE: f64 = 0.0;
pub const MAX_EXPERIENCE: f64 = 50.0;

// Recharge durations (milliseconds)
pub const MIN_RECHARGE_MS: u64 = 100;
pub const MAX_RECHARGE_MS: u64 = 2000;
pub const VEHICLE_MIN_RECHARGE_MS: u64 = 1000;
pub const VEHICLE_MAX_RECHARGE_MS: u64 = 2000;

// Soldier calculus
pub const SOLDIER_BASE_DAMAGE: f64 = 0.05;
pub const SOLDIER_MIN_ROLL: f64 = 30.0;
pub const MAX_ROLL: f64 = 100.0;

// Vehicle calculus and crew
pub const VEHICLE_BASE_DAMAGE: f64 = 0.1;
pub const MIN_CREW: usize = 1;
pub const MAX_CREW: usize = 3;

/// Share of incoming damage the vehicle hull takes when it has living crew
pub const VEHICLE_HULL_SHARE: f64 = 0.30;
/// Share of the remaining damage taken by one randomly chosen crew member
pub const VEHICLE_PRIMARY_CREW_SHARE: f64 = 0.50;

/// Experience points per point of damage output
pub const EXPERIENCE_PER_DAMAGE: f64 = 100.0;

// Rosters
pub const MIN_SQUAD_UNITS: usize = 5;
pub const MAX_SQUAD_UNITS: usize = 10;
pub const MIN_ARMY_SQUADS: usize = 2;
pub const MIN_ARMIES: usize = 2;

/// Experience granted to living units after a successful attack
pub const DEFAULT_EXPERIENCE_GAIN: f64 = 0.1;
