//! Skirmish - Automated squad and army combat resolution

pub mod battle;
pub mod combat;
pub mod core;
pub mod entity;
pub mod scenario;
pub mod simulation;
