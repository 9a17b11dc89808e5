pub mod config;
pub mod error;
pub mod types;

pub use config::SimulatorConfig;
pub use error::{Result, SkirmishError};
