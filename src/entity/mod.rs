//! Entity lifecycle: timed attributes, active objects and listener sets

pub mod active;
pub mod attribute;
pub mod listeners;

pub use active::{ActiveObject, LifecycleListener};
pub use attribute::{
    interval_from_millis, AttributeSpec, AttributeValue, TimedAttribute, UpdateGate, UpdatePolicy,
};
pub use listeners::{ListenerId, Listeners};
