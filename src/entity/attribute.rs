//! Timed attributes: named values that update themselves on a fixed cadence
//!
//! An attribute carries a value, an update policy with a matching delta,
//! and an interval. While running, a tokio task ticks every interval and
//! applies the policy, unless the optional gate says otherwise.
//!
//! Cancellation is synchronous. `stop()` flips `running` and bumps the
//! generation under the attribute mutex before aborting the task, and a
//! tick only lands while holding that mutex with a matching generation.
//! Once `stop()` returns no earlier tick can apply.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::core::error::{validate_name, Result, SkirmishError};
use crate::core::types::lock;

/// Value held by an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Sequence(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Sequence(_) => "sequence",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        Self::Sequence(value)
    }
}

/// How a tick changes the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Never changes
    #[default]
    None,
    /// value += delta
    Sum,
    /// value = delta
    Overwrite,
    /// value = value ++ [delta]
    Append,
}

impl FromStr for UpdatePolicy {
    type Err = SkirmishError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sum" => Ok(Self::Sum),
            "overwrite" | "set" => Ok(Self::Overwrite),
            "append" | "push" => Ok(Self::Append),
            other => Err(SkirmishError::InvalidUpdatePolicy {
                name: other.to_string(),
                reason: "unknown policy".into(),
            }),
        }
    }
}

/// Convert a millisecond count from configuration into an interval.
pub fn interval_from_millis(name: &str, millis: f64) -> Result<Duration> {
    if !millis.is_finite() || millis <= 0.0 {
        return Err(SkirmishError::InvalidUpdateInterval {
            name: name.to_string(),
            reason: format!("expected a positive number of milliseconds, got {millis}"),
        });
    }
    Ok(Duration::from_secs_f64(millis / 1000.0))
}

/// Construction parameters for a [`TimedAttribute`]
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub value: AttributeValue,
    pub policy: UpdatePolicy,
    pub delta: Option<AttributeValue>,
    pub interval: Option<Duration>,
}

impl AttributeSpec {
    /// An attribute that never updates on its own.
    pub fn fixed(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            policy: UpdatePolicy::None,
            delta: None,
            interval: None,
        }
    }

    pub fn updating(
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
        policy: UpdatePolicy,
        delta: impl Into<AttributeValue>,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            policy,
            delta: Some(delta.into()),
            interval: Some(interval),
        }
    }
}

/// Predicate deciding whether a tick applies, given the current value
pub type UpdateGate = Arc<dyn Fn(&AttributeValue) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    value: AttributeValue,
    policy: UpdatePolicy,
    delta: Option<AttributeValue>,
    interval: Option<Duration>,
}

impl Settings {
    fn apply_policy(&mut self) -> bool {
        let Some(delta) = self.delta.as_ref() else {
            return false;
        };

        match (self.policy, &mut self.value, delta) {
            (UpdatePolicy::None, _, _) => false,
            (UpdatePolicy::Sum, AttributeValue::Number(value), AttributeValue::Number(delta)) => {
                *value += delta;
                true
            }
            (UpdatePolicy::Overwrite, value, delta) => {
                *value = delta.clone();
                true
            }
            (UpdatePolicy::Append, AttributeValue::Sequence(items), delta) => {
                items.push(delta.clone());
                true
            }
            // Ruled out by validation
            _ => false,
        }
    }
}

#[derive(Debug)]
struct AttributeState {
    current: Settings,
    running: bool,
    generation: u64,
    ticks: u64,
}

impl AttributeState {
    fn apply_tick(&mut self, gate: Option<&UpdateGate>) -> bool {
        if !self.running {
            return false;
        }
        if let Some(gate) = gate {
            if !gate(&self.current.value) {
                return false;
            }
        }
        let applied = self.current.apply_policy();
        if applied {
            self.ticks += 1;
        }
        applied
    }
}

fn check_compatible(
    name: &str,
    policy: UpdatePolicy,
    value: &AttributeValue,
    delta: Option<&AttributeValue>,
    interval: Option<Duration>,
) -> Result<()> {
    if policy == UpdatePolicy::None {
        return Ok(());
    }

    match interval {
        None => {
            return Err(SkirmishError::InvalidUpdateInterval {
                name: name.to_string(),
                reason: "updating attributes need an interval".into(),
            })
        }
        Some(interval) if interval.is_zero() => {
            return Err(SkirmishError::InvalidUpdateInterval {
                name: name.to_string(),
                reason: "interval must be greater than zero".into(),
            })
        }
        Some(_) => {}
    }

    let Some(delta) = delta else {
        return Err(SkirmishError::InvalidUpdatePolicy {
            name: name.to_string(),
            reason: format!("{policy:?} needs an update delta"),
        });
    };

    let mismatch = |expected: &'static str, actual: &AttributeValue| -> Result<()> {
        Err(SkirmishError::AttributeTypeMismatch {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        })
    };

    match (policy, value) {
        (UpdatePolicy::Sum, AttributeValue::Number(_)) => match delta {
            AttributeValue::Number(_) => Ok(()),
            other => mismatch("number", other),
        },
        (UpdatePolicy::Sum, other) => Err(SkirmishError::InvalidUpdatePolicy {
            name: name.to_string(),
            reason: format!("sum needs a number value, got {}", other.kind()),
        }),
        (UpdatePolicy::Overwrite, value) if value.kind() != delta.kind() => {
            mismatch(value.kind(), delta)
        }
        (UpdatePolicy::Append, AttributeValue::Sequence(items)) => match items.first() {
            Some(first) if first.kind() != delta.kind() => mismatch(first.kind(), delta),
            _ => Ok(()),
        },
        (UpdatePolicy::Append, other) => Err(SkirmishError::InvalidUpdatePolicy {
            name: name.to_string(),
            reason: format!("append needs a sequence value, got {}", other.kind()),
        }),
        _ => Ok(()),
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn run_ticks(
    state: Arc<Mutex<AttributeState>>,
    gate: Option<UpdateGate>,
    rearm: Arc<Notify>,
    generation: u64,
    period: Duration,
) {
    let mut interval = ticker(period);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let live = {
                    let mut guard = lock(&state);
                    let live = guard.generation == generation && guard.running;
                    if live {
                        guard.apply_tick(gate.as_ref());
                    }
                    live
                };
                if !live {
                    break;
                }
            }
            _ = rearm.notified() => {
                let period = {
                    let guard = lock(&state);
                    guard.current.interval.filter(|_| guard.generation == generation)
                };
                match period {
                    Some(period) => interval = ticker(period),
                    None => break,
                }
            }
        }
    }
}

/// A named value with a self-driven update loop
pub struct TimedAttribute {
    name: String,
    initial: Settings,
    state: Arc<Mutex<AttributeState>>,
    gate: Option<UpdateGate>,
    rearm: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for TimedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("TimedAttribute")
            .field("name", &self.name)
            .field("value", &state.current.value)
            .field("policy", &state.current.policy)
            .field("interval", &state.current.interval)
            .field("running", &state.running)
            .finish()
    }
}

impl TimedAttribute {
    pub fn new(spec: AttributeSpec) -> Result<Self> {
        validate_name(&spec.name)?;
        check_compatible(
            &spec.name,
            spec.policy,
            &spec.value,
            spec.delta.as_ref(),
            spec.interval,
        )?;

        let settings = Settings {
            value: spec.value,
            policy: spec.policy,
            delta: spec.delta,
            interval: spec.interval,
        };

        Ok(Self {
            name: spec.name,
            initial: settings.clone(),
            state: Arc::new(Mutex::new(AttributeState {
                current: settings,
                running: false,
                generation: 0,
                ticks: 0,
            })),
            gate: None,
            rearm: Arc::new(Notify::new()),
            task: None,
        })
    }

    /// Only apply ticks while `gate(value)` holds. Set this before `start()`.
    pub fn with_gate(
        mut self,
        gate: impl Fn(&AttributeValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> AttributeValue {
        lock(&self.state).current.value.clone()
    }

    pub fn policy(&self) -> UpdatePolicy {
        lock(&self.state).current.policy
    }

    pub fn delta(&self) -> Option<AttributeValue> {
        lock(&self.state).current.delta.clone()
    }

    pub fn interval(&self) -> Option<Duration> {
        lock(&self.state).current.interval
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn is_updatable(&self) -> bool {
        self.policy() != UpdatePolicy::None
    }

    /// Number of ticks that actually changed the value since construction
    pub fn ticks_applied(&self) -> u64 {
        lock(&self.state).ticks
    }

    /// Replace the value; the new value must be of the same kind.
    pub fn set_value(&mut self, value: impl Into<AttributeValue>) -> Result<()> {
        let value = value.into();
        let mut state = lock(&self.state);
        if state.current.value.kind() != value.kind() {
            return Err(SkirmishError::AttributeTypeMismatch {
                name: self.name.clone(),
                expected: state.current.value.kind(),
                actual: value.kind(),
            });
        }
        state.current.value = value;
        Ok(())
    }

    pub(crate) fn store_number(&self, number: f64) -> bool {
        let mut state = lock(&self.state);
        match &mut state.current.value {
            AttributeValue::Number(value) => {
                *value = number;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn store_flag(&self, flag: bool) -> bool {
        let mut state = lock(&self.state);
        match &mut state.current.value {
            AttributeValue::Boolean(value) => {
                *value = flag;
                true
            }
            _ => false,
        }
    }

    pub fn set_delta(&mut self, delta: impl Into<AttributeValue>) -> Result<()> {
        let delta = delta.into();
        let mut state = lock(&self.state);
        let current = &state.current;
        check_compatible(
            &self.name,
            current.policy,
            &current.value,
            Some(&delta),
            current.interval,
        )?;
        state.current.delta = Some(delta);
        Ok(())
    }

    pub fn set_policy(&mut self, policy: UpdatePolicy) -> Result<()> {
        let running = {
            let mut state = lock(&self.state);
            let current = &state.current;
            check_compatible(
                &self.name,
                policy,
                &current.value,
                current.delta.as_ref(),
                current.interval,
            )?;
            state.current.policy = policy;
            state.running
        };
        if running {
            self.spawn_ticker();
        }
        Ok(())
    }

    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        {
            let mut state = lock(&self.state);
            let current = &state.current;
            check_compatible(
                &self.name,
                current.policy,
                &current.value,
                current.delta.as_ref(),
                Some(interval),
            )?;
            state.current.interval = Some(interval);
        }
        self.rearm();
        Ok(())
    }

    /// Restore value, policy, delta and interval to their construction-time
    /// state. The running flag is left alone.
    pub fn reset(&mut self) {
        let running = {
            let mut state = lock(&self.state);
            state.current = self.initial.clone();
            state.running
        };
        if running {
            self.rearm();
            self.spawn_ticker();
        }
    }

    /// Begin ticking. Calling this while already running does nothing.
    pub fn start(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.running {
                return;
            }
            state.running = true;
            state.generation += 1;
        }
        self.spawn_ticker();
    }

    /// Stop ticking. No tick applies after this returns.
    pub fn stop(&mut self) {
        {
            let mut state = lock(&self.state);
            if !state.running {
                return;
            }
            state.running = false;
            state.generation += 1;
        }
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::trace!(attribute = %self.name, "attribute timer stopped");
        }
    }

    /// Apply one tick by hand. Returns true if the value changed.
    pub fn tick(&self) -> bool {
        lock(&self.state).apply_tick(self.gate.as_ref())
    }

    /// Restart the cadence so the next tick lands one full interval from now.
    pub fn rearm(&self) {
        if self.task.is_some() {
            self.rearm.notify_one();
        }
    }

    fn spawn_ticker(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let (generation, interval, updatable) = {
            let state = lock(&self.state);
            (
                state.generation,
                state.current.interval,
                state.current.policy != UpdatePolicy::None,
            )
        };
        let Some(period) = interval.filter(|_| updatable) else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                self.task = Some(handle.spawn(run_ticks(
                    Arc::clone(&self.state),
                    self.gate.clone(),
                    Arc::clone(&self.rearm),
                    generation,
                    period,
                )));
                tracing::trace!(attribute = %self.name, ?period, "attribute timer started");
            }
            Err(_) => {
                tracing::debug!(
                    attribute = %self.name,
                    "no async runtime, attribute ticks must be driven manually"
                );
            }
        }
    }
}

impl Drop for TimedAttribute {
    fn drop(&mut self) {
        self.stop();
    }
}
