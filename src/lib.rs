//! # FSRU Resupply Simulator Core Library
//!
//! This library simulates a floating storage and regasification unit (FSRU) that
//! discharges regasified LNG at a metered rate while a single LNG carrier (LNGC)
//! periodically refills it. The carrier can only reach the FSRU through three
//! sequential transit legs, each gated by its own tidal/channel access calendar.
//!
//! ## Design Philosophy
//!
//! ### Discrete Time
//! - **Unit ticks**: Simulation time is an integer [`TimeStep`] starting at 0 and
//!   advancing by one per step. Ticks carry no wall-clock meaning inside the core.
//! - **Calendar indices are ticks**: Row `i` of every access calendar describes tick `i`.
//!
//! ### Pure Scheduling
//! - **Stateless matching**: [`matcher::best_slot`] takes the calendar and every
//!   tolerance as explicit arguments and returns a tagged [`matcher::SlotMatch`].
//! - **Bounded retries**: [`scheduler::ArrivalScheduler`] iterates instead of
//!   recursing, with a retry bound tied to the calendar horizon.
//!
//! ### Data Flow
//! 1. **Calendars**: Load leg calendars from CSV, or synthesise them from a tide model
//! 2. **Schedule**: Back-calculate the optimal refill time and match it against the legs
//! 3. **Simulate**: Tick the send-out, trigger the carrier, transfer cargo, re-arm
//! 4. **Report**: Stream level samples to a [`TraceSink`], then summarise operability
//!
//! ## Core Types
//!
//! - [`LevelSample`]: A single `(tick, level)` observation
//! - [`LevelTrace`]: Append-only samples for one monitored [`Resource`]
//! - [`TraceSink`]: Where the simulation hands its samples
//! - [`TraceRecorder`]: In-memory sink holding one trace per resource

use serde::{Deserialize, Serialize};

// Module declarations
pub mod calendar;
pub mod config;
pub mod connection;
pub mod fallback;
pub mod matcher;
pub mod renderer;
pub mod report;
pub mod scheduler;
pub mod simulation;
pub mod tank;
pub mod vessel;

#[cfg(test)]
mod tests;

/// An integer simulation instant.
///
/// Signed so that shifted targets (`target - offset`) and offsets between slots
/// can go negative without wrapping.
pub type TimeStep = i64;

/// The resources whose levels are monitored during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// The FSRU storage tank
    Fsru,
    /// The supply carrier's cargo tanks
    Lngc,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Fsru => write!(f, "FSRU"),
            Resource::Lngc => write!(f, "LNGC"),
        }
    }
}

/// A single level observation at a specific tick.
///
/// # Example
/// ```
/// use fsru_sim_lib::LevelSample;
///
/// let sample = LevelSample { tick: 12, level: 174_000.0 };
/// assert_eq!(sample.tick, 12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    /// Simulation tick of the observation
    pub tick: TimeStep,
    /// Level in m³ of LNG
    pub level: f64,
}

/// Append-only level history for one monitored resource.
///
/// Samples are kept in the order they were recorded. The core never reads a
/// trace back; it exists for reporting and plotting.
///
/// # Example
/// ```
/// use fsru_sim_lib::{LevelTrace, Resource};
///
/// let mut trace = LevelTrace::new(Resource::Fsru);
/// trace.push(0, 174_000.0);
/// trace.push(1, 172_903.0);
///
/// assert_eq!(trace.samples.len(), 2);
/// assert_eq!(trace.last().map(|s| s.level), Some(172_903.0));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelTrace {
    /// Which resource the samples describe
    pub resource: Resource,
    /// Samples in recording order
    pub samples: Vec<LevelSample>,
}

impl LevelTrace {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            samples: Vec::new(),
        }
    }

    pub fn with_capacity(resource: Resource, capacity: usize) -> Self {
        Self {
            resource,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, tick: TimeStep, level: f64) {
        self.samples.push(LevelSample { tick, level });
    }

    pub fn last(&self) -> Option<&LevelSample> {
        self.samples.last()
    }
}

/// Destination for level samples produced by a simulation run.
///
/// Decouples the engine from whatever stores or plots the history.
pub trait TraceSink {
    fn record(&mut self, resource: Resource, tick: TimeStep, level: f64);
}

/// In-memory [`TraceSink`] with one [`LevelTrace`] per resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRecorder {
    pub fsru: LevelTrace,
    pub lngc: LevelTrace,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self {
            fsru: LevelTrace::new(Resource::Fsru),
            lngc: LevelTrace::new(Resource::Lngc),
        }
    }

    /// Pre-allocate room for `ticks` samples per resource.
    pub fn with_capacity(ticks: usize) -> Self {
        Self {
            fsru: LevelTrace::with_capacity(Resource::Fsru, ticks),
            lngc: LevelTrace::with_capacity(Resource::Lngc, ticks),
        }
    }

    pub fn trace(&self, resource: Resource) -> &LevelTrace {
        match resource {
            Resource::Fsru => &self.fsru,
            Resource::Lngc => &self.lngc,
        }
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for TraceRecorder {
    fn record(&mut self, resource: Resource, tick: TimeStep, level: f64) {
        match resource {
            Resource::Fsru => self.fsru.push(tick, level),
            Resource::Lngc => self.lngc.push(tick, level),
        }
    }
}
