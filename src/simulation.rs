//! # Discrete-Event Simulation Engine
//!
//! Drives the FSRU send-out and the carrier's calls on a single logical clock.
//!
//! ## Tick Order
//!
//! At every tick `t` in `0..horizon`:
//! 1. **Trigger**: if `t` is the scheduled call tick and the `called` latch is clear,
//!    start a carrier [`Activation`] and set the latch; a second trigger while the
//!    latch is set is dropped, never queued
//! 2. **Resume**: the in-flight activation waits out its transit or pumps one
//!    capped increment; on completion the call is re-armed from the post-transfer
//!    level and the carrier reloads
//! 3. **Send-out**: one tick of metered regasification
//! 4. **Record**: FSRU and LNGC levels are handed to the [`TraceSink`]
//!
//! Everything runs on one thread; the activation is a resumable state machine, so no
//! two mutations of the tank can interleave within a tick.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarSet, Leg};
use crate::config::{Config, ConfigError};
use crate::connection::{ActivationId, Connection, ConnectionError};
use crate::scheduler::{ArrivalScheduler, RouteParams, ScheduledCall};
use crate::tank::Tank;
use crate::vessel::{Activation, ActivationPoll, Discharge, SupplyVessel};
use crate::{Resource, TimeStep, TraceSink};

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("access calendar for {0} has no rows")]
    EmptyCalendar(Leg),
}

/// FSRU-side record of the next carrier call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallState {
    /// `None` while no feasible arrival is known
    pub scheduled: Option<ScheduledCall>,
    /// Latch: set when the carrier is activated, cleared after its discharge
    pub called: bool,
}

/// One completed visit of the carrier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoyageRecord {
    #[serde(flatten)]
    pub discharge: Discharge,
    /// FSRU level right after the discharge
    pub fsru_level_after: f64,
    /// Leg-3 departure slot, if the channel reopens within the calendar
    pub departure: Option<TimeStep>,
    /// Back-calculated optimal refill tick used to re-arm
    pub optimal_refill_time: TimeStep,
    /// Call scheduled by the re-arm
    pub next_call: Option<ScheduledCall>,
}

/// Summary of a finished run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub ticks: usize,
    pub voyages: Vec<VoyageRecord>,
    /// Triggers ignored because an activation was already in flight
    pub dropped_activations: usize,
    /// Call still outstanding when the horizon was reached
    pub pending_call: Option<ScheduledCall>,
    pub final_fsru_level: f64,
}

pub struct Simulation {
    tank: Tank,
    vessel: SupplyVessel,
    scheduler: ArrivalScheduler,
    sendout_rate: f64,
    call: CallState,
    connection: Connection,
    activation: Option<Activation>,
    next_id: ActivationId,
    horizon: usize,
    now: TimeStep,
    voyages: Vec<VoyageRecord>,
    dropped_activations: usize,
}

impl Simulation {
    /// Build the run and schedule the initial call from the starting level.
    pub fn new(config: &Config, calendars: CalendarSet) -> Result<Self, SimError> {
        config.validate()?;
        for leg in Leg::ALL {
            if calendars.get(leg).is_empty() {
                return Err(SimError::EmptyCalendar(leg));
            }
        }

        let tank = Tank::new(
            config.fsru.capacity,
            config.fsru.initial_level,
            config.fsru.min_operable,
            config.optimal_level(),
        );
        let vessel = SupplyVessel::new(config.lngc.capacity, config.lngc.transfer_rate);
        let horizon = config
            .simulation
            .horizon
            .unwrap_or_else(|| calendars.horizon());
        let scheduler = ArrivalScheduler::new(calendars, RouteParams::from(&config.route));

        let optimal = tank.optimal_refill_time(0, config.fsru.sendout_rate);
        let scheduled = scheduler.schedule_from(optimal, 0).call();
        match scheduled {
            Some(call) => info!(
                horizon,
                optimal,
                call_at = call.call_at,
                transit = call.transit,
                "initial carrier call scheduled"
            ),
            None => warn!(horizon, optimal, "no feasible initial carrier call"),
        }

        Ok(Self {
            tank,
            vessel,
            scheduler,
            sendout_rate: config.fsru.sendout_rate,
            call: CallState {
                scheduled,
                called: false,
            },
            connection: Connection::Idle,
            activation: None,
            next_id: 1,
            horizon,
            now: 0,
            voyages: Vec::new(),
            dropped_activations: 0,
        })
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn vessel(&self) -> &SupplyVessel {
        &self.vessel
    }

    pub fn call_state(&self) -> CallState {
        self.call
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn now(&self) -> TimeStep {
        self.now
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn in_flight(&self) -> bool {
        self.activation.is_some()
    }

    pub fn voyages(&self) -> &[VoyageRecord] {
        &self.voyages
    }

    /// Wall-clock time of `tick`, when the calendars carry timestamps.
    pub fn timestamp(&self, tick: TimeStep) -> Option<NaiveDateTime> {
        self.scheduler.calendars().timestamp(tick)
    }

    pub fn is_finished(&self) -> bool {
        self.now >= self.horizon as TimeStep
    }

    /// Advance the clock by one tick.
    pub fn step<S: TraceSink>(&mut self, sink: &mut S) -> Result<(), SimError> {
        let now = self.now;

        self.trigger(now);

        let poll = match self.activation.as_mut() {
            Some(activation) => {
                activation.resume(now, &mut self.vessel, &mut self.tank, &mut self.connection)?
            }
            None => ActivationPoll::Pending,
        };
        if let ActivationPoll::Complete(discharge) = poll {
            self.activation = None;
            self.complete(now, discharge);
        }

        self.tank.sendout(self.sendout_rate);

        sink.record(Resource::Fsru, now, self.tank.level());
        sink.record(Resource::Lngc, now, self.vessel.level());

        self.now += 1;
        Ok(())
    }

    /// Run every remaining tick up to the horizon.
    pub fn run<S: TraceSink>(&mut self, sink: &mut S) -> Result<SimulationOutcome, SimError> {
        while !self.is_finished() {
            self.step(sink)?;
        }

        info!(
            ticks = self.horizon,
            voyages = self.voyages.len(),
            final_level = self.tank.level(),
            "simulation finished"
        );

        Ok(SimulationOutcome {
            ticks: self.horizon,
            voyages: self.voyages.clone(),
            dropped_activations: self.dropped_activations,
            pending_call: self.call.scheduled,
            final_fsru_level: self.tank.level(),
        })
    }

    fn trigger(&mut self, now: TimeStep) {
        let Some(call) = self.call.scheduled else {
            return;
        };
        if call.call_at != now {
            return;
        }

        if self.call.called || self.activation.is_some() {
            self.dropped_activations += 1;
            debug!(now, "carrier already called, trigger dropped");
            return;
        }

        self.call.called = true;
        let id = self.next_id;
        self.next_id += 1;
        self.activation = Some(Activation::new(id, now, call.transit));
        info!(now, id, transit = call.transit, "carrier entering channel");
    }

    /// Re-arm after a discharge, then reload the carrier.
    fn complete(&mut self, now: TimeStep, discharge: Discharge) {
        let departure = self.scheduler.departure(now).slot();

        let optimal = self.tank.optimal_refill_time(now, self.sendout_rate);
        let next_call = self.scheduler.schedule_from(optimal, now + 1).call();
        self.call = CallState {
            scheduled: next_call,
            called: false,
        };

        info!(
            now,
            id = discharge.id,
            delivered = discharge.delivered,
            fsru_level = self.tank.level(),
            next_call_at = next_call.map(|c| c.call_at),
            "discharge complete"
        );

        self.voyages.push(VoyageRecord {
            discharge,
            fsru_level_after: self.tank.level(),
            departure,
            optimal_refill_time: optimal,
            next_call,
        });

        self.vessel.refill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::AccessCalendar;
    use crate::TraceRecorder;

    fn all_open(len: usize) -> AccessCalendar {
        AccessCalendar::from_flags(vec![true; len])
    }

    fn open_calendars(len: usize) -> CalendarSet {
        CalendarSet::new(all_open(len), all_open(len), all_open(len))
    }

    #[test]
    fn test_horizon_defaults_to_leg1_length() {
        let sim = Simulation::new(&Config::default(), open_calendars(321)).unwrap();
        assert_eq!(sim.horizon(), 321);

        let mut config = Config::default();
        config.simulation.horizon = Some(50);
        let sim = Simulation::new(&config, open_calendars(321)).unwrap();
        assert_eq!(sim.horizon(), 50);
    }

    #[test]
    fn test_initial_call_from_starting_level() {
        let sim = Simulation::new(&Config::default(), open_calendars(500)).unwrap();
        // optimal time 138: leg 2 at 133, leg 1 at 131, alongside at 138
        let call = sim.call_state().scheduled.unwrap();
        assert_eq!(call.call_at, 131);
        assert_eq!(call.berth_slot, 133);
        assert_eq!(call.alongside_at(), 138);
        assert!(!sim.call_state().called);
    }

    #[test]
    fn test_one_sample_per_tick_per_resource() {
        let mut config = Config::default();
        config.simulation.horizon = Some(40);
        let mut sim = Simulation::new(&config, open_calendars(500)).unwrap();
        let mut recorder = TraceRecorder::new();
        sim.run(&mut recorder).unwrap();

        assert_eq!(recorder.fsru.samples.len(), 40);
        assert_eq!(recorder.lngc.samples.len(), 40);
        for (i, sample) in recorder.fsru.samples.iter().enumerate() {
            assert_eq!(sample.tick, i as TimeStep);
        }
    }

    #[test]
    fn test_rejects_empty_calendar() {
        let calendars = CalendarSet::new(all_open(10), AccessCalendar::from_flags(vec![]), all_open(10));
        assert!(matches!(
            Simulation::new(&Config::default(), calendars),
            Err(SimError::EmptyCalendar(Leg::Two))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = Config::default();
        config.fsru.sendout_rate = 0.0;
        assert!(matches!(
            Simulation::new(&config, open_calendars(10)),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_activation_latch_and_connection() {
        let mut sim = Simulation::new(&Config::default(), open_calendars(500)).unwrap();
        let mut recorder = TraceRecorder::new();

        while sim.now() < 131 {
            sim.step(&mut recorder).unwrap();
        }
        assert!(!sim.in_flight());

        sim.step(&mut recorder).unwrap();
        assert!(sim.in_flight());
        assert!(sim.call_state().called);
        // Still transiting: the loading arm is free
        assert!(sim.connection().is_idle());

        while sim.now() < 139 {
            sim.step(&mut recorder).unwrap();
        }
        assert!(sim.in_flight());
        assert_eq!(sim.connection().owner(), Some(1));
    }

    #[test]
    fn test_trigger_while_called_is_dropped() {
        let mut sim = Simulation::new(&Config::default(), open_calendars(500)).unwrap();
        let mut recorder = TraceRecorder::new();

        // Into the first transit: called at 131, alongside at 138
        while sim.now() < 135 {
            sim.step(&mut recorder).unwrap();
        }
        let in_flight_id = sim.activation.as_ref().map(Activation::id);
        assert_eq!(in_flight_id, Some(1));
        let owner = sim.connection().owner();

        let mut call = sim.call.scheduled.unwrap();
        call.call_at = sim.now();
        sim.call.scheduled = Some(call);
        sim.step(&mut recorder).unwrap();

        assert_eq!(sim.dropped_activations, 1);
        assert_eq!(sim.activation.as_ref().map(Activation::id), in_flight_id);
        assert!(sim.call_state().called);
        assert_eq!(sim.connection().owner(), owner);
        assert_eq!(sim.next_id, 2);
    }
}
