//! # Supply Carrier (LNGC)
//!
//! The carrier owns its own bounded cargo. A call to the FSRU is modelled as a
//! resumable [`Activation`]: the simulation clock resumes it once per tick, it waits
//! out its transit, reserves the loading-arm [`Connection`] and then pumps one capped
//! increment per tick until either its cargo or the FSRU's free space runs out.
//!
//! Reloading at the export terminal is out of scope; after a completed discharge the
//! carrier is refilled to capacity instantly.

use serde::{Deserialize, Serialize};

use crate::connection::{ActivationId, Connection, ConnectionError};
use crate::tank::Tank;
use crate::TimeStep;

#[derive(Clone, Debug, PartialEq)]
pub struct SupplyVessel {
    level: f64,
    capacity: f64,
    transfer_rate: f64,
}

impl SupplyVessel {
    /// A fully laden carrier.
    pub fn new(capacity: f64, transfer_rate: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            level: capacity,
            capacity,
            transfer_rate: transfer_rate.max(0.0),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn transfer_rate(&self) -> f64 {
        self.transfer_rate
    }

    pub fn is_empty(&self) -> bool {
        self.level <= 0.0
    }

    /// Remove up to `amount` of cargo; returns what was taken.
    pub fn take(&mut self, amount: f64) -> f64 {
        let taken = amount.min(self.level).max(0.0);
        self.level -= taken;
        taken
    }

    pub fn refill(&mut self) {
        self.level = self.capacity;
    }
}

/// Outcome of one tick of pumping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransferStep {
    /// Cargo moved from carrier to FSRU this tick
    pub moved: f64,
    /// Carrier empty or FSRU full
    pub done: bool,
}

/// Pump one increment: `min(transfer_rate, carrier cargo, FSRU headroom)`.
pub fn transfer_step(vessel: &mut SupplyVessel, tank: &mut Tank) -> TransferStep {
    let amount = vessel
        .transfer_rate()
        .min(vessel.level())
        .min(tank.headroom());
    let moved = tank.put(vessel.take(amount));
    TransferStep {
        moved,
        done: vessel.is_empty() || tank.is_full(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Transiting the legs; alongside at `until`
    InTransit { until: TimeStep },
    /// Connected and pumping
    Transferring,
}

/// Summary of a completed discharge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Discharge {
    pub id: ActivationId,
    /// Tick the carrier was called (channel entry)
    pub called_at: TimeStep,
    pub transit: TimeStep,
    /// First pumping tick
    pub berthed_at: TimeStep,
    /// Last pumping tick
    pub completed_at: TimeStep,
    pub delivered: f64,
    /// Cargo left aboard before reloading
    pub vessel_level_after: f64,
}

/// What a resumed activation did this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationPoll {
    Pending,
    Complete(Discharge),
}

/// One in-flight call of the carrier to the FSRU.
#[derive(Clone, Debug, PartialEq)]
pub struct Activation {
    id: ActivationId,
    called_at: TimeStep,
    transit: TimeStep,
    phase: Phase,
    berthed_at: Option<TimeStep>,
    delivered: f64,
}

impl Activation {
    pub fn new(id: ActivationId, now: TimeStep, transit: TimeStep) -> Self {
        Self {
            id,
            called_at: now,
            transit,
            phase: Phase::InTransit {
                until: now + transit.max(0),
            },
            berthed_at: None,
            delivered: 0.0,
        }
    }

    pub fn id(&self) -> ActivationId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance the activation by one tick.
    ///
    /// Returns [`ActivationPoll::Complete`] on the tick the last increment is pumped,
    /// after releasing the connection.
    pub fn resume(
        &mut self,
        now: TimeStep,
        vessel: &mut SupplyVessel,
        tank: &mut Tank,
        connection: &mut Connection,
    ) -> Result<ActivationPoll, ConnectionError> {
        if let Phase::InTransit { until } = self.phase {
            if now < until {
                return Ok(ActivationPoll::Pending);
            }
            connection.reserve(self.id)?;
            self.phase = Phase::Transferring;
            self.berthed_at = Some(now);
        }

        let step = transfer_step(vessel, tank);
        self.delivered += step.moved;
        if !step.done {
            return Ok(ActivationPoll::Pending);
        }

        connection.release(self.id)?;
        Ok(ActivationPoll::Complete(Discharge {
            id: self.id,
            called_at: self.called_at,
            transit: self.transit,
            berthed_at: self.berthed_at.unwrap_or(now),
            completed_at: now,
            delivered: self.delivered,
            vessel_level_after: vessel.level(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_stops_when_fsru_full() {
        // 50k of headroom, 170k aboard, 10k per tick
        let mut tank = Tank::new(174e3, 124e3, 3_300.0, 0.0);
        let mut vessel = SupplyVessel::new(170e3, 1e4);

        let mut steps = 0;
        loop {
            steps += 1;
            if transfer_step(&mut vessel, &mut tank).done {
                break;
            }
        }

        assert_eq!(steps, 5);
        assert_eq!(tank.level(), 174e3);
        assert_eq!(vessel.level(), 120e3);
    }

    #[test]
    fn test_transfer_stops_when_vessel_empty() {
        let mut tank = Tank::new(174e3, 0.0, 0.0, 0.0);
        let mut vessel = SupplyVessel::new(25e3, 1e4);

        let mut moved = Vec::new();
        loop {
            let step = transfer_step(&mut vessel, &mut tank);
            moved.push(step.moved);
            if step.done {
                break;
            }
        }

        assert_eq!(moved, vec![1e4, 1e4, 5e3]);
        assert!(vessel.is_empty());
        assert_eq!(tank.level(), 25e3);
    }

    #[test]
    fn test_activation_waits_out_transit() {
        let mut tank = Tank::new(174e3, 100e3, 3_300.0, 0.0);
        let mut vessel = SupplyVessel::new(170e3, 1e4);
        let mut conn = Connection::default();
        let mut activation = Activation::new(1, 10, 3);

        for now in 10..13 {
            let poll = activation
                .resume(now, &mut vessel, &mut tank, &mut conn)
                .unwrap();
            assert_eq!(poll, ActivationPoll::Pending);
            assert!(conn.is_idle());
            assert_eq!(tank.level(), 100e3);
        }

        let poll = activation
            .resume(13, &mut vessel, &mut tank, &mut conn)
            .unwrap();
        assert_eq!(poll, ActivationPoll::Pending);
        assert_eq!(conn.owner(), Some(1));
        assert_eq!(activation.phase(), Phase::Transferring);
        assert_eq!(tank.level(), 110e3);
    }

    #[test]
    fn test_activation_completes_and_releases() {
        let mut tank = Tank::new(174e3, 150e3, 3_300.0, 0.0);
        let mut vessel = SupplyVessel::new(170e3, 1e4);
        let mut conn = Connection::default();
        let mut activation = Activation::new(4, 0, 0);

        let mut now = 0;
        let discharge = loop {
            match activation
                .resume(now, &mut vessel, &mut tank, &mut conn)
                .unwrap()
            {
                ActivationPoll::Complete(d) => break d,
                ActivationPoll::Pending => now += 1,
            }
        };

        assert!(conn.is_idle());
        assert_eq!(discharge.berthed_at, 0);
        assert_eq!(discharge.completed_at, 2);
        assert_eq!(discharge.delivered, 24e3);
        assert_eq!(discharge.vessel_level_after, 146e3);
    }

    #[test]
    fn test_activation_refused_when_connection_held() {
        let mut tank = Tank::new(174e3, 100e3, 3_300.0, 0.0);
        let mut vessel = SupplyVessel::new(170e3, 1e4);
        let mut conn = Connection::Reserved(9);
        let mut activation = Activation::new(1, 0, 0);

        let err = activation
            .resume(0, &mut vessel, &mut tank, &mut conn)
            .unwrap_err();
        assert_eq!(err, ConnectionError::Busy { owner: 9 });
        assert_eq!(tank.level(), 100e3);
    }

    #[test]
    fn test_refill_restores_capacity() {
        let mut vessel = SupplyVessel::new(170e3, 1e4);
        assert_eq!(vessel.take(200e3), 170e3);
        assert!(vessel.is_empty());
        vessel.refill();
        assert_eq!(vessel.level(), 170e3);
    }
}
