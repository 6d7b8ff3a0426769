//! # Arrival Scheduling
//!
//! Turns a desired refill time into a feasible carrier call by matching the three
//! transit legs against their access calendars.
//!
//! ## Algorithm
//!
//! 1. Match leg 2 (berth approach) against `desired - leg2_transit_offset`
//! 2. Match leg 1 (channel entry) against `leg2_slot - leg1_transit_offset` with the
//!    tighter leg-1 look-back
//! 3. If the leg-1 slot is at or before its target the call is feasible: the carrier
//!    enters the channel at the leg-1 slot and is alongside at `leg2_slot + transit_tail`
//! 4. Otherwise retry with `desired = leg1_slot + retry_offset`
//!
//! Retries are an explicit loop capped by the calendar horizon. A leg without an
//! admissible slot, or a (leg-2, leg-1) pair seen on an earlier pass, ends the
//! search with [`ArrivalPlan::Unreachable`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::calendar::{CalendarSet, Leg};
use crate::config::RouteConfig;
use crate::matcher::{best_slot, SlotMatch, Tolerance};
use crate::TimeStep;

/// Resolved leg offsets and tolerances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteParams {
    pub leg2_transit_offset: TimeStep,
    pub leg1_transit_offset: TimeStep,
    pub leg2_lookback: TimeStep,
    pub leg1_lookback: TimeStep,
    pub transit_tail: TimeStep,
    pub retry_offset: TimeStep,
    pub lookahead: Option<TimeStep>,
}

impl From<&RouteConfig> for RouteParams {
    fn from(route: &RouteConfig) -> Self {
        Self {
            leg2_transit_offset: route.leg2_transit_offset,
            leg1_transit_offset: route.leg1_transit_offset,
            leg2_lookback: route.arrival_lookback,
            leg1_lookback: route.leg1_lookback(),
            transit_tail: route.transit_tail,
            retry_offset: route.retry_offset.max(1),
            lookahead: route.lookahead,
        }
    }
}

impl Default for RouteParams {
    fn default() -> Self {
        Self::from(&RouteConfig::default())
    }
}

/// A feasible carrier call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCall {
    /// Channel entry (leg-1 slot); the carrier is activated at this tick
    pub call_at: TimeStep,
    /// Ticks from channel entry until alongside the FSRU
    pub transit: TimeStep,
    /// Leg-2 slot used for the berth approach
    pub berth_slot: TimeStep,
}

impl ScheduledCall {
    pub fn alongside_at(&self) -> TimeStep {
        self.call_at + self.transit
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrivalPlan {
    Scheduled(ScheduledCall),
    /// No feasible arrival within the calendar horizon
    Unreachable,
}

impl ArrivalPlan {
    pub fn call(self) -> Option<ScheduledCall> {
        match self {
            ArrivalPlan::Scheduled(call) => Some(call),
            ArrivalPlan::Unreachable => None,
        }
    }
}

/// Matches desired refill times against the leg calendars.
#[derive(Clone, Debug)]
pub struct ArrivalScheduler {
    calendars: CalendarSet,
    route: RouteParams,
}

impl ArrivalScheduler {
    pub fn new(calendars: CalendarSet, route: RouteParams) -> Self {
        Self { calendars, route }
    }

    pub fn calendars(&self) -> &CalendarSet {
        &self.calendars
    }

    /// Upper bound on retries: one per calendar row.
    fn retry_limit(&self) -> usize {
        Leg::ALL
            .iter()
            .map(|&leg| self.calendars.get(leg).len())
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Resolve a single call for `desired`.
    ///
    /// # Example
    /// ```
    /// use fsru_sim_lib::calendar::{AccessCalendar, CalendarSet};
    /// use fsru_sim_lib::scheduler::{ArrivalPlan, ArrivalScheduler, RouteParams};
    ///
    /// let open = AccessCalendar::from_flags(vec![true; 100]);
    /// let scheduler = ArrivalScheduler::new(
    ///     CalendarSet::new(open.clone(), open.clone(), open),
    ///     RouteParams::default(),
    /// );
    ///
    /// // leg 2 at 55 - 5 = 50, leg 1 at 50 - 2 = 48, alongside at 50 + 5 = 55
    /// let call = scheduler.schedule_arrival(55).call().unwrap();
    /// assert_eq!((call.call_at, call.transit, call.berth_slot), (48, 7, 50));
    /// ```
    pub fn schedule_arrival(&self, desired: TimeStep) -> ArrivalPlan {
        self.resolve(desired).0
    }

    /// Matching loop behind [`schedule_arrival`](Self::schedule_arrival); also
    /// returns the number of passes made.
    fn resolve(&self, desired: TimeStep) -> (ArrivalPlan, usize) {
        let route = &self.route;
        let leg2_tolerance = Tolerance::lookback(route.leg2_lookback).with_lookahead(route.lookahead);
        let leg1_tolerance = Tolerance::lookback(route.leg1_lookback).with_lookahead(route.lookahead);

        let mut desired = desired;
        let mut seen = HashSet::new();
        for attempt in 1..=self.retry_limit() {
            let leg2_target = desired - route.leg2_transit_offset;
            let SlotMatch::Found(leg2) = best_slot(&self.calendars.leg2, leg2_target, leg2_tolerance)
            else {
                debug!(desired, attempt, "no admissible leg-2 slot");
                return (ArrivalPlan::Unreachable, attempt);
            };

            let leg1_target = leg2 - route.leg1_transit_offset;
            let SlotMatch::Found(leg1) = best_slot(&self.calendars.leg1, leg1_target, leg1_tolerance)
            else {
                debug!(desired, attempt, leg2, "no admissible leg-1 slot");
                return (ArrivalPlan::Unreachable, attempt);
            };

            if leg1 <= leg1_target {
                let call = ScheduledCall {
                    call_at: leg1,
                    transit: leg2 + route.transit_tail - leg1,
                    berth_slot: leg2,
                };
                debug!(desired, attempt, leg1, leg2, transit = call.transit, "arrival scheduled");
                return (ArrivalPlan::Scheduled(call), attempt);
            }

            // The next desired time depends only on this pair
            if !seen.insert((leg2, leg1)) {
                debug!(desired, attempt, leg1, leg2, "retry cycle detected");
                return (ArrivalPlan::Unreachable, attempt);
            }

            debug!(desired, attempt, leg1, leg2, "leg-1 slot after leg-2 window, retrying");
            desired = leg1 + route.retry_offset;
        }

        debug!(desired, "retry limit reached");
        (ArrivalPlan::Unreachable, self.retry_limit())
    }

    /// Resolve a call whose channel entry is no earlier than `earliest`.
    ///
    /// A call resolved too early shifts the desired time forward by the shortfall
    /// and is matched again, up to the same horizon-derived retry limit.
    pub fn schedule_from(&self, desired: TimeStep, earliest: TimeStep) -> ArrivalPlan {
        let mut desired = desired;
        for _ in 0..self.retry_limit() {
            match self.schedule_arrival(desired) {
                ArrivalPlan::Scheduled(call) if call.call_at < earliest => {
                    desired += earliest - call.call_at;
                }
                plan => return plan,
            }
        }
        ArrivalPlan::Unreachable
    }

    /// Earliest leg-3 departure slot at or after `ready`.
    ///
    /// Leg 3 has no upper bound: an arbitrarily late slot is accepted.
    pub fn departure(&self, ready: TimeStep) -> SlotMatch {
        best_slot(&self.calendars.leg3, ready, Tolerance::future_only())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::AccessCalendar;

    fn open_at(len: usize, open: &[TimeStep]) -> AccessCalendar {
        AccessCalendar::from_flags((0..len as TimeStep).map(|i| open.contains(&i)).collect())
    }

    fn all_open(len: usize) -> AccessCalendar {
        AccessCalendar::from_flags(vec![true; len])
    }

    #[test]
    fn test_all_open_exact_match() {
        let route = RouteParams {
            leg2_transit_offset: 0,
            ..RouteParams::default()
        };
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(all_open(100), all_open(100), all_open(100)),
            route,
        );

        let call = scheduler.schedule_arrival(50).call().unwrap();
        assert_eq!(call.berth_slot, 50);
        assert_eq!(call.call_at, 48);
        assert_eq!(call.transit, 7);
        assert_eq!(call.alongside_at(), 55);
    }

    #[test]
    fn test_leg2_out_of_reach_is_unreachable() {
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(all_open(100), open_at(100, &[2]), all_open(100)),
            RouteParams::default(),
        );
        assert_eq!(scheduler.schedule_arrival(80), ArrivalPlan::Unreachable);
    }

    #[test]
    fn test_leg1_closed_is_unreachable() {
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(open_at(100, &[]), all_open(100), all_open(100)),
            RouteParams::default(),
        );
        assert_eq!(scheduler.schedule_arrival(40), ArrivalPlan::Unreachable);
    }

    #[test]
    fn test_retry_moves_to_later_berth_window() {
        let route = RouteParams {
            leg2_lookback: 1,
            leg1_lookback: 1,
            ..RouteParams::default()
        };
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(
                open_at(60, &[25, 37]),
                open_at(60, &[20, 40]),
                all_open(60),
            ),
            route,
        );

        // First pass: leg 2 at 20, leg 1 only reachable at 25 (after its target 18).
        // Retry from 27: leg 2 at 40, leg 1 at 37.
        let call = scheduler.schedule_arrival(25).call().unwrap();
        assert_eq!(call.berth_slot, 40);
        assert_eq!(call.call_at, 37);
        assert_eq!(call.transit, 8);
    }

    #[test]
    fn test_cycling_retry_terminates() {
        // Leg 2 keeps resolving to 20 and leg 1 keeps resolving to 25.
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(open_at(60, &[25]), open_at(60, &[20]), all_open(60)),
            RouteParams::default(),
        );
        assert_eq!(scheduler.schedule_arrival(25), ArrivalPlan::Unreachable);
    }

    #[test]
    fn test_repeated_slot_pair_stops_retrying() {
        // Leg 2 keeps resolving to 20, leg 1 keeps landing at 25 past its target
        let len = 20_000;
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(open_at(len, &[25, 90]), open_at(len, &[20, 99]), all_open(len)),
            RouteParams::default(),
        );

        let (plan, attempts) = scheduler.resolve(25);
        assert_eq!(plan, ArrivalPlan::Unreachable);
        assert_eq!(attempts, 2);
        assert_eq!(scheduler.schedule_arrival(25), ArrivalPlan::Unreachable);
    }

    #[test]
    fn test_schedule_from_respects_earliest() {
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(all_open(100), all_open(100), all_open(100)),
            RouteParams::default(),
        );
        let early = scheduler.schedule_arrival(10).call().unwrap();
        assert_eq!(early.call_at, 3);

        let call = scheduler.schedule_from(10, 20).call().unwrap();
        assert_eq!(call.call_at, 20);
        assert_eq!(call.berth_slot, 22);
    }

    #[test]
    fn test_departure_is_future_only() {
        let scheduler = ArrivalScheduler::new(
            CalendarSet::new(all_open(50), all_open(50), open_at(50, &[5, 30])),
            RouteParams::default(),
        );
        assert_eq!(scheduler.departure(6), SlotMatch::Found(30));
        assert_eq!(scheduler.departure(5), SlotMatch::Found(5));
        assert_eq!(scheduler.departure(31), SlotMatch::NotFound);
    }

    #[test]
    fn test_route_params_from_config() {
        let params = RouteParams::from(&RouteConfig::default());
        assert_eq!(params.leg2_lookback, 33);
        assert_eq!(params.leg1_lookback, 28);
        assert_eq!(params.retry_offset, 2);
    }
}
