//! # Leg Slot Matching
//!
//! Picks the best accessible calendar slot for a target tick under an asymmetric
//! look-back/look-ahead tolerance.
//!
//! ## Scoring
//!
//! For every accessible slot `i` the signed offset `d = i - target` is scored:
//!
//! ```text
//! d == 0  →  -∞        exact match always wins
//! d <  0  →  1 / d     near past slots score strongly negative, far past ones approach 0
//! d >  0  →  d         future slots score positive, nearest first
//! ```
//!
//! The slot with the minimum score is selected. Consequences worth knowing:
//! - any admissible past slot beats every future slot
//! - among past slots the most recent wins
//! - slots further back than `lookback` are discarded before scoring
//! - ties keep the earliest slot (only possible with identical offsets, i.e. never)

use crate::calendar::AccessCalendar;
use crate::TimeStep;

/// Result of matching a target against a calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotMatch {
    Found(TimeStep),
    NotFound,
}

impl SlotMatch {
    pub fn slot(self) -> Option<TimeStep> {
        match self {
            SlotMatch::Found(slot) => Some(slot),
            SlotMatch::NotFound => None,
        }
    }
}

/// Admissible distance around a target, in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tolerance {
    /// Slots more than this many ticks before the target are discarded
    pub lookback: TimeStep,
    /// Slots more than this many ticks after the target are discarded; unbounded when `None`
    pub lookahead: Option<TimeStep>,
}

impl Tolerance {
    /// Bounded look-back, unbounded look-ahead.
    pub fn lookback(lookback: TimeStep) -> Self {
        Self {
            lookback,
            lookahead: None,
        }
    }

    /// Only the target itself or later.
    pub fn future_only() -> Self {
        Self::lookback(0)
    }

    pub fn with_lookahead(mut self, lookahead: Option<TimeStep>) -> Self {
        self.lookahead = lookahead;
        self
    }

    fn admits(&self, offset: TimeStep) -> bool {
        offset >= -self.lookback && self.lookahead.map_or(true, |ahead| offset <= ahead)
    }
}

/// Score of a slot at signed `offset` from its target; lower is better.
pub fn score(offset: TimeStep) -> f64 {
    match offset {
        0 => f64::NEG_INFINITY,
        d if d < 0 => 1.0 / d as f64,
        d => d as f64,
    }
}

/// Select the best accessible slot of `calendar` for `target`.
///
/// Pure and deterministic: the same inputs always yield the same slot.
///
/// # Example
/// ```
/// use fsru_sim_lib::calendar::AccessCalendar;
/// use fsru_sim_lib::matcher::{best_slot, SlotMatch, Tolerance};
///
/// //                                       0      1     2      3     4     5
/// let calendar = AccessCalendar::from_flags(vec![true, false, false, true, false, true]);
///
/// // Slot 3 is one tick in the past, slot 5 one tick in the future: the past wins.
/// assert_eq!(best_slot(&calendar, 4, Tolerance::lookback(2)), SlotMatch::Found(3));
///
/// // Nothing at or after tick 6 is open.
/// assert_eq!(best_slot(&calendar, 6, Tolerance::future_only()), SlotMatch::NotFound);
/// ```
pub fn best_slot(calendar: &AccessCalendar, target: TimeStep, tolerance: Tolerance) -> SlotMatch {
    let mut best: Option<(TimeStep, f64)> = None;

    for slot in calendar.accessible_slots() {
        let offset = slot - target;
        if !tolerance.admits(offset) {
            continue;
        }

        let s = score(offset);
        match best {
            Some((_, current)) if s >= current => {
                // Future scores only grow from here on.
                if offset > 0 {
                    break;
                }
            }
            _ => best = Some((slot, s)),
        }
    }

    best.map_or(SlotMatch::NotFound, |(slot, _)| SlotMatch::Found(slot))
}
