//! # Operability Reporting
//!
//! Summarises a recorded FSRU level trace into the fraction of ticks during which
//! the tank stayed above its minimum operable level.
//!
//! Samples may be sparse or repeated: the lowest sample of each tick is kept and
//! carried forward onto every tick in `[0, max_tick)`. Ticks before the first sample
//! have no known level and count as not operable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{LevelTrace, TimeStep};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperabilityReport {
    /// Ticks covered, `[0, max_tick)`
    pub ticks: usize,
    /// Ticks with level strictly above the minimum operable level
    pub operable_ticks: usize,
    /// `operable_ticks / ticks`, 0 for an empty trace
    pub fraction: f64,
    /// First tick at or below the minimum
    pub first_shortfall: Option<TimeStep>,
    /// Longest run of consecutive non-operable ticks
    pub longest_shortfall: usize,
}

impl OperabilityReport {
    pub fn from_trace(trace: &LevelTrace, min_operable: f64) -> Self {
        let mut per_tick: BTreeMap<TimeStep, f64> = BTreeMap::new();
        for sample in &trace.samples {
            per_tick
                .entry(sample.tick)
                .and_modify(|level| *level = level.min(sample.level))
                .or_insert(sample.level);
        }

        let max_tick = per_tick.keys().next_back().copied().unwrap_or(0).max(0);

        let mut current: Option<f64> = None;
        let mut operable_ticks = 0;
        let mut first_shortfall = None;
        let mut streak = 0;
        let mut longest_shortfall = 0;

        for tick in 0..max_tick {
            if let Some(&level) = per_tick.get(&tick) {
                current = Some(level);
            }
            if current.is_some_and(|level| level > min_operable) {
                operable_ticks += 1;
                streak = 0;
            } else {
                first_shortfall.get_or_insert(tick);
                streak += 1;
                longest_shortfall = longest_shortfall.max(streak);
            }
        }

        let ticks = max_tick as usize;
        let fraction = if ticks == 0 {
            0.0
        } else {
            operable_ticks as f64 / ticks as f64
        };

        Self {
            ticks,
            operable_ticks,
            fraction,
            first_shortfall,
            longest_shortfall,
        }
    }
}

impl fmt::Display for OperabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-----------------------")?;
        writeln!(
            f,
            "percentage operable: {:.4} ({} of {} ticks)",
            self.fraction, self.operable_ticks, self.ticks
        )?;
        if let Some(first) = self.first_shortfall {
            writeln!(
                f,
                "first shortfall at tick {}, longest shortfall {} ticks",
                first, self.longest_shortfall
            )?;
        }
        write!(f, "-----------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resource;

    fn trace(samples: &[(TimeStep, f64)]) -> LevelTrace {
        let mut trace = LevelTrace::new(Resource::Fsru);
        for &(tick, level) in samples {
            trace.push(tick, level);
        }
        trace
    }

    #[test]
    fn test_dense_trace() {
        let t = trace(&[(0, 10.0), (1, 8.0), (2, 5.0), (3, 5.0), (4, 9.0)]);
        let report = OperabilityReport::from_trace(&t, 5.0);
        // Ticks 0..4: 10, 8, 5, 5 -> two operable
        assert_eq!(report.ticks, 4);
        assert_eq!(report.operable_ticks, 2);
        assert!((report.fraction - 0.5).abs() < 1e-12);
        assert_eq!(report.first_shortfall, Some(2));
        assert_eq!(report.longest_shortfall, 2);
    }

    #[test]
    fn test_sparse_samples_forward_fill() {
        let t = trace(&[(0, 10.0), (5, 1.0), (8, 10.0), (10, 10.0)]);
        let report = OperabilityReport::from_trace(&t, 5.0);
        // 0..5 operable, 5..8 not, 8..10 operable
        assert_eq!(report.ticks, 10);
        assert_eq!(report.operable_ticks, 7);
        assert_eq!(report.longest_shortfall, 3);
    }

    #[test]
    fn test_repeated_tick_uses_minimum() {
        let t = trace(&[(0, 10.0), (1, 10.0), (1, 2.0), (2, 10.0)]);
        let report = OperabilityReport::from_trace(&t, 5.0);
        assert_eq!(report.operable_ticks, 1);
        assert_eq!(report.first_shortfall, Some(1));
    }

    #[test]
    fn test_leading_gap_not_operable() {
        let t = trace(&[(3, 10.0), (6, 10.0)]);
        let report = OperabilityReport::from_trace(&t, 5.0);
        assert_eq!(report.ticks, 6);
        assert_eq!(report.operable_ticks, 3);
        assert_eq!(report.first_shortfall, Some(0));
    }

    #[test]
    fn test_empty_trace() {
        let report = OperabilityReport::from_trace(&trace(&[]), 5.0);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.fraction, 0.0);
        assert!(report.to_string().contains("percentage operable"));
    }
}
