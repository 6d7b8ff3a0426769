//! # FSRU Storage Tank
//!
//! A bounded, non-negative LNG inventory with metered send-out and capped deposits.
//!
//! ## Invariants
//! - `0 ≤ level ≤ capacity` after every operation
//! - send-out never draws the level below `min_operable`
//!
//! Over-withdrawal and over-fill are prevented by clamping the amount to the
//! available headroom; they are never reported as errors.

use crate::TimeStep;

#[derive(Clone, Debug, PartialEq)]
pub struct Tank {
    level: f64,
    capacity: f64,
    min_operable: f64,
    optimal_level: f64,
}

impl Tank {
    /// Build a tank; `level` is clamped into `[0, capacity]`.
    pub fn new(capacity: f64, level: f64, min_operable: f64, optimal_level: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            level: level.clamp(0.0, capacity),
            capacity,
            min_operable: min_operable.clamp(0.0, capacity),
            optimal_level: optimal_level.clamp(0.0, capacity),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn min_operable(&self) -> f64 {
        self.min_operable
    }

    pub fn optimal_level(&self) -> f64 {
        self.optimal_level
    }

    /// Free space left in the tank.
    pub fn headroom(&self) -> f64 {
        self.capacity - self.level
    }

    pub fn is_full(&self) -> bool {
        self.headroom() <= 0.0
    }

    pub fn is_operable(&self) -> bool {
        self.level > self.min_operable
    }

    /// One tick of regasification. Returns the amount actually sent out.
    pub fn sendout(&mut self, rate: f64) -> f64 {
        let withdrawal = rate.min(self.level - self.min_operable);
        if withdrawal > 0.0 {
            self.level -= withdrawal;
            withdrawal
        } else {
            0.0
        }
    }

    /// Deposit up to `amount`; returns what fit.
    pub fn put(&mut self, amount: f64) -> f64 {
        let accepted = amount.min(self.headroom()).max(0.0);
        self.level = (self.level + accepted).min(self.capacity);
        accepted
    }

    /// Tick at which send-out at `rate` brings the level down to the optimal level,
    /// rounded to the nearest tick.
    pub fn optimal_refill_time(&self, now: TimeStep, rate: f64) -> TimeStep {
        now + ((self.level - self.optimal_level) / rate).round() as TimeStep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sendout_stops_at_min_operable() {
        let mut tank = Tank::new(10_000.0, 5_000.0, 3_300.0, 4_000.0);
        assert_eq!(tank.sendout(1_097.0), 1_097.0);
        assert_eq!(tank.level(), 3_903.0);
        assert_eq!(tank.sendout(1_097.0), 603.0);
        assert_eq!(tank.level(), 3_300.0);
        assert_eq!(tank.sendout(1_097.0), 0.0);
        assert_eq!(tank.level(), 3_300.0);
        assert!(!tank.is_operable());
    }

    #[test]
    fn test_put_is_capped_by_headroom() {
        let mut tank = Tank::new(10_000.0, 9_000.0, 0.0, 0.0);
        assert_eq!(tank.put(400.0), 400.0);
        assert_eq!(tank.put(5_000.0), 600.0);
        assert!(tank.is_full());
        assert_eq!(tank.put(1.0), 0.0);
        assert_eq!(tank.level(), 10_000.0);
    }

    #[test]
    fn test_negative_deposit_ignored() {
        let mut tank = Tank::new(10_000.0, 5_000.0, 0.0, 0.0);
        assert_eq!(tank.put(-50.0), 0.0);
        assert_eq!(tank.level(), 5_000.0);
    }

    #[test]
    fn test_construction_clamps() {
        let tank = Tank::new(100.0, 150.0, 200.0, -5.0);
        assert_eq!(tank.level(), 100.0);
        assert_eq!(tank.min_operable(), 100.0);
        assert_eq!(tank.optimal_level(), 0.0);
    }

    #[test]
    fn test_optimal_refill_time_rounds() {
        let tank = Tank::new(174e3, 174e3, 3_300.0, 22_649.0);
        // (174000 - 22649) / 1097 = 137.97 -> 138
        assert_eq!(tank.optimal_refill_time(0, 1_097.0), 138);
        assert_eq!(tank.optimal_refill_time(40, 1_097.0), 178);
    }

    #[test]
    fn test_optimal_time_in_past_when_below_target() {
        let tank = Tank::new(174e3, 10_000.0, 3_300.0, 22_649.0);
        assert!(tank.optimal_refill_time(50, 1_097.0) < 50);
    }
}
