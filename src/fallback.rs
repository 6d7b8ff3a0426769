//! # Synthetic Access Calendars
//!
//! This module provides a deterministic tidal model used when no calendar exports are
//! available. It predicts the water height with a two-constituent (M2 + S2)
//! equilibrium tide and opens a leg whenever the predicted height clears that leg's
//! draft threshold.
//!
//! ## Model Characteristics
//!
//! ### Semidiurnal Pattern
//! - **M2**: principal lunar constituent, 12.42 h period
//! - **S2**: principal solar constituent, 12.00 h period
//! - **Spring–neap**: the beat between M2 and S2 widens and narrows the windows over
//!   a ~14.8 day cycle, so some weeks are much harder to navigate than others
//!
//! ### Legs
//! - Legs 1 and 3 cross the same dredged channel and share `channel_threshold_ft`
//! - Leg 2 (berth approach) lags the channel by [`BERTH_LAG_HRS`] and uses the
//!   lower `berth_threshold_ft`
//!
//! The model is a planning approximation: no diurnal inequality, no weather set-up.

use chrono::{Duration, NaiveDateTime};

use crate::calendar::{AccessCalendar, CalendarSet};
use crate::config::CalendarConfig;

// Lunar M2 and solar S2 constituents (ft, hours)
const A_M2: f64 = 4.51;
const P_M2_HRS: f64 = 12.42;
const A_S2: f64 = 0.68;
const P_S2_HRS: f64 = 12.00;

/// Chart-datum offset of the mean water level
const MEAN_LEVEL_FT: f64 = 5.0;

/// Tidal lag between the channel and the FSRU berth
pub const BERTH_LAG_HRS: f64 = 1.5;

/// Predicted water height (ft above chart datum) at a wall-clock instant.
pub fn tide_height(at: NaiveDateTime) -> f64 {
    let tau = std::f64::consts::TAU;
    let hours = at.and_utc().timestamp() as f64 / 3600.0;
    let theta_m2 = (hours / P_M2_HRS).fract() * tau;
    let theta_s2 = (hours / P_S2_HRS).fract() * tau;
    MEAN_LEVEL_FT + A_M2 * theta_m2.sin() + A_S2 * theta_s2.sin()
}

/// Generate all three leg calendars from the tide model.
///
/// The same configuration always produces the same calendars.
pub fn synthesize(config: &CalendarConfig) -> CalendarSet {
    let step = Duration::minutes(i64::from(config.tick_minutes));
    let berth_lag = Duration::minutes((BERTH_LAG_HRS * 60.0) as i64);

    let stamps: Vec<NaiveDateTime> = (0..config.length)
        .map(|tick| config.start + step * tick as i32)
        .collect();

    let channel: Vec<bool> = stamps
        .iter()
        .map(|&t| tide_height(t) >= config.channel_threshold_ft)
        .collect();
    let berth: Vec<bool> = stamps
        .iter()
        .map(|&t| tide_height(t - berth_lag) >= config.berth_threshold_ft)
        .collect();

    CalendarSet::new(
        AccessCalendar::with_timestamps(channel.clone(), stamps.clone()),
        AccessCalendar::with_timestamps(berth, stamps.clone()),
        AccessCalendar::with_timestamps(channel, stamps),
    )
}
