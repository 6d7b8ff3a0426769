//! # Transit-Leg Access Calendars
//!
//! This module owns the read-only access tables that gate the carrier's three transit
//! legs, and loads them from CSV exports of the channel/tide planning sheets.
//!
//! ## Data Model
//!
//! A calendar is an ordered sequence of accessibility flags. Row `i` describes tick
//! `i`, so the row position doubles as both key and lookup time. Calendars are built
//! once before the run and never mutated afterwards.
//!
//! ## CSV Format
//!
//! ```text
//! timestamp,accessible
//! 2024-01-01 00:00:00,True
//! 2024-01-01 01:00:00,False
//! ```
//!
//! - `accessible` accepts `True/False`, `true/false` and `1/0`
//! - `timestamp` is optional; when present it must parse as RFC 3339 or
//!   `YYYY-MM-DD HH:MM[:SS]`
//! - Additional columns (e.g. an exported index) are ignored
//!
//! ## Error Handling
//!
//! All failures propagate through [`CalendarError`]. The binary treats any of them
//! as a reason to switch to the synthetic model in [`crate::fallback`].

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::CalendarConfig;
use crate::TimeStep;

/// Errors that can occur while loading access calendars.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Not every leg has a calendar file configured
    #[error("calendar files not configured")]
    NotConfigured,

    #[error("calendar IO ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("calendar CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognised accessibility flag {value:?}")]
    BadFlag { row: usize, value: String },

    #[error("row {row}: unrecognised timestamp {value:?}")]
    BadTimestamp { row: usize, value: String },

    #[error("calendar has no rows")]
    Empty,
}

/// One of the three sequential transit legs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Leg {
    /// Channel entry
    One,
    /// Approach to the FSRU berth
    Two,
    /// Departure after discharge
    Three,
}

impl Leg {
    pub const ALL: [Leg; 3] = [Leg::One, Leg::Two, Leg::Three];
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::One => write!(f, "leg 1"),
            Leg::Two => write!(f, "leg 2"),
            Leg::Three => write!(f, "leg 3"),
        }
    }
}

/// Immutable per-tick accessibility flags for a single leg.
///
/// # Example
/// ```
/// use fsru_sim_lib::calendar::AccessCalendar;
///
/// let calendar = AccessCalendar::from_flags(vec![false, true, true, false]);
/// assert_eq!(calendar.len(), 4);
/// assert!(calendar.is_accessible(1));
/// assert!(!calendar.is_accessible(7));
/// assert_eq!(calendar.accessible_slots().collect::<Vec<_>>(), vec![1, 2]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AccessCalendar {
    flags: Vec<bool>,
    timestamps: Option<Vec<NaiveDateTime>>,
}

impl AccessCalendar {
    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self {
            flags,
            timestamps: None,
        }
    }

    /// Calendar whose rows also carry wall-clock timestamps.
    ///
    /// Timestamps are dropped when their count does not match the flags.
    pub fn with_timestamps(flags: Vec<bool>, timestamps: Vec<NaiveDateTime>) -> Self {
        let timestamps = (timestamps.len() == flags.len()).then_some(timestamps);
        Self { flags, timestamps }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Whether the leg is passable at `tick`. Ticks outside the table are not.
    pub fn is_accessible(&self, tick: TimeStep) -> bool {
        usize::try_from(tick)
            .ok()
            .and_then(|i| self.flags.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Accessible ticks in ascending order.
    pub fn accessible_slots(&self) -> impl Iterator<Item = TimeStep> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &open)| open)
            .map(|(i, _)| i as TimeStep)
    }

    pub fn timestamp(&self, tick: TimeStep) -> Option<NaiveDateTime> {
        let i = usize::try_from(tick).ok()?;
        self.timestamps.as_ref()?.get(i).copied()
    }

    /// Parse a calendar from any CSV source.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, CalendarError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut flags = Vec::new();
        let mut timestamps = Vec::new();
        let mut all_stamped = true;

        for (row, record) in csv.deserialize::<CalendarRow>().enumerate() {
            let record = record?;
            flags.push(parse_flag(row, &record.accessible)?);
            match record.timestamp.as_deref() {
                Some(raw) if !raw.is_empty() => timestamps.push(parse_timestamp(row, raw)?),
                _ => all_stamped = false,
            }
        }

        if flags.is_empty() {
            return Err(CalendarError::Empty);
        }

        if all_stamped {
            Ok(Self::with_timestamps(flags, timestamps))
        } else {
            Ok(Self::from_flags(flags))
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CalendarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let calendar = Self::from_reader(file)?;
        debug!(
            path = %path.display(),
            rows = calendar.len(),
            accessible = calendar.accessible_slots().count(),
            "loaded access calendar"
        );
        Ok(calendar)
    }
}

/// The access calendars for all three legs.
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarSet {
    pub leg1: AccessCalendar,
    pub leg2: AccessCalendar,
    pub leg3: AccessCalendar,
}

impl CalendarSet {
    pub fn new(leg1: AccessCalendar, leg2: AccessCalendar, leg3: AccessCalendar) -> Self {
        Self { leg1, leg2, leg3 }
    }

    pub fn get(&self, leg: Leg) -> &AccessCalendar {
        match leg {
            Leg::One => &self.leg1,
            Leg::Two => &self.leg2,
            Leg::Three => &self.leg3,
        }
    }

    /// Default run length: the number of leg-1 rows.
    pub fn horizon(&self) -> usize {
        self.leg1.len()
    }

    /// Wall-clock label for a tick, taken from the leg-1 calendar.
    pub fn timestamp(&self, tick: TimeStep) -> Option<NaiveDateTime> {
        self.leg1.timestamp(tick)
    }
}

/// Load all three leg calendars from the configured CSV files.
pub fn load(config: &CalendarConfig) -> Result<CalendarSet, CalendarError> {
    let [leg1, leg2, leg3] = config.paths().ok_or(CalendarError::NotConfigured)?;
    Ok(CalendarSet::new(
        AccessCalendar::from_path(leg1)?,
        AccessCalendar::from_path(leg2)?,
        AccessCalendar::from_path(leg3)?,
    ))
}

// -- Private Implementation --

#[derive(Debug, Deserialize)]
struct CalendarRow {
    #[serde(default)]
    timestamp: Option<String>,
    accessible: String,
}

fn parse_flag(row: usize, raw: &str) -> Result<bool, CalendarError> {
    match raw {
        "True" | "true" | "TRUE" | "1" => Ok(true),
        "False" | "false" | "FALSE" | "0" => Ok(false),
        _ => Err(CalendarError::BadFlag {
            row,
            value: raw.to_string(),
        }),
    }
}

fn parse_timestamp(row: usize, raw: &str) -> Result<NaiveDateTime, CalendarError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| CalendarError::BadTimestamp {
            row,
            value: raw.to_string(),
        })
}
