//! # Scenario Test Suite
//!
//! End-to-end checks of the simulation against hand-built calendars, plus the
//! invariants that must hold on every tick of a run.
