//! Pacing module for remote call rate control
//!
//! # Components
//!
//! - `PacingController`: process-wide gate every remote call waits on
//! - `PacingState`: snapshot of the interval, success counter and cooldown

mod controller;

pub use controller::{PacingController, PacingState};
