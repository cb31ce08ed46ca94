//! Writing Timer
//!
//! A countdown (default 60 minutes) or stopwatch shown next to the essay
//! editor. [`TimerModel`] holds the state; [`TimerDriver`] ticks it once a
//! second on a tokio task and reports when the countdown runs out, which
//! is the cue for an automatic submission.

mod driver;
mod model;

pub use driver::TimerDriver;
pub use model::{
    format_clock, TimerEvent, TimerMode, TimerModel, DEFAULT_DURATION_MINUTES, TICK_MS,
    WARNING_THRESHOLD_MS,
};
