//! Countdown / stopwatch model
//!
//! Pure state: nothing here sleeps. A driver calls [`TimerModel::tick`]
//! once per second while the timer runs.

use serde::{Deserialize, Serialize};

/// Length of one tick in milliseconds
pub const TICK_MS: u64 = 1000;

/// Below this many milliseconds left, the countdown shows a warning
pub const WARNING_THRESHOLD_MS: u64 = 5 * 60 * 1000;

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Countdown,
    Stopwatch,
}

/// Something the driver should react to after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick,
    /// Countdown reached zero; fired once
    Completed,
}

/// State of the writing timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerModel {
    mode: TimerMode,
    duration_minutes: u32,
    remaining_ms: u64,
    elapsed_ms: u64,
    running: bool,
    warning: bool,
}

impl Default for TimerModel {
    fn default() -> Self {
        Self::countdown(DEFAULT_DURATION_MINUTES)
    }
}

impl TimerModel {
    /// A countdown of `minutes` (at least one)
    pub fn countdown(minutes: u32) -> Self {
        let minutes = minutes.max(1);
        Self {
            mode: TimerMode::Countdown,
            duration_minutes: minutes,
            remaining_ms: minutes_to_ms(minutes),
            elapsed_ms: 0,
            running: false,
            warning: false,
        }
    }

    pub fn stopwatch() -> Self {
        Self {
            mode: TimerMode::Stopwatch,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Warning is only shown while running
    pub fn is_warning(&self) -> bool {
        self.warning && self.running
    }

    /// Value to display: time left for a countdown, time passed for a stopwatch
    pub fn display_ms(&self) -> u64 {
        match self.mode {
            TimerMode::Countdown => self.remaining_ms,
            TimerMode::Stopwatch => self.elapsed_ms,
        }
    }

    /// Start or resume; a finished countdown starts over from the full duration
    pub fn start(&mut self) {
        if self.mode == TimerMode::Countdown && self.remaining_ms == 0 {
            self.remaining_ms = minutes_to_ms(self.duration_minutes);
            self.warning = false;
        }
        self.running = true;
    }

    /// Stop ticking without resetting
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop and return to the configured duration (countdown) or zero (stopwatch)
    pub fn reset(&mut self) {
        self.running = false;
        self.warning = false;
        match self.mode {
            TimerMode::Countdown => self.remaining_ms = minutes_to_ms(self.duration_minutes),
            TimerMode::Stopwatch => self.elapsed_ms = 0,
        }
    }

    /// Switch mode; the timer is reset
    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.reset();
    }

    /// Change the countdown length; ignored while running
    pub fn set_duration(&mut self, minutes: u32) -> bool {
        if self.running {
            return false;
        }
        self.duration_minutes = minutes.max(1);
        if self.mode == TimerMode::Countdown {
            self.remaining_ms = minutes_to_ms(self.duration_minutes);
            self.warning = false;
        }
        true
    }

    /// Advance by one tick; `None` when paused
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        match self.mode {
            TimerMode::Stopwatch => {
                self.elapsed_ms += TICK_MS;
                Some(TimerEvent::Tick)
            }
            TimerMode::Countdown => {
                self.remaining_ms = self.remaining_ms.saturating_sub(TICK_MS);
                self.warning = self.remaining_ms < WARNING_THRESHOLD_MS;
                if self.remaining_ms == 0 {
                    self.running = false;
                    Some(TimerEvent::Completed)
                } else {
                    Some(TimerEvent::Tick)
                }
            }
        }
    }
}

fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes) * 60 * 1000
}

/// `MM:SS`; minutes keep counting past 59
pub fn format_clock(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}
