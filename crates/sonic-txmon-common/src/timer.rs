//! Poll timer driving the periodic evaluation pass.

use std::time::Duration;

use log::info;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Poll timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not armed; [`PollTimer::tick`] never completes.
    Unarmed,
    /// Armed; fires once per period.
    Armed,
}

/// Periodic tick source with runtime retargeting.
///
/// The timer is armed on construction and fires once per period for the
/// process lifetime. [`PollTimer::set_interval`] re-arms it so the next fire
/// happens one full new period from the moment of the change, not on the
/// previously scheduled cadence.
#[derive(Debug)]
pub struct PollTimer {
    state: TimerState,
    period: Duration,
    interval: Option<Interval>,
}

impl PollTimer {
    /// Creates a timer armed with the given period.
    ///
    /// The first tick fires one full period after construction.
    pub fn new(period: Duration) -> Self {
        let mut timer = Self {
            state: TimerState::Unarmed,
            period,
            interval: None,
        };
        timer.arm();
        timer
    }

    fn arm(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        // A stalled dispatch must not be followed by a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        self.state = TimerState::Armed;
    }

    /// Returns the timer state.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Returns the current period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Retargets the timer to a new period.
    ///
    /// Equal period is a no-op (the current cadence is kept). Otherwise the
    /// timer is reset: the next tick fires one full new period from now.
    pub fn set_interval(&mut self, period: Duration) {
        if period == self.period {
            return;
        }
        self.period = period;
        self.arm();
        info!("Poll timer reset to {:?}", period);
    }

    /// Completes when the timer fires.
    ///
    /// Pending forever while unarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
