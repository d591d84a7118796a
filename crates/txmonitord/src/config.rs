//! Monitor configuration state and live update handling.

use std::time::Duration;

use sonic_txmon_common::FieldValue;
use tracing::{error, info, warn};

use crate::tables::fields;

/// Default maximum tolerated TX error delta per polling interval.
pub const DEFAULT_THRESHOLD: u64 = 10;

/// Default polling period in seconds.
pub const DEFAULT_POLLING_PERIOD_SECS: u32 = 30;

/// Outcome of applying one configuration update batch.
///
/// A changed polling period requires the caller to reset the poll timer;
/// a changed threshold simply takes effect on the next evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigDelta {
    /// The threshold value was replaced.
    pub threshold_changed: bool,
    /// The polling period was replaced.
    pub polling_period_changed: bool,
}

/// Mutable monitor settings.
///
/// Mutated only through [`MonitorConfig::apply_update`]; both values are read
/// on every evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    threshold: u64,
    polling_period_secs: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            polling_period_secs: DEFAULT_POLLING_PERIOD_SECS,
        }
    }
}

impl MonitorConfig {
    /// Creates a configuration with explicit starting values.
    ///
    /// A zero polling period falls back to the default; the period must stay
    /// positive for the poll timer to be meaningful.
    pub fn new(threshold: u64, polling_period_secs: u32) -> Self {
        let polling_period_secs = if polling_period_secs == 0 {
            warn!(
                "Ignoring zero polling period, using default {}s",
                DEFAULT_POLLING_PERIOD_SECS
            );
            DEFAULT_POLLING_PERIOD_SECS
        } else {
            polling_period_secs
        };
        Self {
            threshold,
            polling_period_secs,
        }
    }

    /// Returns the maximum tolerated TX error delta per interval.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns the polling period in seconds.
    pub fn polling_period_secs(&self) -> u32 {
        self.polling_period_secs
    }

    /// Returns the polling period as a [`Duration`].
    pub fn polling_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.polling_period_secs))
    }

    /// Applies a batch of field/value pairs from a configuration update.
    ///
    /// Fields are processed independently: an unparseable value is logged
    /// and skipped without invalidating the other fields of the batch, and
    /// unrecognized field names are logged and ignored.
    pub fn apply_update(&mut self, fvs: &[FieldValue]) -> ConfigDelta {
        let mut delta = ConfigDelta::default();

        for (field, value) in fvs {
            match field.as_str() {
                fields::THRESHOLD => match value.parse::<u64>() {
                    Ok(threshold) => {
                        if self.set_threshold(threshold) {
                            delta.threshold_changed = true;
                        }
                    }
                    Err(_) => {
                        error!("Ignoring non-numeric threshold {:?}", value);
                    }
                },
                fields::POLLING_PERIOD => match value.parse::<u32>() {
                    Ok(0) => {
                        error!("Ignoring zero polling period");
                    }
                    Ok(period) => {
                        if self.set_polling_period(period) {
                            delta.polling_period_changed = true;
                        }
                    }
                    Err(_) => {
                        error!("Ignoring non-numeric polling period {:?}", value);
                    }
                },
                _ => {
                    warn!("Unknown configuration field {:?}", field);
                }
            }
        }

        delta
    }

    fn set_threshold(&mut self, threshold: u64) -> bool {
        if self.threshold == threshold {
            return false;
        }
        self.threshold = threshold;
        info!("Threshold is set to {}", self.threshold);
        true
    }

    fn set_polling_period(&mut self, period_secs: u32) -> bool {
        if self.polling_period_secs == period_secs {
            return false;
        }
        self.polling_period_secs = period_secs;
        info!("Polling period is set to {}s", self.polling_period_secs);
        true
    }
}
