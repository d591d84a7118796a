//! Daemon event loop.
//!
//! Drives the monitor from two event sources: poll timer fires and inbound
//! configuration-change notifications. Events are dispatched to completion
//! one at a time, so evaluation passes and configuration updates are strictly
//! serialized and an update is never observed half-applied mid-pass.

use sonic_txmon_common::{Consumer, KeyOpFieldsValues, PollTimer};
use tokio::sync::mpsc;
use tracing::info;

use crate::monitor::TxMonitor;
use crate::tables::CFG_TX_MONITOR_TABLE_NAME;

/// Event loop around a [`TxMonitor`].
pub struct MonitorDaemon {
    monitor: TxMonitor,
    timer: PollTimer,
    consumer: Consumer,
    events_rx: mpsc::Receiver<Vec<KeyOpFieldsValues>>,
}

impl MonitorDaemon {
    /// Creates the daemon; the poll timer is armed with the monitor's
    /// configured period.
    pub fn new(monitor: TxMonitor, events_rx: mpsc::Receiver<Vec<KeyOpFieldsValues>>) -> Self {
        let timer = PollTimer::new(monitor.config().polling_period());
        Self {
            monitor,
            timer,
            consumer: Consumer::new(CFG_TX_MONITOR_TABLE_NAME),
            events_rx,
        }
    }

    /// Returns the monitor.
    pub fn monitor(&self) -> &TxMonitor {
        &self.monitor
    }

    /// Runs the event loop until the configuration event channel closes.
    ///
    /// In production the channel never closes and the loop runs for the
    /// process lifetime.
    pub async fn run(&mut self) {
        info!(
            "Starting TX monitor event loop, polling period {}s",
            self.monitor.config().polling_period_secs()
        );

        loop {
            tokio::select! {
                _ = self.timer.tick() => {
                    self.monitor.on_tick().await;
                }
                batch = self.events_rx.recv() => match batch {
                    Some(entries) => {
                        self.consumer.add_to_sync(entries);
                        self.drain_config_events().await;
                    }
                    None => {
                        info!("Configuration event channel closed, stopping event loop");
                        break;
                    }
                },
            }
        }
    }

    /// Dispatches all queued configuration events.
    ///
    /// A changed polling period resets the timer immediately: the next tick
    /// fires one full new period from now, not on the old cadence.
    async fn drain_config_events(&mut self) {
        for event in self.consumer.drain() {
            let delta = self.monitor.on_config_event(event).await;
            if delta.polling_period_changed {
                self.timer.set_interval(self.monitor.config().polling_period());
            }
        }
    }
}
