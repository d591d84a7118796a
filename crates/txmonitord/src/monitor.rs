//! TxMonitor - the TX error monitoring loop.
//!
//! This is the Rust implementation of the TX error monitor orchestration
//! logic. It handles:
//! - Deferred port registry bootstrap (ports may come up after the daemon)
//! - Periodic delta-based sampling of per-port TX error counters
//! - Threshold evaluation and change-suppressed status publication
//! - Live configuration updates (threshold, polling period)

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sonic_txmon_common::KeyOpFieldsValues;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigDelta, MonitorConfig};
use crate::error::TxMonitorResult;
use crate::publisher::{StatusPublisher, TableWriter};
use crate::registry::PortRegistry;
use crate::tables::{fields, PORT_TX_ERR_COUNTER, TX_MONITOR_CONFIG_KEY};
use crate::types::{PortInfo, TxStatus};

/// Read access to cumulative counters.
#[async_trait]
pub trait CounterSource: Send + Sync {
    /// Returns the current cumulative value of `counter` for the port with
    /// the given OID, or `None` if the counter is not present.
    async fn get_counter(&self, oid: &str, counter: &str) -> Option<u64>;
}

/// Read access to the port inventory.
#[async_trait]
pub trait PortsProvider: Send + Sync {
    /// Returns true once the port subsystem finished enumerating ports.
    async fn all_ports_ready(&self) -> bool;

    /// Returns all known ports by name.
    async fn get_all_ports(&self) -> BTreeMap<String, PortInfo>;
}

/// Monitor statistics.
#[derive(Debug, Clone, Default)]
pub struct TxMonitorStats {
    /// Timer fires received.
    pub ticks: u64,
    /// Completed evaluation passes.
    pub passes: u64,
    /// Ticks skipped because the port subsystem was not ready.
    pub skipped_ticks: u64,
    /// Status transitions published.
    pub publishes: u64,
    /// Counter reads that fell back to the previous value.
    pub counter_misses: u64,
    /// Configuration update batches applied.
    pub config_updates: u64,
    /// Configuration events dropped (unexpected key or operation).
    pub dropped_events: u64,
}

/// The TX error monitor.
///
/// Owns the port registry and configuration state exclusively; constructed
/// once at process start and driven by the daemon event loop, so every
/// evaluation pass and configuration update is strictly serialized.
pub struct TxMonitor {
    config: MonitorConfig,
    registry: PortRegistry,
    publisher: StatusPublisher,
    cfg_table: Box<dyn TableWriter>,
    counters: Arc<dyn CounterSource>,
    ports: Arc<dyn PortsProvider>,
    stats: TxMonitorStats,
}

impl TxMonitor {
    /// Creates a monitor over the given external interfaces.
    pub fn new(
        config: MonitorConfig,
        counters: Arc<dyn CounterSource>,
        ports: Arc<dyn PortsProvider>,
        status_table: Box<dyn TableWriter>,
        cfg_table: Box<dyn TableWriter>,
    ) -> Self {
        Self {
            config,
            registry: PortRegistry::new(),
            publisher: StatusPublisher::new(status_table),
            cfg_table,
            counters,
            ports,
            stats: TxMonitorStats::default(),
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the port registry.
    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    /// Returns the monitor statistics.
    pub fn stats(&self) -> &TxMonitorStats {
        &self.stats
    }

    /// Writes the startup config-mirror record with the active settings.
    ///
    /// One-time initialization side effect; the monitor never reads this
    /// table back.
    pub async fn init_cfg_table(&mut self) -> TxMonitorResult<()> {
        let fvs = [
            (
                fields::CFG_THRESHOLD.to_string(),
                self.config.threshold().to_string(),
            ),
            (
                fields::CFG_POLLING_PERIOD.to_string(),
                self.config.polling_period_secs().to_string(),
            ),
        ];
        self.cfg_table.set(TX_MONITOR_CONFIG_KEY, &fvs).await?;

        info!(
            "Configuration initialised with threshold {} and polling period {}s",
            self.config.threshold(),
            self.config.polling_period_secs()
        );
        Ok(())
    }

    /// Handles one poll timer fire.
    ///
    /// Bootstraps the registry if needed; while the port subsystem is not
    /// ready the tick is skipped without error (expected at startup).
    pub async fn on_tick(&mut self) {
        self.stats.ticks += 1;

        if !self.registry.is_ready() {
            let Self {
                registry,
                ports,
                publisher,
                ..
            } = self;
            if !registry.try_init(ports.as_ref(), publisher).await {
                self.stats.skipped_ticks += 1;
                return;
            }
        }

        self.check_tx_errors().await;
        self.stats.passes += 1;
    }

    /// Handles one configuration-change event.
    ///
    /// Only a `Set` on the monitor's own `Config` key is accepted; anything
    /// else is logged and dropped. The returned delta tells the caller
    /// whether the poll timer must be rescheduled.
    pub async fn on_config_event(&mut self, event: KeyOpFieldsValues) -> ConfigDelta {
        if event.key != TX_MONITOR_CONFIG_KEY || !event.op.is_set() {
            warn!(
                "Dropping unexpected configuration event: key {:?} op {:?}",
                event.key, event.op
            );
            self.stats.dropped_events += 1;
            return ConfigDelta::default();
        }

        self.stats.config_updates += 1;
        self.config.apply_update(&event.fvs)
    }

    /// Runs one evaluation pass over the registry.
    ///
    /// Each entry's counter is read once; a missing counter yields a zero
    /// observed delta instead of failing the pass. The last-seen count is
    /// updated unconditionally, the status only through the threshold rule,
    /// and a publish happens only on an actual transition.
    async fn check_tx_errors(&mut self) {
        debug!("Polling TX error counters");

        let threshold = self.config.threshold();
        let Self {
            registry,
            counters,
            publisher,
            stats,
            ..
        } = self;

        for (name, entry) in registry.entries_mut() {
            let prev_count = entry.tx_err_count;
            let new_count = match counters.get_counter(&entry.oid, PORT_TX_ERR_COUNTER).await {
                Some(count) => count,
                None => {
                    stats.counter_misses += 1;
                    prev_count
                }
            };

            // Counters are assumed monotonic non-decreasing; a port or ASIC
            // reset can violate this, and reset detection is a known gap.
            // saturating_sub keeps such a tick at delta 0 instead of u64 wrap.
            let delta = new_count.saturating_sub(prev_count);
            let new_status = TxStatus::evaluate(delta, threshold);

            if new_status != entry.status {
                info!("TX error status for {} changed to {}", name, new_status);
                entry.status = new_status;
                match publisher.publish(name, new_status).await {
                    Ok(()) => stats.publishes += 1,
                    Err(e) => error!("Status write for {} failed: {}", name, e),
                }
            }

            entry.tx_err_count = new_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_THRESHOLD;
    use crate::types::PortType;
    use pretty_assertions::assert_eq;
    use sonic_txmon_common::{FieldValue, Operation};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct TestCounters {
        counters: Mutex<BTreeMap<String, u64>>,
    }

    impl TestCounters {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                counters: Mutex::new(BTreeMap::new()),
            })
        }

        fn set(&self, oid: &str, value: u64) {
            self.counters.lock().unwrap().insert(oid.to_string(), value);
        }

        fn remove(&self, oid: &str) {
            self.counters.lock().unwrap().remove(oid);
        }
    }

    #[async_trait]
    impl CounterSource for TestCounters {
        async fn get_counter(&self, oid: &str, _counter: &str) -> Option<u64> {
            self.counters.lock().unwrap().get(oid).copied()
        }
    }

    struct TestPorts {
        ready: AtomicBool,
        ports: BTreeMap<String, PortInfo>,
    }

    impl TestPorts {
        fn new(ready: bool, ports: &[(&str, &str, PortType)]) -> Arc<Self> {
            Arc::new(Self {
                ready: AtomicBool::new(ready),
                ports: ports
                    .iter()
                    .map(|(name, oid, kind)| {
                        (name.to_string(), PortInfo::new(*oid, *kind))
                    })
                    .collect(),
            })
        }

        fn set_ready(&self) {
            self.ready.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl PortsProvider for TestPorts {
        async fn all_ports_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn get_all_ports(&self) -> BTreeMap<String, PortInfo> {
            self.ports.clone()
        }
    }

    type Writes = Arc<Mutex<Vec<(String, Vec<FieldValue>)>>>;

    #[derive(Default)]
    struct CapturingTable {
        writes: Writes,
    }

    #[async_trait]
    impl TableWriter for CapturingTable {
        async fn set(&mut self, key: &str, fvs: &[FieldValue]) -> TxMonitorResult<()> {
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), fvs.to_vec()));
            Ok(())
        }
    }

    struct Harness {
        monitor: TxMonitor,
        counters: Arc<TestCounters>,
        ports: Arc<TestPorts>,
        status_writes: Writes,
        cfg_writes: Writes,
    }

    fn harness(ready: bool, ports: &[(&str, &str, PortType)]) -> Harness {
        let counters = TestCounters::new();
        let ports = TestPorts::new(ready, ports);
        let status_table = CapturingTable::default();
        let status_writes = Arc::clone(&status_table.writes);
        let cfg_table = CapturingTable::default();
        let cfg_writes = Arc::clone(&cfg_table.writes);

        let monitor = TxMonitor::new(
            MonitorConfig::default(),
            Arc::clone(&counters) as Arc<dyn CounterSource>,
            Arc::clone(&ports) as Arc<dyn PortsProvider>,
            Box::new(status_table),
            Box::new(cfg_table),
        );

        Harness {
            monitor,
            counters,
            ports,
            status_writes,
            cfg_writes,
        }
    }

    fn single_port() -> Vec<(&'static str, &'static str, PortType)> {
        vec![("Ethernet0", "oid:0x1", PortType::Phy)]
    }

    fn status_of(writes: &Writes, index: usize) -> (String, String) {
        let writes = writes.lock().unwrap();
        let (key, fvs) = &writes[index];
        (key.clone(), fvs[0].1.clone())
    }

    #[tokio::test]
    async fn test_tick_skipped_until_ports_ready() {
        let mut h = harness(false, &single_port());

        h.monitor.on_tick().await;
        h.monitor.on_tick().await;

        assert_eq!(h.monitor.stats().ticks, 2);
        assert_eq!(h.monitor.stats().skipped_ticks, 2);
        assert_eq!(h.monitor.stats().passes, 0);
        assert!(h.status_writes.lock().unwrap().is_empty());

        h.ports.set_ready();
        h.monitor.on_tick().await;

        assert!(h.monitor.registry().is_ready());
        assert_eq!(h.monitor.stats().passes, 1);
        // Exactly one initial OK write for the port.
        assert_eq!(status_of(&h.status_writes, 0), ("Ethernet0".into(), "OK".into()));
    }

    #[tokio::test]
    async fn test_zero_delta_never_republishes() {
        let mut h = harness(true, &single_port());
        // First pass sees delta 5 (under threshold), later passes delta 0.
        h.counters.set("oid:0x1", 5);

        for _ in 0..4 {
            h.monitor.on_tick().await;
        }

        // Only the bootstrap write; steady state is suppressed.
        assert_eq!(h.status_writes.lock().unwrap().len(), 1);
        assert_eq!(h.monitor.stats().publishes, 0);
        assert_eq!(h.monitor.registry().get("Ethernet0").unwrap().status, TxStatus::Ok);
    }

    #[tokio::test]
    async fn test_threshold_crossing_cycle() {
        let mut h = harness(true, &single_port());

        // Bootstrap pass: count 100, delta 100 > 10 flips to Not OK already,
        // so seed before the first tick to establish a baseline.
        h.counters.set("oid:0x1", 100);
        h.monitor.on_tick().await;
        assert_eq!(h.monitor.registry().get("Ethernet0").unwrap().status, TxStatus::NotOk);

        // Recover: zero delta.
        h.monitor.on_tick().await;
        assert_eq!(h.monitor.registry().get("Ethernet0").unwrap().status, TxStatus::Ok);

        // 100 -> 115: delta 15 > 10, one Not OK publish.
        h.counters.set("oid:0x1", 115);
        h.monitor.on_tick().await;
        let entry = h.monitor.registry().get("Ethernet0").unwrap();
        assert_eq!(entry.status, TxStatus::NotOk);
        assert_eq!(entry.tx_err_count, 115);

        // 115 -> 118: delta 3 <= 10, one OK publish.
        h.counters.set("oid:0x1", 118);
        h.monitor.on_tick().await;
        let entry = h.monitor.registry().get("Ethernet0").unwrap();
        assert_eq!(entry.status, TxStatus::Ok);
        assert_eq!(entry.tx_err_count, 118);

        // bootstrap OK, Not OK, OK, Not OK, OK
        let writes = h.status_writes.lock().unwrap();
        let statuses: Vec<&str> = writes.iter().map(|(_, fvs)| fvs[0].1.as_str()).collect();
        assert_eq!(statuses, vec!["OK", "Not OK", "OK", "Not OK", "OK"]);
    }

    #[tokio::test]
    async fn test_sustained_high_delta_publishes_once() {
        let mut h = harness(true, &single_port());
        h.monitor.on_tick().await; // bootstrap, count stays 0

        h.counters.set("oid:0x1", 50);
        h.monitor.on_tick().await; // delta 50: Not OK published

        h.counters.set("oid:0x1", 100);
        h.monitor.on_tick().await; // delta 50: still Not OK, suppressed
        h.counters.set("oid:0x1", 150);
        h.monitor.on_tick().await; // delta 50: still Not OK, suppressed

        assert_eq!(h.monitor.stats().publishes, 1);

        h.monitor.on_tick().await; // delta 0: back to OK
        assert_eq!(h.monitor.stats().publishes, 2);
    }

    #[tokio::test]
    async fn test_missing_counter_is_a_zero_delta() {
        let mut h = harness(true, &single_port());
        h.counters.set("oid:0x1", 100);
        h.monitor.on_tick().await; // bootstrap: Not OK (delta 100)
        h.monitor.on_tick().await; // back to OK

        h.counters.remove("oid:0x1");
        h.monitor.on_tick().await;

        let entry = h.monitor.registry().get("Ethernet0").unwrap();
        assert_eq!(entry.status, TxStatus::Ok);
        assert_eq!(entry.tx_err_count, 100);
        assert_eq!(h.monitor.stats().counter_misses, 1);
    }

    #[tokio::test]
    async fn test_one_bad_port_does_not_abort_the_pass() {
        let mut h = harness(
            true,
            &[
                ("Ethernet0", "oid:0x1", PortType::Phy),
                ("Ethernet4", "oid:0x2", PortType::Phy),
            ],
        );
        h.monitor.on_tick().await; // bootstrap

        // Ethernet0 has no counter; Ethernet4 spikes.
        h.counters.set("oid:0x2", 500);
        h.monitor.on_tick().await;

        assert_eq!(h.monitor.registry().get("Ethernet0").unwrap().status, TxStatus::Ok);
        assert_eq!(h.monitor.registry().get("Ethernet4").unwrap().status, TxStatus::NotOk);
    }

    #[tokio::test]
    async fn test_counter_reset_does_not_flap() {
        let mut h = harness(true, &single_port());
        h.monitor.on_tick().await; // bootstrap

        h.counters.set("oid:0x1", 1000);
        h.monitor.on_tick().await; // Not OK
        h.monitor.on_tick().await; // OK again

        // ASIC reset: counter restarts below the previous value.
        h.counters.set("oid:0x1", 3);
        h.monitor.on_tick().await;

        let entry = h.monitor.registry().get("Ethernet0").unwrap();
        assert_eq!(entry.status, TxStatus::Ok);
        assert_eq!(entry.tx_err_count, 3);
    }

    #[tokio::test]
    async fn test_config_event_updates_threshold() {
        let mut h = harness(true, &single_port());
        h.monitor.on_tick().await; // bootstrap

        let delta = h
            .monitor
            .on_config_event(KeyOpFieldsValues::set(
                "Config",
                vec![("threshold".to_string(), "100".to_string())],
            ))
            .await;

        assert!(delta.threshold_changed);
        assert!(!delta.polling_period_changed);
        assert_eq!(h.monitor.config().threshold(), 100);

        // Delta 50 is now under threshold: no transition.
        h.counters.set("oid:0x1", 50);
        h.monitor.on_tick().await;
        assert_eq!(h.monitor.registry().get("Ethernet0").unwrap().status, TxStatus::Ok);
    }

    #[tokio::test]
    async fn test_unexpected_events_are_dropped() {
        let mut h = harness(true, &single_port());

        let delta = h
            .monitor
            .on_config_event(KeyOpFieldsValues::set(
                "SomeOtherKey",
                vec![("threshold".to_string(), "100".to_string())],
            ))
            .await;
        assert_eq!(delta, ConfigDelta::default());

        let delta = h
            .monitor
            .on_config_event(KeyOpFieldsValues::new("Config", Operation::Del, vec![]))
            .await;
        assert_eq!(delta, ConfigDelta::default());

        assert_eq!(h.monitor.stats().dropped_events, 2);
        assert_eq!(h.monitor.stats().config_updates, 0);
        assert_eq!(h.monitor.config().threshold(), DEFAULT_THRESHOLD);
    }

    #[tokio::test]
    async fn test_init_cfg_table_mirrors_defaults() {
        let mut h = harness(false, &single_port());

        h.monitor.init_cfg_table().await.unwrap();

        let writes = h.cfg_writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let (key, fvs) = &writes[0];
        assert_eq!(key, "Config");
        assert_eq!(
            fvs,
            &vec![
                ("Threshold".to_string(), "10".to_string()),
                ("Polling period".to_string(), "30".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_registry_iteration_is_sorted() {
        let mut h = harness(
            true,
            &[
                ("Ethernet8", "oid:0x3", PortType::Phy),
                ("Ethernet0", "oid:0x1", PortType::Phy),
                ("Ethernet4", "oid:0x2", PortType::Phy),
            ],
        );
        h.monitor.on_tick().await;

        let writes = h.status_writes.lock().unwrap();
        let keys: Vec<&str> = writes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Ethernet0", "Ethernet4", "Ethernet8"]);
    }
}
