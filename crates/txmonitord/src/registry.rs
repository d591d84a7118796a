//! Port registry and its deferred bootstrap.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::monitor::PortsProvider;
use crate::publisher::StatusPublisher;
use crate::types::{PortTxEntry, TxStatus};

/// Registry lifecycle state.
///
/// Readiness is an explicit flag rather than an "entries are empty" proxy so
/// that a legitimately empty physical port set stays unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// The port subsystem has not reported ready yet.
    Uninitialized,
    /// Enumeration completed; the entry set is final.
    Ready,
}

/// Mapping from port name to per-port monitoring state.
///
/// Built exactly once, on the first evaluation pass after the port subsystem
/// reports ready. Entries are neither added nor removed afterward; sorted
/// key order keeps evaluation passes deterministic.
#[derive(Debug)]
pub struct PortRegistry {
    state: RegistryState,
    entries: BTreeMap<String, PortTxEntry>,
}

impl PortRegistry {
    /// Creates an uninitialized registry.
    pub fn new() -> Self {
        Self {
            state: RegistryState::Uninitialized,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Returns true once enumeration completed.
    pub fn is_ready(&self) -> bool {
        self.state == RegistryState::Ready
    }

    /// Returns the number of monitored ports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no ports are monitored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for a port, if monitored.
    pub fn get(&self, port: &str) -> Option<&PortTxEntry> {
        self.entries.get(port)
    }

    /// Iterates entries mutably in port name order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&String, &mut PortTxEntry)> {
        self.entries.iter_mut()
    }

    /// Attempts the one-time registry bootstrap.
    ///
    /// Idempotent: a no-op returning `true` once ready, and a no-op returning
    /// `false` while the port subsystem is still coming up (the next tick
    /// retries). On the first ready tick, enumerates the inventory, keeps the
    /// physical ports, and publishes an initial OK status for each.
    pub async fn try_init(
        &mut self,
        ports: &dyn PortsProvider,
        publisher: &mut StatusPublisher,
    ) -> bool {
        if self.is_ready() {
            return true;
        }

        if !ports.all_ports_ready().await {
            debug!("Ports not ready yet");
            return false;
        }

        for (name, info) in ports.get_all_ports().await {
            if !info.port_type.is_physical() {
                continue;
            }

            self.entries.insert(name.clone(), PortTxEntry::new(info.oid));

            if let Err(e) = publisher.publish(&name, TxStatus::Ok).await {
                error!("Initial status write for {} failed: {}", name, e);
            }
        }

        self.state = RegistryState::Ready;
        info!("Port registry ready, monitoring {} ports", self.entries.len());
        true
    }
}

impl Default for PortRegistry {
    fn default() -> Self {
        Self::new()
    }
}
