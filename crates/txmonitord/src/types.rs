//! Core types for the TX error monitor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-port TX error health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// TX error delta stayed within the threshold.
    Ok,
    /// TX error delta exceeded the threshold.
    NotOk,
}

impl TxStatus {
    /// Applies the threshold rule to an observed error-count delta.
    pub fn evaluate(delta: u64, threshold: u64) -> Self {
        if delta <= threshold {
            TxStatus::Ok
        } else {
            TxStatus::NotOk
        }
    }

    /// Returns true for [`TxStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, TxStatus::Ok)
    }

    /// Returns the status value written to the status table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Ok => "OK",
            TxStatus::NotOk => "Not OK",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type of switch port, as exposed by the port inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Physical front-panel port.
    Phy,
    /// Link Aggregation Group (LAG/Port-channel).
    Lag,
    /// VLAN interface (SVI).
    Vlan,
    /// Loopback port.
    Loopback,
    /// CPU port for control plane traffic.
    Cpu,
}

impl PortType {
    /// Returns true if this is a physical port type.
    ///
    /// Only physical ports are monitored for TX errors.
    pub const fn is_physical(&self) -> bool {
        matches!(self, PortType::Phy)
    }

    /// Classifies a port by its SONiC alias prefix.
    ///
    /// Returns `None` for aliases that follow none of the known naming
    /// conventions.
    pub fn from_alias(alias: &str) -> Option<Self> {
        if alias.starts_with("Ethernet") {
            Some(PortType::Phy)
        } else if alias.starts_with("PortChannel") {
            Some(PortType::Lag)
        } else if alias.starts_with("Vlan") {
            Some(PortType::Vlan)
        } else if alias.starts_with("Loopback") {
            Some(PortType::Loopback)
        } else if alias.starts_with("CPU") {
            Some(PortType::Cpu)
        } else {
            None
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortType::Phy => "phy",
            PortType::Lag => "lag",
            PortType::Vlan => "vlan",
            PortType::Loopback => "loopback",
            PortType::Cpu => "cpu",
        };
        write!(f, "{}", s)
    }
}

/// A port as reported by the port inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Serialized counter-table OID for the port.
    pub oid: String,
    /// Port kind.
    pub port_type: PortType,
}

impl PortInfo {
    /// Creates a new port description.
    pub fn new(oid: impl Into<String>, port_type: PortType) -> Self {
        Self {
            oid: oid.into(),
            port_type,
        }
    }
}

/// Monitoring state for one physical port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTxEntry {
    /// Serialized counter-table OID; stable for the process lifetime.
    pub oid: String,
    /// Last observed cumulative TX error count.
    pub tx_err_count: u64,
    /// Current health status.
    pub status: TxStatus,
}

impl PortTxEntry {
    /// Creates an entry with no observed errors and an OK status.
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            tx_err_count: 0,
            status: TxStatus::Ok,
        }
    }
}
