//! TX error monitor daemon for SONiC.
//!
//! This crate implements the `txmonitord` daemon, which polls per-port
//! transmit-error counters and publishes a binary health status per physical
//! port.
//!
//! # Responsibilities
//!
//! - Build the monitored port registry once the port subsystem is ready
//! - Poll TX error counters on a configurable period and compare the
//!   per-interval delta against a configurable threshold
//! - Write "OK" / "Not OK" status records, only on actual transitions
//! - Apply live configuration updates (threshold, polling period) without
//!   restart
//!
//! # Tables
//!
//! | Database | Table | Purpose |
//! |----------|-------|---------|
//! | CONFIG_DB | TX_MONITOR | Monitor settings (threshold, polling period) |
//! | COUNTERS_DB | COUNTERS | TX error counter source |
//! | COUNTERS_DB | COUNTERS_PORT_NAME_MAP | Port inventory and readiness |
//! | STATE_DB | TX_ERRORS_STATUS | Published per-port status |
//!
//! # Known gap
//!
//! The delta computation assumes monotonic non-decreasing counters. A port or
//! ASIC reset that restarts a counter below its previous value is observed as
//! a zero delta for that interval; dedicated reset detection is not
//! implemented.

pub mod config;
pub mod daemon;
pub mod error;
pub mod monitor;
pub mod publisher;
pub mod registry;
pub mod tables;
pub mod types;

#[cfg(feature = "redis")]
pub mod redis_adapter;

pub use config::{ConfigDelta, MonitorConfig, DEFAULT_POLLING_PERIOD_SECS, DEFAULT_THRESHOLD};
pub use daemon::MonitorDaemon;
pub use error::{TxMonitorError, TxMonitorResult};
pub use monitor::{CounterSource, PortsProvider, TxMonitor, TxMonitorStats};
pub use publisher::{StatusPublisher, TableWriter};
pub use registry::{PortRegistry, RegistryState};
pub use types::{PortInfo, PortTxEntry, PortType, TxStatus};
