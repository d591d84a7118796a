//! Table name constants for txmonitord.
//!
//! These match the schema definitions used by the rest of the SONiC stack.

/// CONFIG_DB table holding the monitor's own settings.
pub const CFG_TX_MONITOR_TABLE_NAME: &str = "TX_MONITOR";

/// Key within the TX_MONITOR table carrying the settings.
pub const TX_MONITOR_CONFIG_KEY: &str = "Config";

/// STATE_DB table receiving per-port TX error status.
pub const STATE_TX_ERRORS_TABLE_NAME: &str = "TX_ERRORS_STATUS";

/// COUNTERS_DB table holding per-port counters.
pub const COUNTERS_TABLE_NAME: &str = "COUNTERS";

/// COUNTERS_DB hash mapping port name to counter OID.
pub const COUNTERS_PORT_NAME_MAP: &str = "COUNTERS_PORT_NAME_MAP";

/// Counter polled for transmit errors.
pub const PORT_TX_ERR_COUNTER: &str = "SAI_PORT_STAT_IF_OUT_ERRORS";

/// Field names used in monitor tables.
pub mod fields {
    /// Status field in the TX errors status table.
    pub const STATUS: &str = "Status";

    /// Threshold field in configuration updates.
    pub const THRESHOLD: &str = "threshold";

    /// Polling period field in configuration updates.
    pub const POLLING_PERIOD: &str = "polling_period";

    /// Threshold field in the startup config-mirror record.
    pub const CFG_THRESHOLD: &str = "Threshold";

    /// Polling period field in the startup config-mirror record.
    pub const CFG_POLLING_PERIOD: &str = "Polling period";
}
