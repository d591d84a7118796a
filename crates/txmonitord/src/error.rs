//! Error types for txmonitord.

use thiserror::Error;

/// Errors surfaced by the monitor's write paths.
///
/// Read-side failures (ports not ready, counter missing) are not errors:
/// they degrade to skip-and-retry-next-tick per the monitor's contract.
#[derive(Error, Debug)]
pub enum TxMonitorError {
    /// A write to an external table failed.
    #[error("table write failed for key {key}: {message}")]
    TableWrite { key: String, message: String },
}

impl TxMonitorError {
    /// Creates a table-write error.
    pub fn table_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        TxMonitorError::TableWrite {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for txmonitord operations.
pub type TxMonitorResult<T> = Result<T, TxMonitorError>;
