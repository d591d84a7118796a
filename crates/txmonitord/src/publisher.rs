//! Status publication to the external status store.

use async_trait::async_trait;
use sonic_txmon_common::FieldValue;
use tracing::debug;

use crate::error::TxMonitorResult;
use crate::tables::fields;
use crate::types::TxStatus;

/// Write access to one external table.
///
/// Implemented over Redis for production and by capturing fakes in tests.
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Writes fields of the entry at `key`.
    async fn set(&mut self, key: &str, fvs: &[FieldValue]) -> TxMonitorResult<()>;
}

/// Write path for per-port TX error status records.
///
/// The publisher itself is unconditional; change suppression (publish only on
/// an actual status transition) is enforced by the evaluation pass, which is
/// the only caller.
pub struct StatusPublisher {
    table: Box<dyn TableWriter>,
}

impl StatusPublisher {
    /// Creates a publisher over the given status table.
    pub fn new(table: Box<dyn TableWriter>) -> Self {
        Self { table }
    }

    /// Writes the status record for one port.
    pub async fn publish(&mut self, port: &str, status: TxStatus) -> TxMonitorResult<()> {
        debug!("Publishing TX error status {} for {}", status, port);
        let fvs = [(fields::STATUS.to_string(), status.as_str().to_string())];
        self.table.set(port, &fvs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CapturingTable {
        writes: Arc<Mutex<Vec<(String, Vec<FieldValue>)>>>,
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

    #[tokio::test]
    async fn test_publish_writes_status_field() {
        let table = CapturingTable::default();
        let writes = Arc::clone(&table.writes);
        let mut publisher = StatusPublisher::new(Box::new(table));

        publisher.publish("Ethernet0", TxStatus::NotOk).await.unwrap();
        publisher.publish("Ethernet4", TxStatus::Ok).await.unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, "Ethernet0");
        assert_eq!(
            writes[0].1,
            vec![("Status".to_string(), "Not OK".to_string())]
        );
        assert_eq!(writes[1].0, "Ethernet4");
        assert_eq!(writes[1].1, vec![("Status".to_string(), "OK".to_string())]);
    }
}
