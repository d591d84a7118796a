//! Queue of configuration-change notifications with per-key deduplication.

use std::collections::{BTreeMap, VecDeque};

/// Operation type carried by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Set operation (add or update)
    Set,
    /// Delete operation
    Del,
}

impl Operation {
    /// Returns true if this is a Set operation.
    pub fn is_set(&self) -> bool {
        matches!(self, Operation::Set)
    }

    /// Returns true if this is a Del operation.
    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }
}

/// A field-value pair from a table entry.
pub type FieldValue = (String, String);

/// Key, operation, and field-values tuple from a change notification.
#[derive(Debug, Clone)]
pub struct KeyOpFieldsValues {
    /// The key (e.g., "Config")
    pub key: String,
    /// The operation (Set or Del)
    pub op: Operation,
    /// Field-value pairs (empty for Del operations)
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, op: Operation, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op,
            fvs,
        }
    }

    /// Creates a Set entry.
    pub fn set(key: impl Into<String>, fvs: Vec<FieldValue>) -> Self {
        Self::new(key, Operation::Set, fvs)
    }

    /// Creates a Del entry.
    pub fn del(key: impl Into<String>) -> Self {
        Self::new(key, Operation::Del, vec![])
    }

    /// Returns the value for a field, if present.
    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// Consumer of change notifications for a single table.
///
/// Notifications are queued per key until the daemon dispatches them. When
/// several notifications arrive for the same key before a dispatch, they are
/// merged the way the swss consumer tables merge them:
///
/// - consecutive SETs merge field-wise, newer values overriding older ones
/// - a DEL supersedes any pending SETs for the key
/// - a SET after a DEL is kept separately to preserve ordering
#[derive(Debug, Default)]
pub struct Consumer {
    table_name: String,
    to_sync: BTreeMap<String, VecDeque<KeyOpFieldsValues>>,
    pending: usize,
}

impl Consumer {
    /// Creates a consumer for the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            to_sync: BTreeMap::new(),
            pending: 0,
        }
    }

    /// Returns the table name this consumer listens on.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns true if there are queued notifications.
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Returns the number of queued notifications.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Queues a batch of notifications, merging per key.
    pub fn add_to_sync(&mut self, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            self.add_entry(entry);
        }
    }

    fn add_entry(&mut self, entry: KeyOpFieldsValues) {
        let queue = self.to_sync.entry(entry.key.clone()).or_default();

        match entry.op {
            Operation::Del => {
                self.pending -= queue.len();
                queue.clear();
                queue.push_back(entry);
                self.pending += 1;
            }
            Operation::Set => {
                if let Some(last) = queue.back_mut() {
                    if last.op == Operation::Set {
                        for (field, value) in entry.fvs {
                            match last.fvs.iter_mut().find(|(f, _)| *f == field) {
                                Some(existing) => existing.1 = value,
                                None => last.fvs.push((field, value)),
                            }
                        }
                        return;
                    }
                }
                queue.push_back(entry);
                self.pending += 1;
            }
        }
    }

    /// Drains all queued notifications in key order.
    pub fn drain(&mut self) -> Vec<KeyOpFieldsValues> {
        let mut result = Vec::with_capacity(self.pending);
        for (_key, mut queue) in std::mem::take(&mut self.to_sync) {
            while let Some(entry) = queue.pop_front() {
                result.push(entry);
            }
        }
        self.pending = 0;
        result
    }
}
