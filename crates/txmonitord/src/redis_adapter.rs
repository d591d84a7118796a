//! Redis-backed implementations of the monitor's external interfaces.
//!
//! Counter reads come from COUNTERS_DB, the port inventory is derived from
//! `COUNTERS_PORT_NAME_MAP`, status records go to STATE_DB, and the
//! config-mirror record goes back to CONFIG_DB.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use sonic_txmon_common::redis_backend::{
    RedisBackendError, RedisConfig, RedisDb, RedisTable,
};
use sonic_txmon_common::{FieldValue, KeyOpFieldsValues};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{TxMonitorError, TxMonitorResult};
use crate::monitor::{CounterSource, PortsProvider};
use crate::publisher::TableWriter;
use crate::tables::{COUNTERS_PORT_NAME_MAP, COUNTERS_TABLE_NAME};
use crate::types::{PortInfo, PortType};

/// Events fetched per poll round.
const CONFIG_EVENT_BATCH: usize = 32;

/// Blocking timeout of one poll round in seconds.
const CONFIG_POLL_TIMEOUT_SECS: f64 = 1.0;

/// Counter reads from the COUNTERS table.
pub struct RedisCounterSource {
    table: Mutex<RedisTable>,
}

impl RedisCounterSource {
    /// Connects to COUNTERS_DB.
    pub async fn connect(host: &str, port: u16) -> Result<Self, RedisBackendError> {
        let table = RedisTable::new(
            RedisConfig::new(host, port, RedisDb::CountersDb),
            COUNTERS_TABLE_NAME,
        )
        .await?;
        Ok(Self {
            table: Mutex::new(table),
        })
    }
}

#[async_trait]
impl CounterSource for RedisCounterSource {
    async fn get_counter(&self, oid: &str, counter: &str) -> Option<u64> {
        let mut table = self.table.lock().await;
        match table.hget(oid, counter).await {
            Ok(Some(raw)) => match raw.parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Counter {} for {} is not numeric: {:?}", counter, oid, raw);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Counter read for {} failed: {}", oid, e);
                None
            }
        }
    }
}

/// Port inventory derived from the counters port name map.
///
/// The map appears once the counter infrastructure finished publishing OIDs
/// for every enumerated port, which is the readiness signal this daemon
/// waits for.
pub struct RedisPortsProvider {
    name_map: Mutex<RedisTable>,
}

impl RedisPortsProvider {
    /// Connects to COUNTERS_DB.
    pub async fn connect(host: &str, port: u16) -> Result<Self, RedisBackendError> {
        let name_map = RedisTable::new(
            RedisConfig::new(host, port, RedisDb::CountersDb),
            COUNTERS_PORT_NAME_MAP,
        )
        .await?;
        Ok(Self {
            name_map: Mutex::new(name_map),
        })
    }

    async fn read_name_map(&self) -> Vec<FieldValue> {
        let mut name_map = self.name_map.lock().await;
        match name_map.hgetall("").await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Port name map read failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PortsProvider for RedisPortsProvider {
    async fn all_ports_ready(&self) -> bool {
        !self.read_name_map().await.is_empty()
    }

    async fn get_all_ports(&self) -> BTreeMap<String, PortInfo> {
        let mut ports = BTreeMap::new();

        for (name, oid) in self.read_name_map().await {
            match PortType::from_alias(&name) {
                Some(port_type) => {
                    ports.insert(name, PortInfo::new(oid, port_type));
                }
                None => {
                    warn!("Skipping port {:?} with unrecognized alias", name);
                }
            }
        }

        ports
    }
}

/// Table writer over a Redis table.
pub struct RedisTableWriter {
    table: RedisTable,
}

impl RedisTableWriter {
    /// Connects to the given database and table.
    pub async fn connect(
        host: &str,
        port: u16,
        db: RedisDb,
        table_name: &str,
    ) -> Result<Self, RedisBackendError> {
        let table = RedisTable::new(RedisConfig::new(host, port, db), table_name).await?;
        Ok(Self { table })
    }
}

#[async_trait]
impl TableWriter for RedisTableWriter {
    async fn set(&mut self, key: &str, fvs: &[FieldValue]) -> TxMonitorResult<()> {
        self.table
            .set(key, fvs)
            .await
            .map_err(|e| TxMonitorError::table_write(key, e.to_string()))
    }
}

/// Forwards configuration-change events from Redis into the daemon channel.
///
/// Poll failures are logged and retried after a short pause; the task ends
/// when the daemon side of the channel is dropped.
pub fn spawn_config_poller(
    mut table: RedisTable,
    tx: mpsc::Sender<Vec<KeyOpFieldsValues>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match table
                .poll_events(CONFIG_EVENT_BATCH, CONFIG_POLL_TIMEOUT_SECS)
                .await
            {
                Ok(events) => {
                    if events.is_empty() {
                        continue;
                    }
                    debug!("Forwarding {} configuration events", events.len());
                    if tx.send(events).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Configuration event poll failed: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    })
}
