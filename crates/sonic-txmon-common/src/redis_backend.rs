//! Redis database backend for the TX error monitor.
//!
//! This module provides Redis connection management and table access for the
//! monitor daemon: counter reads from COUNTERS_DB, status writes to STATE_DB,
//! and configuration-change event polling from CONFIG_DB.
//!
//! Change events are popped from a per-table list (`<TABLE>_EVENTS`), one
//! event per element, encoded as `key|SET|field=value|...` or `key|DEL`.

use crate::{FieldValue, KeyOpFieldsValues, Operation};
use log::{debug, info};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from Redis operations.
#[derive(Error, Debug)]
pub enum RedisBackendError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Invalid event format: {0}")]
    InvalidEvent(String),
}

/// Result type for Redis backend operations.
pub type Result<T> = std::result::Result<T, RedisBackendError>;

/// Redis database selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedisDb {
    /// COUNTERS_DB (database 2) - counter statistics
    CountersDb = 2,
    /// CONFIG_DB (database 4) - switch configuration
    ConfigDb = 4,
    /// STATE_DB (database 6) - hardware state and statistics
    StateDb = 6,
}

impl RedisDb {
    /// Returns the key separator used by tables in this database.
    ///
    /// COUNTERS_DB uses `:` (e.g. `COUNTERS:oid:0x1000000000001`), the
    /// configuration and state databases use `|`.
    pub fn separator(&self) -> char {
        match self {
            RedisDb::CountersDb => ':',
            RedisDb::ConfigDb | RedisDb::StateDb => '|',
        }
    }
}

/// Configuration for a Redis connection.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Database selector
    pub db: RedisDb,
}

impl RedisConfig {
    /// Creates a new Redis configuration.
    pub fn new(host: impl Into<String>, port: u16, db: RedisDb) -> Self {
        Self {
            host: host.into(),
            port,
            db,
        }
    }

    fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db as u8)
    }
}

/// A single table within a Redis database.
///
/// Entries are hashes keyed `<table><sep><key>`. An empty key addresses the
/// table name itself, which is how singleton hashes such as
/// `COUNTERS_PORT_NAME_MAP` are stored.
pub struct RedisTable {
    config: RedisConfig,
    table_name: String,
    connection: ConnectionManager,
}

impl RedisTable {
    /// Connects to Redis and binds to the given table.
    pub async fn new(config: RedisConfig, table_name: impl Into<String>) -> Result<Self> {
        let uri = config.uri();

        let client = redis::Client::open(uri.clone())
            .map_err(|e| RedisBackendError::ConnectionError(format!("{}: {}", uri, e)))?;

        let connection = client.get_connection_manager().await.map_err(|e| {
            RedisBackendError::ConnectionError(format!("Failed to create connection pool: {}", e))
        })?;

        let table_name = table_name.into();
        info!(
            "Connected to Redis {} (db={}) table {}",
            config.host, config.db as u8, table_name
        );

        Ok(Self {
            config,
            table_name,
            connection,
        })
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn redis_key(&self, key: &str) -> String {
        if key.is_empty() {
            self.table_name.clone()
        } else {
            format!("{}{}{}", self.table_name, self.config.db.separator(), key)
        }
    }

    /// Reads a single field of an entry.
    pub async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>> {
        let redis_key = self.redis_key(key);
        self.connection
            .hget(&redis_key, field)
            .await
            .map_err(|e| RedisBackendError::CommandError(format!("HGET {} failed: {}", redis_key, e)))
    }

    /// Reads all fields of an entry.
    pub async fn hgetall(&mut self, key: &str) -> Result<Vec<FieldValue>> {
        let redis_key = self.redis_key(key);
        let fvs: HashMap<String, String> = self.connection.hgetall(&redis_key).await.map_err(|e| {
            RedisBackendError::CommandError(format!("HGETALL {} failed: {}", redis_key, e))
        })?;

        Ok(fvs.into_iter().collect())
    }

    /// Writes fields of an entry.
    pub async fn set(&mut self, key: &str, fvs: &[FieldValue]) -> Result<()> {
        if fvs.is_empty() {
            return Ok(());
        }
        let redis_key = self.redis_key(key);
        let _: () = self
            .connection
            .hset_multiple(&redis_key, fvs)
            .await
            .map_err(|e| RedisBackendError::CommandError(format!("HSET {} failed: {}", redis_key, e)))?;

        Ok(())
    }

    /// Polls change events for this table.
    ///
    /// Blocks up to `timeout_secs` for the first event, then keeps draining
    /// without blocking until `batch_size` events were read or the queue is
    /// empty. Undecodable events are counted against the batch and skipped.
    pub async fn poll_events(
        &mut self,
        batch_size: usize,
        timeout_secs: f64,
    ) -> Result<Vec<KeyOpFieldsValues>> {
        let queue_key = format!("{}_EVENTS", self.table_name);
        let mut entries = Vec::new();

        for _ in 0..batch_size {
            let timeout = if entries.is_empty() { timeout_secs } else { 0.001 };
            let popped: Option<(String, String)> = self
                .connection
                .blpop(&queue_key, timeout)
                .await
                .map_err(|e| RedisBackendError::CommandError(format!("BLPOP failed: {}", e)))?;

            match popped {
                Some((_list, raw)) => match parse_event(&raw) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => debug!("Dropping undecodable event on {}: {}", queue_key, e),
                },
                None => break,
            }
        }

        if !entries.is_empty() {
            debug!("Polled {} events from {}", entries.len(), queue_key);
        }
        Ok(entries)
    }
}

/// Parses a change event of the form `key|SET|field=value|...` or `key|DEL`.
fn parse_event(raw: &str) -> Result<KeyOpFieldsValues> {
    let mut parts = raw.split('|');

    let key = parts
        .next()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RedisBackendError::InvalidEvent("missing key".to_string()))?;

    let op = match parts.next() {
        Some("SET") => Operation::Set,
        Some("DEL") => Operation::Del,
        other => {
            return Err(RedisBackendError::InvalidEvent(format!(
                "unknown operation {:?} in {:?}",
                other, raw
            )))
        }
    };

    let mut fvs = Vec::new();
    for part in parts {
        let (field, value) = part.split_once('=').ok_or_else(|| {
            RedisBackendError::InvalidEvent(format!("malformed field {:?} in {:?}", part, raw))
        })?;
        fvs.push((field.to_string(), value.to_string()));
    }

    Ok(KeyOpFieldsValues::new(key, op, fvs))
}
