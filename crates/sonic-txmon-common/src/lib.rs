//! Common plumbing for the SONiC TX error monitor.
//!
//! This crate provides the pieces of the monitor daemon that are not specific
//! to TX error semantics:
//!
//! - [`Consumer`]: queue of configuration-change notifications with
//!   per-key deduplication
//! - [`PollTimer`]: periodic tick source that can be retargeted at runtime
//! - [`redis_backend`]: Redis table access (behind the `redis` feature)
//!
//! # Architecture
//!
//! The monitor follows the event-driven model used across the SONiC control
//! plane:
//!
//! 1. Configuration changes are written to CONFIG_DB
//! 2. The daemon receives them as [`KeyOpFieldsValues`] batches and queues
//!    them through a [`Consumer`]
//! 3. A [`PollTimer`] drives the periodic evaluation pass
//! 4. Status is written back to STATE_DB

mod consumer;
mod timer;

#[cfg(feature = "redis")]
pub mod redis_backend;

pub use consumer::{Consumer, FieldValue, KeyOpFieldsValues, Operation};
pub use timer::{PollTimer, TimerState};
