//! survey-sync - Offline-first survey response sync engine
//!
//! This crate durably captures survey submissions while a field device is
//! offline and drains them to a remote service when connectivity permits.
//! The host application owns scheduling, rendering, and wiring; the crate
//! owns the queue, the per-response retry state machine, and the drain.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod sync;
