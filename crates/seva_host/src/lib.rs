//! Host-backed implementations of the core's [`seva_core::store::SlotStore`]
//! primitive, for deployments where the host persistent store is the
//! filesystem or an embedded SQLite database.

pub mod file;
pub mod sqlite;
