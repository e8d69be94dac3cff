//! Domain model and shared helpers for Poollog, a pool-water tracker.

pub mod chemistry;
pub mod readings;
pub mod sync;
