//! Scenario and property tests for the pool, run against the plain
//! (non-loom) atomics. See `tests/loom.rs` for the model-checked races.

mod fixtures;

mod acquire_release;
mod eviction;
mod shutdown;
