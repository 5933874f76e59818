//! End-to-end scenarios

pub mod package;
pub mod round_trip;
pub mod thread_safety;
