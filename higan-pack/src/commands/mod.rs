//! Command implementations

pub mod package;
pub mod patch;
pub mod resolve;
