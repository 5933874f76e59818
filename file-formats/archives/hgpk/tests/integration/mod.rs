//! Integration tests across loader, registry and resolver

pub mod registry;
pub mod resolver;
pub mod security;
