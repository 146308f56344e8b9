//! Service lifecycle and dependency-injection container.
//!
//! The container holds named services with declared dependencies, resolves
//! start order, fills typed injectors, and drives start/stop transitions on
//! tokio workers. It follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The service contract in [`ports`]
//! - Reusable services in [`adapters`]
//! - The registry in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
