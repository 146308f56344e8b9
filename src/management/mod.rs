//! Management bridge for exposing running objects to an operator console.
//!
//! Objects are published under `domain:key=value` names. The service
//! container has no knowledge of this module; service hooks register and
//! unregister their management views here. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - The server contract in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Registration policies in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
