//! Web-service endpoint lifecycle on top of the service container.
//!
//! Each deployed endpoint is installed as a container service. It waits for
//! its security domain, attaches that domain's context while running, and
//! publishes itself and its record processors to the management server
//! when one is available.
//!
//! - Domain types in [`domain`]
//! - The endpoint service and its install helpers in [`services`]

pub mod domain;
pub mod services;
