//! Lintel: service lifecycle and dependency-injection container.
//!
//! This crate hosts named services with declared dependencies, starts them
//! in dependency order, injects the values of running dependencies, and
//! stops dependents before the services they rely on. Web-service endpoints
//! are one kind of service built on top of it.
//!
//! # Architecture
//!
//! Lintel follows hexagonal architecture principles:
//!
//! - **Domain**: Names, descriptors, states, and endpoint models
//! - **Ports**: The service lifecycle contract and the management server
//! - **Adapters**: Value services and an in-memory management server
//!
//! # Modules
//!
//! - [`config`]: Layered registry configuration
//! - [`container`]: The service registry and its lifecycle engine
//! - [`management`]: Publishing objects to a management server
//! - [`webservices`]: Endpoint services installed into the registry

pub mod config;
pub mod container;
pub mod management;
pub mod webservices;
