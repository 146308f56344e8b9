//! Port contracts between the registry and hosted services.

mod service;

pub use service::{Service, StartContext, StartError, StopContext};
