//! Port contracts for management servers.

mod server;

pub use server::{ManagementError, ManagementResult, ManagementServer, SharedManagementServer};
