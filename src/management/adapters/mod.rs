//! Management server adapters.

mod memory;

pub use memory::InMemoryManagementServer;
