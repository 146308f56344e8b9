//! Registry services: registration, resolution, and lifecycle workers.

mod builder;
mod error;
mod handle;
mod registry;
mod table;

pub use builder::ServiceBuilder;
pub use error::{ContainerError, ContainerResult};
pub use handle::ControllerHandle;
pub use registry::ServiceRegistry;
