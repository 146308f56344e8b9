//! Domain model for the service container.
//!
//! Service names, descriptors, injection slots, and controller states live
//! here. Scheduling and hook execution remain outside this boundary.

mod descriptor;
mod error;
mod ids;
mod injector;
mod name;
mod state;

pub use descriptor::{Dependency, DependencyKind, ServiceDescriptor, ServiceMode};
pub use error::{ContainerDomainError, ParseServiceModeError};
pub use ids::ControllerId;
pub use injector::{
    InjectedValue, InjectionError, InjectionSlot, Injector, NotSetError, ServiceValue,
};
pub use name::ServiceName;
pub use state::{
    ControllerStatus, LifecycleEvent, LifecycleEventKind, ServiceState, StartFailure,
};
