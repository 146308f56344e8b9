//! Domain model for management names and managed objects.

mod error;
mod managed;
mod object_name;

pub use error::ObjectNameError;
pub use managed::{ManagedEndpoint, ManagedObject, ManagedRecordProcessor};
pub use object_name::ObjectName;
