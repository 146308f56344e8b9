//! Registration policies built on the management server port.

mod fallback;

pub use fallback::{ManagementRegistrationError, register_with_fallback};
