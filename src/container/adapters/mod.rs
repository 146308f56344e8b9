//! Reusable service implementations for the container.

mod value;

pub use value::ValueService;
