//! Typed injection slots filled by the registry before a service starts.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Type-erased value published by a running service.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Contents of an [`Injector`].
#[derive(Debug)]
pub enum InjectedValue<T> {
    /// Nothing has been injected, or the slot was cleared.
    Unset,
    /// The resolved dependency value.
    Value(Arc<T>),
}

impl<T> InjectedValue<T> {
    /// Returns whether a value is present.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Converts into an optional shared value.
    #[must_use]
    pub fn into_option(self) -> Option<Arc<T>> {
        match self {
            Self::Unset => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl<T> Clone for InjectedValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Unset => Self::Unset,
            Self::Value(value) => Self::Value(Arc::clone(value)),
        }
    }
}

impl<T> Default for InjectedValue<T> {
    fn default() -> Self {
        Self::Unset
    }
}

/// Error returned when reading an injector that holds no value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("injected value of type {type_name} is not set")]
pub struct NotSetError {
    /// Rust type name of the slot.
    pub type_name: &'static str,
}

/// Errors raised while the registry fills a slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InjectionError {
    /// The dependency published a value of a different type.
    #[error("cannot inject value into slot of type {expected}")]
    TypeMismatch {
        /// Rust type name the slot expects.
        expected: &'static str,
    },
}

/// Registry-facing view of an injector with its type erased.
pub trait InjectionSlot: Send + Sync {
    /// Stores `value` after checking its type.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::TypeMismatch`] when `value` is not of the
    /// slot's type.
    fn inject(&self, value: ServiceValue) -> Result<(), InjectionError>;

    /// Resets the slot to unset.
    fn clear(&self);

    /// Rust type name of the values this slot accepts.
    fn expected_type(&self) -> &'static str;
}

/// Mutable, shareable slot that receives one dependency value.
///
/// The service keeps one clone and hands another to the registry through
/// [`Injector::slot`]. Reads are valid between the start and the end of the
/// stop of the owning service.
pub struct Injector<T> {
    cell: Arc<RwLock<InjectedValue<T>>>,
}

impl<T> Injector<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an unset injector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(RwLock::new(InjectedValue::Unset)),
        }
    }

    /// Stores a value, replacing any previous one.
    pub fn set(&self, value: Arc<T>) {
        *self.cell.write().unwrap_or_else(PoisonError::into_inner) = InjectedValue::Value(value);
    }

    /// Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`NotSetError`] when the slot is unset.
    pub fn get(&self) -> Result<Arc<T>, NotSetError> {
        self.snapshot().into_option().ok_or(NotSetError {
            type_name: type_name::<T>(),
        })
    }

    /// Returns the stored value if present.
    #[must_use]
    pub fn get_optional(&self) -> Option<Arc<T>> {
        self.snapshot().into_option()
    }

    /// Resets the slot to unset.
    pub fn clear(&self) {
        *self.cell.write().unwrap_or_else(PoisonError::into_inner) = InjectedValue::Unset;
    }

    /// Returns whether a value is present.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.cell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_set()
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> InjectedValue<T> {
        self.cell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the type-erased handle the registry writes through.
    #[must_use]
    pub fn slot(&self) -> Arc<dyn InjectionSlot> {
        Arc::new(self.clone())
    }
}

impl<T> Clone for Injector<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Default for Injector<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Injector<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Injector")
            .field("type", &type_name::<T>())
            .field("set", &self.is_set())
            .finish()
    }
}

impl<T> InjectionSlot for Injector<T>
where
    T: Send + Sync + 'static,
{
    fn inject(&self, value: ServiceValue) -> Result<(), InjectionError> {
        let typed = value
            .downcast::<T>()
            .map_err(|_| InjectionError::TypeMismatch {
                expected: type_name::<T>(),
            })?;
        self.set(typed);
        Ok(())
    }

    fn clear(&self) {
        Self::clear(self);
    }

    fn expected_type(&self) -> &'static str {
        type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_injector_is_unset() {
        let injector: Injector<String> = Injector::new();

        assert!(!injector.is_set());
        assert_eq!(
            injector.get(),
            Err(NotSetError {
                type_name: type_name::<String>()
            })
        );
        assert!(matches!(injector.snapshot(), InjectedValue::Unset));
    }

    #[test]
    fn slot_writes_are_visible_through_clones() {
        let injector: Injector<String> = Injector::new();
        let slot = injector.slot();

        let value: ServiceValue = Arc::new("secured".to_owned());
        slot.inject(value).expect("matching type should inject");

        assert_eq!(
            injector.get().expect("value should be set").as_str(),
            "secured"
        );

        slot.clear();
        assert!(!injector.is_set());
    }

    #[test]
    fn inject_rejects_mismatched_type() {
        let injector: Injector<String> = Injector::new();
        let value: ServiceValue = Arc::new(42_u32);

        let result = injector.slot().inject(value);

        assert_eq!(
            result,
            Err(InjectionError::TypeMismatch {
                expected: type_name::<String>()
            })
        );
        assert!(!injector.is_set());
    }
}
