//! Scoped environment overrides for configuration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Holds the process environment lock and restores overridden variables on
/// drop.
pub struct EnvVarGuard {
    restore: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `overrides`, removing a variable when its value is `None`.
    pub fn apply(overrides: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let restore = overrides
            .iter()
            .map(|(key, value)| {
                let previous = env::var_os(key);
                write_var(key, value.map(OsString::from));
                ((*key).to_owned(), previous)
            })
            .collect();

        Self {
            restore,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, previous) in self.restore.drain(..) {
            write_var(&key, previous);
        }
    }
}

fn write_var(key: &str, value: Option<OsString>) {
    unsafe {
        // SAFETY: ENV_MUTEX serializes environment mutation across tests.
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
