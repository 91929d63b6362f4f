//! Scoped `SQLAGENT_*` environment overrides for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use sqlagent::config::ENV_PREFIX;

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Guard that sets engine overrides and restores the previous values on drop.
pub struct EngineEnvGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EngineEnvGuard {
    /// Applies overrides keyed by field suffix, e.g. `("MAX_WORKERS", Some("3"))`.
    ///
    /// `None` clears the variable for the guard lifetime.
    pub fn apply(overrides: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = overrides
            .iter()
            .map(|(suffix, value)| {
                let key = OsString::from(format!("{ENV_PREFIX}{suffix}"));
                let saved = env::var_os(&key);
                write_var(&key, value.map(OsString::from).as_ref());
                (key, saved)
            })
            .collect();

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EngineEnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            write_var(&key, value.as_ref());
        }
    }
}

fn write_var(key: &OsString, value: Option<&OsString>) {
    unsafe {
        // SAFETY: the global mutex serializes environment mutations in tests.
        match value {
            Some(new_value) => env::set_var(key, new_value),
            None => env::remove_var(key),
        }
    }
}
