//! Test-only utilities for safely mutating process-global state in tests.

/// RAII guard for temporarily setting an environment variable.
///
/// Restores the previous value (or removes the variable) on drop. Only use
/// from `#[serial(env)]` tests.
pub struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    /// Set `key` for the lifetime of the guard.
    ///
    /// # Safety
    ///
    /// `std::env::set_var` races with any concurrent access to the process
    /// environment. Safe when every caller runs under `#[serial(env)]`.
    #[must_use]
    pub fn set(key: &'static str, val: &str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: env-mutating tests are serialized with #[serial(env)].
        unsafe { std::env::set_var(key, val) };
        Self { key, prev }
    }

    /// Unset `key` for the lifetime of the guard.
    ///
    /// # Safety
    ///
    /// `std::env::remove_var` races with any concurrent access to the process
    /// environment. Safe when every caller runs under `#[serial(env)]`.
    #[must_use]
    pub fn remove(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: env-mutating tests are serialized with #[serial(env)].
        unsafe { std::env::remove_var(key) };
        Self { key, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            // SAFETY: the guard lives inside a #[serial(env)] test.
            Some(v) => unsafe { std::env::set_var(self.key, v) },
            // SAFETY: the guard lives inside a #[serial(env)] test.
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::EnvGuard;

    const KEY: &str = "SANCTUM_TEST_SUPPORT_GUARD";

    #[test]
    #[serial(env)]
    fn guards_restore_previous_state() {
        {
            let _outer = EnvGuard::set(KEY, "outer");
            {
                let _inner = EnvGuard::remove(KEY);
                assert!(std::env::var(KEY).is_err());
            }
            assert_eq!(std::env::var(KEY).as_deref(), Ok("outer"));
        }
        assert!(std::env::var(KEY).is_err());
    }
}
