/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Scoped configuration overrides.
//!
//! An [`OverrideConfig`] is a set of `name -> value` pairs. Entering
//! it ([`OverrideConfig::enter`]) saves the current value of each key
//! and writes the override; the returned [`OverrideGuard`] writes the
//! saved values back when it drops, including while unwinding from a
//! panic. Every other form is an adapter over that pair:
//!
//! - [`OverrideConfig::scope`] / [`OverrideConfig::try_scope`] run a
//!   closure inside the override;
//! - [`OverrideConfig::wrap`] turns a callable into one that enters
//!   the override on every call;
//! - [`OverrideConfig::decorate`] dispatches on the target: a single
//!   callable ([`TestFn`]) or a whole [`Suite`](crate::Suite), where
//!   only test methods are wrapped.
//!
//! Guards nest: each one restores exactly what it saw on entry, so an
//! inner override of a key restores the outer override's value, and
//! only the outermost guard restores the original.
//!
//! ```
//! use dynconfig::declare_config;
//! use dynconfig::global;
//! use dynconfig_test::OverrideConfig;
//!
//! declare_config! {
//!     pub FEATURE_ENABLED: bool = true;
//! }
//!
//! let _lock = global::lock();
//! OverrideConfig::new()
//!     .with(FEATURE_ENABLED, false)
//!     .scope(|| assert!(!global::get(FEATURE_ENABLED).unwrap()))
//!     .unwrap();
//! assert!(global::get(FEATURE_ENABLED).unwrap());
//! ```

use std::fmt;
use std::sync::Arc;

use dynconfig::ConfigError;
use dynconfig::ConfigStore;
use dynconfig::ConfigValue;
use dynconfig::Key;
use dynconfig::Value;
use dynconfig::global;

/// A set of temporary configuration values.
///
/// Building the request never touches the store; unknown keys and
/// mistyped values are reported by the store when the override is
/// entered.
#[derive(Clone, Default)]
pub struct OverrideConfig {
    values: Vec<(String, Value)>,
    store: Option<Arc<dyn ConfigStore>>,
}

impl OverrideConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `name` with `value`. Setting the same name again
    /// replaces the earlier value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Override a declared key.
    pub fn with<T: ConfigValue>(self, key: Key<T>, value: T) -> Self {
        self.set(key.name(), value.into_value())
    }

    /// Apply the override to `store` instead of the global store.
    pub fn on_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The requested overrides, in the order they were added.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn target_store(&self) -> Arc<dyn ConfigStore> {
        self.store.clone().unwrap_or_else(global::store)
    }

    /// Save the current value of every key, then write the overrides.
    ///
    /// If reading a key fails nothing has been written. If writing a
    /// key fails, the keys already written are restored before the
    /// error is returned.
    pub fn enter(&self) -> Result<OverrideGuard, ConfigError> {
        let store = self.target_store();

        let mut saved = Vec::with_capacity(self.values.len());
        for (name, _) in &self.values {
            saved.push(store.get(name)?);
        }

        let mut guard = OverrideGuard {
            store,
            snapshot: Vec::with_capacity(self.values.len()),
        };
        for ((name, value), prior) in self.values.iter().zip(saved) {
            guard.store.set(name, value.clone())?;
            guard.snapshot.push((name.clone(), prior));
        }

        tracing::debug!(keys = ?guard.keys().collect::<Vec<_>>(), "entered config override");
        Ok(guard)
    }

    /// Run `f` with the override applied.
    ///
    /// Restore failures after `f` returns are logged; use
    /// [`OverrideConfig::enter`] and [`OverrideGuard::restore`] to
    /// observe them.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> Result<R, ConfigError> {
        let _guard = self.enter()?;
        Ok(f())
    }

    /// Run a fallible `f` with the override applied. Store errors at
    /// entry are converted into `E`; errors from `f` pass through.
    pub fn try_scope<R, E>(&self, f: impl FnOnce() -> Result<R, E>) -> Result<R, E>
    where
        E: From<ConfigError>,
    {
        let _guard = self.enter()?;
        f()
    }

    /// Wrap `f` so that every call runs with the override applied.
    pub fn wrap<F>(&self, f: F) -> Decorated<F> {
        Decorated {
            overrides: self.clone(),
            f,
        }
    }

    /// Apply the override to a callable or a suite.
    pub fn decorate<T: Decorate>(&self, target: T) -> T::Output {
        target.decorate(self)
    }
}

impl fmt::Debug for OverrideConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideConfig")
            .field("values", &self.values)
            .field("custom_store", &self.store.is_some())
            .finish()
    }
}

/// An active override. Dropping it restores the saved values.
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct OverrideGuard {
    store: Arc<dyn ConfigStore>,
    snapshot: Vec<(String, Value)>,
}

impl OverrideGuard {
    /// The keys this guard will restore.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.snapshot.iter().map(|(name, _)| name.as_str())
    }

    /// Restore the saved values now, returning the first store error.
    /// Every key is attempted even if an earlier one fails.
    pub fn restore(mut self) -> Result<(), ConfigError> {
        self.restore_all()
    }

    fn restore_all(&mut self) -> Result<(), ConfigError> {
        if self.snapshot.is_empty() {
            return Ok(());
        }
        let mut first_err = None;
        let mut restored = Vec::with_capacity(self.snapshot.len());
        // Reverse order of application.
        while let Some((name, prior)) = self.snapshot.pop() {
            match self.store.set(&name, prior) {
                Ok(()) => restored.push(name),
                Err(e) => {
                    tracing::error!("failed to restore config key {}: {}", name, e);
                    first_err.get_or_insert(e);
                }
            }
        }
        tracing::debug!(keys = ?restored, "exited config override");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        let _ = self.restore_all();
    }
}

impl fmt::Debug for OverrideGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideGuard")
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

/// A callable wrapped by [`OverrideConfig::wrap`].
pub struct Decorated<F> {
    overrides: OverrideConfig,
    f: F,
}

impl<F> Decorated<F> {
    pub fn overrides(&self) -> &OverrideConfig {
        &self.overrides
    }

    pub fn call<R>(&self) -> Result<R, ConfigError>
    where
        F: Fn() -> R,
    {
        self.overrides.scope(&self.f)
    }

    pub fn call_mut<R>(&mut self) -> Result<R, ConfigError>
    where
        F: FnMut() -> R,
    {
        let _guard = self.overrides.enter()?;
        Ok((self.f)())
    }

    pub fn call_with<A, R>(&self, arg: A) -> Result<R, ConfigError>
    where
        F: Fn(A) -> R,
    {
        let _guard = self.overrides.enter()?;
        Ok((self.f)(arg))
    }

    /// Unwrap the original callable.
    pub fn into_inner(self) -> F {
        self.f
    }
}

/// Targets that [`OverrideConfig::decorate`] accepts.
pub trait Decorate {
    type Output;

    fn decorate(self, overrides: &OverrideConfig) -> Self::Output;
}

/// Marks a single callable as a decoration target.
pub struct TestFn<F>(pub F);

impl<F> Decorate for TestFn<F> {
    type Output = Decorated<F>;

    fn decorate(self, overrides: &OverrideConfig) -> Decorated<F> {
        overrides.wrap(self.0)
    }
}
