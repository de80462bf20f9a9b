/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Test suites: named methods over a fixture type.
//!
//! A [`Suite`] plays the role a test class plays in xUnit frameworks.
//! Methods whose names satisfy the suite's [`TestPredicate`] are
//! tests; the `setup` and `teardown` hooks and any other method are
//! not. Decorating a suite with an [`OverrideConfig`] wraps only its
//! tests, so hooks and helpers run with whatever configuration is
//! active when they are called.

use std::collections::HashSet;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::overrides::Decorate;
use crate::overrides::OverrideConfig;

/// Result type of suite methods.
pub type TestResult = anyhow::Result<()>;

type Method<S> = Arc<dyn Fn(&mut S) -> TestResult + Send + Sync>;

/// Decides which suite methods are tests.
#[derive(Clone)]
pub struct TestPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl TestPredicate {
    /// Methods whose names start with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::from_fn(move |name| name.starts_with(&prefix))
    }

    /// Exactly the given method names.
    pub fn names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::from_fn(move |name| names.contains(name))
    }

    pub fn from_fn(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

/// Test methods start with `test`.
impl Default for TestPredicate {
    fn default() -> Self {
        Self::prefix("test")
    }
}

impl fmt::Debug for TestPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TestPredicate(..)")
    }
}

/// A named table of methods over fixture type `S`.
pub struct Suite<S> {
    name: String,
    methods: Vec<(String, Method<S>)>,
    predicate: TestPredicate,
    setup: String,
    teardown: String,
}

impl<S: 'static> Suite<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            predicate: TestPredicate::default(),
            setup: "setup".to_string(),
            teardown: "teardown".to_string(),
        }
    }

    /// Add a method, replacing any existing method with the same name.
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut S) -> TestResult + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let f: Method<S> = Arc::new(f);
        match self.methods.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = f,
            None => self.methods.push((name, f)),
        }
        self
    }

    /// Use `predicate` to decide which methods are tests.
    pub fn test_predicate(mut self, predicate: TestPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Rename the lifecycle hooks run around each test by [`Suite::run`].
    pub fn hooks(mut self, setup: impl Into<String>, teardown: impl Into<String>) -> Self {
        self.setup = setup.into();
        self.teardown = teardown.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `name` is a test method. Hooks never are, whatever the
    /// predicate says.
    pub fn is_test(&self, name: &str) -> bool {
        is_test(&self.predicate, &self.setup, &self.teardown, name)
    }

    /// Names of the test methods, in the order they were added.
    pub fn test_names(&self) -> Vec<&str> {
        self.methods
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| self.is_test(name))
            .collect()
    }

    /// Call method `name` on `fixture`.
    pub fn call(&self, fixture: &mut S, name: &str) -> TestResult {
        let method = self
            .lookup(name)
            .ok_or_else(|| anyhow::anyhow!("suite {} has no method {}", self.name, name))?;
        method(fixture)
    }

    fn lookup(&self, name: &str) -> Option<&Method<S>> {
        self.methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, method)| method)
    }

    /// Run every test with a fresh fixture: setup, the test, then
    /// teardown, which runs even if the test fails or panics.
    pub fn run(&self, mut make_fixture: impl FnMut() -> S) -> SuiteReport {
        let mut results = Vec::new();
        for name in self.test_names() {
            let mut fixture = make_fixture();
            let outcome = self.run_one(&mut fixture, name);
            match &outcome {
                Outcome::Passed => tracing::info!("{}::{} passed", self.name, name),
                Outcome::Failed(reason) => {
                    tracing::warn!("{}::{} failed: {}", self.name, name, reason)
                }
                Outcome::Error(reason) => {
                    tracing::warn!("{}::{} errored: {}", self.name, name, reason)
                }
            }
            results.push((name.to_string(), outcome));
        }
        SuiteReport {
            suite: self.name.clone(),
            results,
        }
    }

    fn run_one(&self, fixture: &mut S, name: &str) -> Outcome {
        if let Err(reason) = self.run_hook(fixture, &self.setup) {
            return Outcome::Error(reason);
        }
        let test = catch(|| self.call(fixture, name));
        let teardown = self.run_hook(fixture, &self.teardown);
        match (test, teardown) {
            (Err(reason), _) => Outcome::Failed(reason),
            (Ok(()), Err(reason)) => Outcome::Error(reason),
            (Ok(()), Ok(())) => Outcome::Passed,
        }
    }

    fn run_hook(&self, fixture: &mut S, hook: &str) -> Result<(), String> {
        match self.lookup(hook) {
            Some(method) => catch(|| method(fixture)),
            None => Ok(()),
        }
    }
}

fn is_test(predicate: &TestPredicate, setup: &str, teardown: &str, name: &str) -> bool {
    name != setup && name != teardown && predicate.matches(name)
}

/// Run `f`, turning both errors and panics into a message.
fn catch(f: impl FnOnce() -> TestResult) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

impl<S: 'static> Decorate for Suite<S> {
    type Output = Suite<S>;

    /// Wrap each test method so that it runs inside `overrides`.
    /// Hooks and other methods are left as they are.
    fn decorate(mut self, overrides: &OverrideConfig) -> Suite<S> {
        for (name, method) in self.methods.iter_mut() {
            if !is_test(&self.predicate, &self.setup, &self.teardown, name) {
                continue;
            }
            let inner = method.clone();
            let overrides = overrides.clone();
            *method = Arc::new(move |fixture: &mut S| {
                let _guard = overrides.enter()?;
                inner(fixture)
            });
        }
        self
    }
}

impl<S> fmt::Debug for Suite<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field(
                "methods",
                &self.methods.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("setup", &self.setup)
            .field("teardown", &self.teardown)
            .finish()
    }
}

/// How a single test ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The test returned an error or panicked.
    Failed(String),
    /// A hook returned an error or panicked.
    Error(String),
}

/// Results of [`Suite::run`].
#[derive(Clone, Debug)]
pub struct SuiteReport {
    pub suite: String,
    pub results: Vec<(String, Outcome)>,
}

impl SuiteReport {
    pub fn outcome(&self, test: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|(name, _)| name == test)
            .map(|(_, outcome)| outcome)
    }

    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| *outcome == Outcome::Passed)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.passed() == self.results.len()
    }
}
