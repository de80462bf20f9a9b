/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Test utilities for `dynconfig` settings.
//!
//! Temporarily override configuration values for the duration of a
//! test and restore them afterwards, however the test exits:
//!
//! - `#[override_config(NAME = value, ...)]` on a test function, or on
//!   an `impl` block to wrap only its `test*` methods;
//! - [`OverrideConfig::scope`] for an inline scoped block;
//! - [`OverrideConfig::enter`] for an explicit [`OverrideGuard`];
//! - [`OverrideConfig::decorate`] for callables and [`Suite`]s built
//!   at runtime.
//!
//! ```ignore
//! use dynconfig_test::override_config;
//!
//! #[test]
//! #[override_config(BOOL_VALUE = false)]
//! fn test_feature_disabled() {
//!     assert!(!dynconfig::global::get(BOOL_VALUE).unwrap());
//! }
//! ```

pub mod overrides;
pub mod suite;

pub use dynconfig_macros::override_config;
pub use overrides::Decorate;
pub use overrides::Decorated;
pub use overrides::OverrideConfig;
pub use overrides::OverrideGuard;
pub use overrides::TestFn;
pub use suite::Outcome;
pub use suite::Suite;
pub use suite::SuiteReport;
pub use suite::TestPredicate;
pub use suite::TestResult;

// Used by code generated by `#[override_config]`.
#[doc(hidden)]
pub mod __private {
    pub use dynconfig::global::lock;
}
