/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dynamic, typed configuration settings.
//!
//! This crate provides:
//! - `declare_config!`: declares typed [`Key`]s with defaults and help
//!   text, registered at link time.
//! - [`ConfigStore`]: the get/set seam over a configuration backend,
//!   with the in-process [`MemoryStore`].
//! - [`global`]: the process-wide store, seeded from
//!   `DYNCONFIG_<NAME>` environment variables.
//! - [`load`]: environment and YAML loaders.
//!
//! Scoped test overrides of these settings live in the
//! `dynconfig_test` crate.

pub mod error;
pub mod global;
pub mod load;
pub mod registry;
pub mod store;
pub mod value;

pub use error::ConfigError;
// Re-exported for use by `declare_config!`.
#[doc(hidden)]
pub use inventory;
pub use registry::ConfigDef;
pub use registry::Key;
pub use store::ConfigStore;
pub use store::MemoryStore;
pub use value::ConfigValue;
pub use value::Value;
pub use value::ValueKind;
