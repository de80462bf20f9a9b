/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use crate::value::ValueKind;

/// Errors raised by configuration stores and the loaders that feed
/// them.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The key was never declared with `declare_config!`.
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// The value does not match the kind of the declared setting.
    #[error("type mismatch for {key}: expected {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A textual value (environment, YAML) could not be parsed.
    #[error("failed to parse {key} from {raw:?}: {source}")]
    Parse {
        key: String,
        raw: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// A failure inside a store backend.
    #[error("backend: {0}")]
    Backend(#[source] anyhow::Error),
}

impl ConfigError {
    /// The configuration key this error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::UnknownKey(key)
            | ConfigError::TypeMismatch { key, .. }
            | ConfigError::Parse { key, .. } => Some(key),
            ConfigError::Io(_) | ConfigError::Yaml(_) | ConfigError::Backend(_) => None,
        }
    }
}
