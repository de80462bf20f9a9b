/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Loading configuration values from the environment and from YAML.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::registry;
use crate::store::ConfigStore;
use crate::store::check_value;
use crate::value::Value;

/// Prefix of the environment variables consulted by [`from_env`].
pub const ENV_PREFIX: &str = "DYNCONFIG_";

/// The environment variable that overrides setting `name`.
pub fn env_var_name(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name)
}

/// Read `DYNCONFIG_<NAME>` for every registered setting.
///
/// Values that fail to parse as the setting's kind are logged and
/// skipped. Results are sorted by name.
pub fn from_env() -> Vec<(&'static str, Value)> {
    let mut values = Vec::new();

    for def in registry::iter() {
        let var = env_var_name(def.name);
        let Ok(raw) = std::env::var(&var) else {
            continue;
        };

        match Value::parse(def.kind(), &raw) {
            Err(e) => {
                tracing::error!(
                    "failed to read config key {} from value \"{}\" in ${}: {}",
                    def.name,
                    raw,
                    var,
                    e
                );
            }
            Ok(value) => {
                tracing::info!("loaded configuration from environment: {}={}", var, value);
                values.push((def.name, value));
            }
        }
    }

    values.sort_by_key(|(name, _)| *name);
    values
}

/// Load a YAML mapping of setting names to values.
///
/// Every name must be registered and every value must fit the
/// declared kind.
pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Value)>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let raw: BTreeMap<String, Value> = serde_yaml::from_str(&contents)?;
    raw.into_iter()
        .map(|(name, value)| {
            let (_, value) = check_value(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

/// Write the effective value of every registered setting in `store`
/// to a YAML file.
pub fn to_yaml<P: AsRef<Path>>(store: &dyn ConfigStore, path: P) -> Result<(), ConfigError> {
    let mut snapshot = BTreeMap::new();
    for def in registry::iter() {
        snapshot.insert(def.name, store.get(def.name)?);
    }
    fs::write(path, serde_yaml::to_string(&snapshot)?)?;
    Ok(())
}

/// Write `values` into `store`, stopping at the first error.
pub fn apply<I, K>(store: &dyn ConfigStore, values: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    for (name, value) in values {
        store.set(name.as_ref(), value)?;
    }
    Ok(())
}
