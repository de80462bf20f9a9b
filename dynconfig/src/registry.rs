/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Registry of declared configuration settings.
//!
//! Settings are declared with [`declare_config!`], which defines a
//! typed [`Key`] constant and registers a [`ConfigDef`] (name,
//! default, help text) at link time through `inventory`. Stores use
//! the registry to reject unknown keys and mistyped writes, and the
//! loaders use it to know which environment variables to read.
//!
//! ```
//! use dynconfig::declare_config;
//! use dynconfig::registry;
//!
//! declare_config! {
//!     /// Whether the new checkout flow is enabled.
//!     pub CHECKOUT_V2: bool = false;
//! }
//!
//! let def = registry::lookup("CHECKOUT_V2").unwrap();
//! assert_eq!(def.default_value(), dynconfig::Value::Bool(false));
//! assert_eq!(CHECKOUT_V2.name(), "CHECKOUT_V2");
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::value::ConfigValue;
use crate::value::Value;
use crate::value::ValueKind;

/// A declared configuration setting.
///
/// This needs to be public for [`declare_config!`] to construct it
/// from other crates.
pub struct ConfigDef {
    /// Name of the setting, as used by stores and overrides.
    pub name: &'static str,
    /// Help text, taken from the doc comment on the declaration.
    pub help: &'static str,
    /// Produces the default value.
    pub default: fn() -> Value,
}

inventory::collect!(ConfigDef);

impl ConfigDef {
    pub fn default_value(&self) -> Value {
        (self.default)()
    }

    /// The kind of the setting, as given by its default.
    pub fn kind(&self) -> ValueKind {
        self.default_value().kind()
    }
}

impl fmt::Debug for ConfigDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDef")
            .field("name", &self.name)
            .field("default", &self.default_value())
            .finish()
    }
}

/// Look up a registered setting by name. If the same name was
/// declared more than once, the first registration found wins.
pub fn lookup(name: &str) -> Option<&'static ConfigDef> {
    inventory::iter::<ConfigDef>
        .into_iter()
        .find(|def| def.name == name)
}

/// Iterate over all registered settings, in no particular order.
pub fn iter() -> impl Iterator<Item = &'static ConfigDef> {
    inventory::iter::<ConfigDef>.into_iter()
}

/// A typed handle to a declared setting.
pub struct Key<T> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ConfigValue> Key<T> {
    /// The registry entry for this key.
    pub fn def(&self) -> Option<&'static ConfigDef> {
        lookup(self.name)
    }

    /// The declared default, converted to `T`.
    pub fn default_value(&self) -> Option<T> {
        self.def().and_then(|def| T::from_value(def.default_value()))
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Declares configuration settings.
///
/// # Syntax
///
/// ```ignore
/// declare_config! {
///     /// Help text for the setting.
///     pub NAME: Type = default_value;
/// }
/// ```
///
/// Each entry defines `const NAME: Key<Type>` and registers the
/// setting under the name `"NAME"`. `Type` must implement
/// [`ConfigValue`].
#[macro_export]
macro_rules! declare_config {
    ($(
        $(#[doc = $doc:literal])*
        $vis:vis $name:ident: $type:ty = $default:expr;
    )*) => {
        $(
            $(#[doc = $doc])*
            $vis const $name: $crate::Key<$type> = $crate::Key::new(stringify!($name));

            $crate::inventory::submit! {
                $crate::registry::ConfigDef {
                    name: stringify!($name),
                    help: concat!($($doc, "\n",)* ""),
                    default: || <$type as $crate::ConfigValue>::into_value($default),
                }
            }
        )*
    };
}

pub use declare_config;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    declare_config! {
        /// A registry test flag.
        pub REGISTRY_TEST_FLAG: bool = true;

        pub REGISTRY_TEST_TIMEOUT: Duration = Duration::from_secs(30);

        /// Greeting used by the registry tests.
        pub REGISTRY_TEST_GREETING: String = "hello".to_string();
    }

    #[test]
    fn test_declared_keys_are_registered() {
        let def = lookup("REGISTRY_TEST_FLAG").unwrap();
        assert_eq!(def.kind(), ValueKind::Bool);
        assert_eq!(def.default_value(), Value::Bool(true));
        assert!(def.help.contains("A registry test flag."));

        let timeout = lookup(REGISTRY_TEST_TIMEOUT.name()).unwrap();
        assert_eq!(timeout.kind(), ValueKind::Duration);
        assert_eq!(timeout.help, "");
    }

    #[test]
    fn test_typed_default() {
        assert_eq!(REGISTRY_TEST_FLAG.default_value(), Some(true));
        assert_eq!(
            REGISTRY_TEST_GREETING.default_value(),
            Some("hello".to_string())
        );
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("REGISTRY_TEST_DOES_NOT_EXIST").is_none());
        assert!(iter().any(|def| def.name == "REGISTRY_TEST_GREETING"));
    }
}
