/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dynamically typed configuration values.
//!
//! A store holds [`Value`]s; typed access goes through the
//! [`ConfigValue`] conversions so that `global::get(BOOL_VALUE)`
//! yields a `bool` while backends only ever see `Value`.
//!
//! Durations are rendered and parsed with `humantime` ("30s", "1m"),
//! both in environment variables and in YAML files.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// A single configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Duration(Duration),
}

/// The kind of a [`Value`], used for type checking writes against
/// the declared default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Duration,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::Duration => "duration",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Duration(_) => ValueKind::Duration,
        }
    }

    /// Parse a textual representation of a value of the given kind.
    ///
    /// Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`
    /// (case-insensitive); durations use humantime syntax.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Value, anyhow::Error> {
        let trimmed = raw.trim();
        Ok(match kind {
            ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Value::Bool(true),
                "0" | "false" | "no" | "off" => Value::Bool(false),
                other => anyhow::bail!("not a boolean: {}", other),
            },
            ValueKind::Int => Value::Int(trimmed.parse()?),
            ValueKind::Float => Value::Float(trimmed.parse()?),
            ValueKind::Str => Value::Str(raw.to_string()),
            ValueKind::Duration => Value::Duration(humantime::parse_duration(trimmed)?),
        })
    }

    /// Convert this value into one of `kind`, if the conversion is
    /// lossless: identical kinds, integers widened to floats, and
    /// humantime strings read as durations.
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        match (self, kind) {
            (value, kind) if value.kind() == kind => Some(value),
            (Value::Int(i), ValueKind::Float) => Some(Value::Float(i as f64)),
            (Value::Str(s), ValueKind::Duration) => {
                humantime::parse_duration(&s).ok().map(Value::Duration)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Duration(d) => {
                serializer.serialize_str(&humantime::format_duration(*d).to_string())
            }
        }
    }
}

// Durations arrive as strings; `coerce` turns them into
// `Value::Duration` once the target kind is known.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Bool(b) => Value::Bool(b),
            RawValue::Int(i) => Value::Int(i),
            RawValue::Float(x) => Value::Float(x),
            RawValue::Str(s) => Value::Str(s),
        })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

/// Rust types that can be stored as configuration values.
pub trait ConfigValue: Sized + Clone + Send + Sync + 'static {
    /// The kind every value of this type converts to.
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    /// Returns `None` if `value` is of a different kind or out of
    /// range for `Self`.
    fn from_value(value: Value) -> Option<Self>;
}

impl ConfigValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ConfigValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value.coerce(ValueKind::Float)? {
            Value::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl ConfigValue for String {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl ConfigValue for Duration {
    const KIND: ValueKind = ValueKind::Duration;

    fn into_value(self) -> Value {
        Value::Duration(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value.coerce(ValueKind::Duration)? {
            Value::Duration(d) => Some(d),
            _ => None,
        }
    }
}

macro_rules! int_config_value {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                const KIND: ValueKind = ValueKind::Int;

                // Values beyond i64::MAX saturate.
                fn into_value(self) -> Value {
                    Value::Int(i64::try_from(self).unwrap_or(i64::MAX))
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_config_value!(i64, i32, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_spellings() {
        for raw in ["1", "true", "YES", " on "] {
            assert_eq!(Value::parse(ValueKind::Bool, raw).unwrap(), Value::Bool(true));
        }
        for raw in ["0", "False", "no", "off"] {
            assert_eq!(Value::parse(ValueKind::Bool, raw).unwrap(), Value::Bool(false));
        }
        assert!(Value::parse(ValueKind::Bool, "maybe").is_err());
    }

    #[test]
    fn test_parse_duration_and_numbers() {
        assert_eq!(
            Value::parse(ValueKind::Duration, "1m 30s").unwrap(),
            Value::Duration(Duration::from_secs(90))
        );
        assert_eq!(Value::parse(ValueKind::Int, "-7").unwrap(), Value::Int(-7));
        assert_eq!(Value::parse(ValueKind::Float, "2.5").unwrap(), Value::Float(2.5));
        assert!(Value::parse(ValueKind::Int, "2.5").is_err());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Int(3).coerce(ValueKind::Float), Some(Value::Float(3.0)));
        assert_eq!(
            Value::from("5s").coerce(ValueKind::Duration),
            Some(Value::Duration(Duration::from_secs(5)))
        );
        assert_eq!(Value::Float(3.0).coerce(ValueKind::Int), None);
        assert_eq!(Value::Bool(true).coerce(ValueKind::Str), None);
    }

    #[test]
    fn test_config_value_ranges() {
        assert_eq!(u32::from_value(Value::Int(-1)), None);
        assert_eq!(i32::from_value(Value::Int(42)), Some(42));
        assert_eq!(u64::MAX.into_value(), Value::Int(i64::MAX));
        assert_eq!(bool::from_value(Value::Int(1)), None);
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(Value::Duration(Duration::from_secs(60)).to_string(), "1m");
        let json = serde_json::to_string(&Value::Duration(Duration::from_millis(1500))).unwrap();
        assert_eq!(json, "\"1s 500ms\"");
        let back: Value = serde_json::from_str("false").unwrap();
        assert_eq!(back, Value::Bool(false));
        let back: Value = serde_json::from_str("12").unwrap();
        assert_eq!(back, Value::Int(12));
    }
}
