// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sample::SampleIdentity;
use crate::{Error, Result};

/// Defining fields of a functional pulse, as written to a store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseDescriptor {
    pub uid: String,
    /// Name of the pulse function, e.g. `gaussian`.
    pub function: String,
    /// Length in seconds.
    pub length: f64,
    pub amplitude: f64,
    pub can_compress: bool,
    pub pulse_parameters: Option<IndexMap<String, Value>>,
}

/// An in-memory value without a JSON representation.
///
/// Such values can be kept in a store, but any attempt to persist the store
/// fails with [`Error::NoSerializerDefined`].
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl OpaqueValue {
    pub fn new<T: Any>(value: T) -> Self {
        OpaqueValue {
            type_name: std::any::type_name::<T>(),
            value: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueValue").field(&self.type_name).finish()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

/// A value held by a parameter store.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Plain JSON value: numbers, strings, booleans, arrays, objects, null.
    Json(Value),
    Pulse(PulseDescriptor),
    /// Nested sample parameter set.
    Sample(SampleIdentity),
    Opaque(OpaqueValue),
}

impl ParameterValue {
    pub fn null() -> Self {
        ParameterValue::Json(Value::Null)
    }

    pub fn opaque<T: Any>(value: T) -> Self {
        ParameterValue::Opaque(OpaqueValue::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Json(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParameterValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Value::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Convert the value into its on-disk JSON representation.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            ParameterValue::Json(value) => Ok(value.clone()),
            ParameterValue::Pulse(pulse) => Ok(serde_json::to_value(pulse)?),
            ParameterValue::Sample(sample) => {
                Ok(Value::Object(sample.raw_parameters().into_iter().collect()))
            }
            ParameterValue::Opaque(opaque) => {
                Err(Error::NoSerializerDefined(opaque.type_name().to_string()))
            }
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Json(Value::String(s)) => write!(f, "{s}"),
            ParameterValue::Json(value) => write!(f, "{value}"),
            ParameterValue::Pulse(pulse) => write!(
                f,
                "{} pulse '{}' (length={}, amplitude={})",
                pulse.function, pulse.uid, pulse.length, pulse.amplitude
            ),
            ParameterValue::Sample(sample) => write!(f, "{}", sample.name()),
            ParameterValue::Opaque(opaque) => write!(f, "<{}>", opaque.type_name()),
        }
    }
}

/// Non-finite floats become `null`, JSON has no representation for them.
impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for ParameterValue {
    fn from(value: Vec<T>) -> Self {
        ParameterValue::Json(Value::from(value))
    }
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        ParameterValue::Json(value)
    }
}

impl From<PulseDescriptor> for ParameterValue {
    fn from(value: PulseDescriptor) -> Self {
        ParameterValue::Pulse(value)
    }
}

impl From<SampleIdentity> for ParameterValue {
    fn from(value: SampleIdentity) -> Self {
        ParameterValue::Sample(value)
    }
}
