// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use qmeas_log::{diagnostic, warn};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::settings::StoreSettings;
use crate::value::ParameterValue;
use crate::{Error, Result};

/// Key stamped with the local time on every mutation.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Insertion-ordered key-value store persisted to a JSON file.
///
/// The store is the in-memory source of truth. Each successful
/// [`add`](Self::add), [`update`](Self::update) or [`delete`](Self::delete)
/// stamps [`TIMESTAMP_KEY`] and rewrites the whole file. A failed write is
/// logged and leaves the in-memory mutation in place, unless strict saves
/// are enabled with [`set_strict_saves`](Self::set_strict_saves).
#[derive(Debug, Clone)]
pub struct ParameterStore {
    name: String,
    file: PathBuf,
    params: IndexMap<String, ParameterValue>,
    settings: StoreSettings,
    strict: bool,
}

impl ParameterStore {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, settings: StoreSettings) -> Self {
        let mut params = IndexMap::new();
        params.insert(TIMESTAMP_KEY.to_string(), ParameterValue::null());
        ParameterStore {
            name: name.into(),
            file: file.into(),
            params,
            settings,
            strict: false,
        }
    }

    /// Return write failures from `add`, `update` and `delete` instead of
    /// logging them. The in-memory change is applied either way.
    pub fn set_strict_saves(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn strict_saves(&self) -> bool {
        self.strict
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Result<&ParameterValue> {
        self.params
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Time of the last mutation, `None` before the first one.
    pub fn timestamp(&self) -> Option<&str> {
        self.params.get(TIMESTAMP_KEY).and_then(ParameterValue::as_str)
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Result<()> {
        let key = key.into();
        if self.params.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.params.insert(key, value.into());
        self.persist()
    }

    pub fn update(&mut self, key: &str, value: impl Into<ParameterValue>) -> Result<()> {
        let Some(slot) = self.params.get_mut(key) else {
            return Err(Error::MissingKey(key.to_string()));
        };
        *slot = value.into();
        self.persist()
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.params.shift_remove(key).is_none() {
            return Err(Error::MissingKey(key.to_string()));
        }
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        if self.strict {
            return self.try_save();
        }
        self.save();
        Ok(())
    }

    /// Stamp and write the store, logging a failed write instead of returning it.
    pub fn save(&mut self) {
        if let Err(error) = self.try_save() {
            warn!(
                "Could not save parameters to {}: {}",
                self.file.display(),
                error
            );
        }
    }

    /// Stamp and write the store.
    ///
    /// The timestamp is advanced even when the write fails.
    pub fn try_save(&mut self) -> Result<()> {
        let now = self.settings.timestamp_now();
        self.params
            .insert(TIMESTAMP_KEY.to_string(), ParameterValue::from(now));
        let snapshot = self.snapshot()?;

        let indent = " ".repeat(self.settings.indent());
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
        snapshot.serialize(&mut serializer)?;
        fs::write(&self.file, buffer)?;
        diagnostic!(
            "Saved {} parameters of '{}' to {}",
            snapshot.len(),
            self.name,
            self.file.display()
        );
        Ok(())
    }

    /// JSON representation of every parameter, in insertion order.
    pub fn snapshot(&self) -> Result<IndexMap<String, Value>> {
        self.params
            .iter()
            .map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
            .collect()
    }

    /// Read a store file written by [`try_save`](Self::try_save).
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<IndexMap<String, Value>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Insert without the duplicate check and without writing the file.
    pub(crate) fn seed(&mut self, key: &str, value: impl Into<ParameterValue>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// Take over the values of a previously written file, without writing.
    pub(crate) fn restore(&mut self, values: IndexMap<String, Value>) {
        for (key, value) in values {
            self.params.insert(key, ParameterValue::Json(value));
        }
    }
}

impl fmt::Display for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.name)?;
        for (key, value) in &self.params {
            writeln!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}
