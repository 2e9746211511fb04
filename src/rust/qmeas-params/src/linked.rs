// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use qmeas_log::{diagnostic, warn};

use crate::base::{SharedBaseStore, file_stem};
use crate::store::{ParameterStore, TIMESTAMP_KEY};
use crate::value::ParameterValue;
use crate::{Error, Result};

pub const BASE_KEY: &str = "base";
pub const BASE_FILE_KEY: &str = "base_file";

/// Parameters layered on top of a base store.
///
/// Reads fall back to the base. Keys owned by the base can never be added,
/// updated or deleted through the linked store; its own keys are stored in
/// `<base-dir>/<base-name>-LINKED-<name>.txt`.
///
/// The base is borrowed on every call, so it must not be mutably borrowed
/// while the linked store is in use.
#[derive(Debug)]
pub struct LinkedParameterStore {
    store: ParameterStore,
    base: SharedBaseStore,
}

impl LinkedParameterStore {
    pub fn new<I, K, V>(base: &SharedBaseStore, name: impl Into<String>, parameters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        let mut linked = Self::seeded(base, name.into());
        for (key, value) in parameters {
            linked.add(key, value)?;
        }
        Ok(linked)
    }

    /// Reopen the linked store from its file, or start an empty one.
    ///
    /// Keys the base has taken over since the file was written are dropped.
    pub fn open(base: &SharedBaseStore, name: impl Into<String>) -> Result<Self> {
        let mut linked = Self::seeded(base, name.into());
        if linked.file().is_file() {
            let mut values = ParameterStore::load_snapshot(linked.file())?;
            {
                let base = base.borrow();
                values.retain(|key, _| {
                    if key == TIMESTAMP_KEY || !base.contains(key) {
                        return true;
                    }
                    warn!(
                        "Dropping '{}' from {}, it is owned by base store '{}'",
                        key,
                        linked.store.file().display(),
                        base.name()
                    );
                    false
                });
                linked.store.restore(values);
                linked.store.seed(BASE_KEY, base.name());
                linked
                    .store
                    .seed(BASE_FILE_KEY, base.file().to_string_lossy().into_owned());
            }
            diagnostic!(
                "Reopened '{}' with {} parameters",
                linked.name(),
                linked.store.len()
            );
        }
        Ok(linked)
    }

    fn seeded(base: &SharedBaseStore, name: String) -> Self {
        let store = {
            let base = base.borrow();
            let stem = format!("{}-LINKED-{}", file_stem(base.name()), file_stem(&name));
            let settings = base.store().settings().clone();
            let file = base.work_dir().join(settings.file_name(&stem));
            let mut store = ParameterStore::new(name, file, settings);
            store.seed(BASE_KEY, base.name());
            store.seed(BASE_FILE_KEY, base.file().to_string_lossy().into_owned());
            store
        };
        LinkedParameterStore {
            store,
            base: Rc::clone(base),
        }
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn file(&self) -> &Path {
        self.store.file()
    }

    pub fn base(&self) -> &SharedBaseStore {
        &self.base
    }

    /// The parameters owned by this store, without the base.
    pub fn local(&self) -> &ParameterStore {
        &self.store
    }

    /// Look up `key` locally, then in the base.
    pub fn get(&self, key: &str) -> Result<ParameterValue> {
        if let Ok(value) = self.store.get(key) {
            return Ok(value.clone());
        }
        self.base.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key) || self.base.borrow().contains(key)
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Result<()> {
        let key = key.into();
        self.check_not_in_base(&key)?;
        self.store.add(key, value)
    }

    pub fn update(&mut self, key: &str, value: impl Into<ParameterValue>) -> Result<()> {
        self.check_not_in_base(key)?;
        self.store.update(key, value)
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.check_not_in_base(key)?;
        self.store.delete(key)
    }

    pub fn save(&mut self) {
        self.store.save()
    }

    pub fn try_save(&mut self) -> Result<()> {
        self.store.try_save()
    }

    pub fn set_strict_saves(&mut self, strict: bool) {
        self.store.set_strict_saves(strict);
    }

    fn check_not_in_base(&self, key: &str) -> Result<()> {
        if self.base.borrow().contains(key) {
            return Err(Error::BaseIsImmutable(key.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for LinkedParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.store, f)
    }
}
