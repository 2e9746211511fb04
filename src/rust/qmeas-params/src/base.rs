// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use qmeas_log::{diagnostic, warn};
use serde_json::Value;

use crate::Result;
use crate::sample::SampleIdentity;
use crate::settings::StoreSettings;
use crate::store::ParameterStore;
use crate::value::ParameterValue;

pub const SAMPLE_KEY: &str = "sample";
pub const STRUCTURE_KEY: &str = "structure";

/// Handle to a base store shared with its linked stores.
pub type SharedBaseStore = Rc<RefCell<BaseParameterStore>>;

/// File name stem of a store: the store name with spaces replaced by underscores.
pub(crate) fn file_stem(name: &str) -> String {
    name.replace(' ', "_")
}

/// Parameters of one sample/structure, stored in
/// `<work_dir>/parameters/<name>.txt`.
#[derive(Debug)]
pub struct BaseParameterStore {
    store: ParameterStore,
    sample: SampleIdentity,
    work_dir: PathBuf,
}

impl BaseParameterStore {
    pub fn new<I, K, V>(sample: &SampleIdentity, name: impl Into<String>, parameters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        Self::with_settings(sample, name, parameters, StoreSettings::default())
    }

    pub fn with_settings<I, K, V>(
        sample: &SampleIdentity,
        name: impl Into<String>,
        parameters: I,
        settings: StoreSettings,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParameterValue>,
    {
        let mut base = Self::seeded(sample, name.into(), settings)?;
        for (key, value) in parameters {
            base.add(key, value)?;
        }
        Ok(base)
    }

    /// Reopen the store from its file, or start an empty one if there is none.
    ///
    /// Reloaded values are plain JSON and nothing is written until the next
    /// mutation.
    pub fn open(sample: &SampleIdentity, name: impl Into<String>) -> Result<Self> {
        Self::open_with_settings(sample, name, StoreSettings::default())
    }

    pub fn open_with_settings(
        sample: &SampleIdentity,
        name: impl Into<String>,
        settings: StoreSettings,
    ) -> Result<Self> {
        let mut base = Self::seeded(sample, name.into(), settings)?;
        if !base.file().is_file() {
            return Ok(base);
        }
        let values = ParameterStore::load_snapshot(base.file())?;
        for (key, expected) in [(SAMPLE_KEY, sample.sample()), (STRUCTURE_KEY, sample.structure())] {
            match values.get(key) {
                Some(Value::String(found)) if found == expected => {}
                found => {
                    warn!(
                        "Store file {} has {} {:?}, expected '{}'",
                        base.file().display(),
                        key,
                        found,
                        expected
                    );
                }
            }
        }
        base.store.restore(values);
        base.store.seed(SAMPLE_KEY, sample.sample());
        base.store.seed(STRUCTURE_KEY, sample.structure());
        diagnostic!(
            "Reopened '{}' with {} parameters",
            base.name(),
            base.store.len()
        );
        Ok(base)
    }

    fn seeded(sample: &SampleIdentity, name: String, settings: StoreSettings) -> Result<Self> {
        let work_dir = sample.parameters_dir();
        fs::create_dir_all(&work_dir)?;
        let file = work_dir.join(settings.file_name(&file_stem(&name)));
        let mut store = ParameterStore::new(name, file, settings);
        store.seed(SAMPLE_KEY, sample.sample());
        store.seed(STRUCTURE_KEY, sample.structure());
        Ok(BaseParameterStore {
            store,
            sample: sample.clone(),
            work_dir,
        })
    }

    pub fn into_shared(self) -> SharedBaseStore {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn file(&self) -> &Path {
        self.store.file()
    }

    pub fn sample(&self) -> &SampleIdentity {
        &self.sample
    }

    /// Directory holding this store and its linked stores.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn get(&self, key: &str) -> Result<&ParameterValue> {
        self.store.get(key)
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Result<()> {
        self.store.add(key, value)
    }

    pub fn update(&mut self, key: &str, value: impl Into<ParameterValue>) -> Result<()> {
        self.store.update(key, value)
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
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
}

impl fmt::Display for BaseParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.store, f)
    }
}
