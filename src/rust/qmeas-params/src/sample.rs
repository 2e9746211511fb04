// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use qmeas_log::info;
use serde_json::Value;

use crate::Result;

/// Name of the directory holding the store files of a sample.
pub const PARAMETERS_DIR: &str = "parameters";

/// A physical sample and structure, owning `<directory>/<sample>/<structure>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleIdentity {
    directory: PathBuf,
    sample: String,
    structure: String,
    work_dir: PathBuf,
}

impl SampleIdentity {
    /// Create the identity, making sure the working directory and its
    /// `parameters` subdirectory exist.
    pub fn new(
        directory: impl Into<PathBuf>,
        sample: impl Into<String>,
        structure: impl Into<String>,
    ) -> Result<Self> {
        let directory = directory.into();
        let sample = sample.into();
        let structure = structure.into();
        let work_dir = directory.join(&sample).join(&structure);
        if !work_dir.is_dir() {
            fs::create_dir_all(&work_dir)?;
            info!(
                "Created working directory for sample {} - {}: {}",
                sample,
                structure,
                work_dir.display()
            );
        }
        fs::create_dir_all(work_dir.join(PARAMETERS_DIR))?;
        Ok(SampleIdentity {
            directory,
            sample,
            structure,
            work_dir,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn structure(&self) -> &str {
        &self.structure
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn parameters_dir(&self) -> PathBuf {
        self.work_dir.join(PARAMETERS_DIR)
    }

    /// `<sample>_<structure>`
    pub fn name(&self) -> String {
        format!("{}_{}", self.sample, self.structure)
    }

    /// The identity as a flat parameter mapping.
    pub fn raw_parameters(&self) -> IndexMap<String, Value> {
        IndexMap::from([
            (
                "directory".to_string(),
                Value::from(self.directory.to_string_lossy().into_owned()),
            ),
            ("sample".to_string(), Value::from(self.sample.as_str())),
            ("structure".to_string(), Value::from(self.structure.as_str())),
        ])
    }
}
