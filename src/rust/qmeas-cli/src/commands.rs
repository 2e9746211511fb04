// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use qmeas_params::{
    BaseParameterStore, LinkedParameterStore, ParameterStore, ParameterValue, SampleIdentity,
};
use serde_json::Value;

#[derive(Args, Debug, Clone)]
pub(crate) struct StoreArgs {
    /// Root directory holding all samples.
    #[arg(long, env = "QMEAS_ROOT")]
    pub root: PathBuf,
    #[arg(long)]
    pub sample: String,
    #[arg(long)]
    pub structure: String,
    /// Name of the base store.
    #[arg(long)]
    pub store: String,
    /// Edit the linked store of this name instead of the base.
    #[arg(long)]
    pub linked: Option<String>,
}

enum Target {
    Base(BaseParameterStore),
    Linked(LinkedParameterStore),
}

impl Target {
    fn open(args: &StoreArgs) -> Result<Self> {
        let sample = SampleIdentity::new(&args.root, &args.sample, &args.structure)
            .context("Failed to prepare the sample directory")?;
        let mut base = BaseParameterStore::open(&sample, &args.store)
            .with_context(|| format!("Failed to open base store '{}'", args.store))?;
        let Some(linked) = &args.linked else {
            base.set_strict_saves(true);
            return Ok(Target::Base(base));
        };
        let base = base.into_shared();
        let mut linked = LinkedParameterStore::open(&base, linked)
            .with_context(|| format!("Failed to open linked store '{linked}'"))?;
        linked.set_strict_saves(true);
        Ok(Target::Linked(linked))
    }

    fn set(&mut self, key: &str, value: ParameterValue, update: bool) -> qmeas_params::Result<()> {
        match (self, update) {
            (Target::Base(store), false) => store.add(key, value),
            (Target::Base(store), true) => store.update(key, value),
            (Target::Linked(store), false) => store.add(key, value),
            (Target::Linked(store), true) => store.update(key, value),
        }
    }

    fn delete(&mut self, key: &str) -> qmeas_params::Result<()> {
        match self {
            Target::Base(store) => store.delete(key),
            Target::Linked(store) => store.delete(key),
        }
    }

    fn render(&self) -> String {
        match self {
            Target::Base(store) => store.to_string(),
            Target::Linked(store) => store.to_string(),
        }
    }
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub(crate) fn parse_value(raw: &str) -> ParameterValue {
    serde_json::from_str::<Value>(raw)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
        .into()
}

pub(crate) fn show(file: &Path) -> Result<String> {
    let values = ParameterStore::load_snapshot(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut out = String::new();
    for (key, value) in values {
        writeln!(out, "{key}: {}", ParameterValue::from(value))?;
    }
    Ok(out)
}

pub(crate) fn set(args: &StoreArgs, key: &str, raw: &str, update: bool) -> Result<String> {
    let mut target = Target::open(args)?;
    target.set(key, parse_value(raw), update)?;
    Ok(target.render())
}

pub(crate) fn delete(args: &StoreArgs, key: &str) -> Result<String> {
    let mut target = Target::open(args)?;
    target.delete(key)?;
    Ok(target.render())
}
