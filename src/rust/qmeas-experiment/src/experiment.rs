// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle template of a measurement: define, setup, compile, run,
//! analyze and plot.
//!
//! The instrument side is a [`Session`]; the measurement-specific hooks are
//! an [`ExperimentDefinition`]. [`ExperimentRunner`] owns both and enforces
//! the order of the steps.

use anyhow::Context;
use qmeas_log::diagnostic;
use qmeas_params::SampleIdentity;

use crate::plot::PlotSink;
use crate::{Error, Result};

/// Instrument-control session able to compile and run experiments.
pub trait Session {
    type Experiment;
    type Compiled;
    type Results;

    fn compile(&mut self, experiment: &Self::Experiment) -> anyhow::Result<Self::Compiled>;
    fn run(&mut self, compiled: &Self::Compiled) -> anyhow::Result<Self::Results>;
}

/// Measurement-specific steps of an experiment.
pub trait ExperimentDefinition<S: Session> {
    fn define_experiment(&mut self, sample: &SampleIdentity) -> Result<S::Experiment>;

    fn setup(&mut self, session: &mut S) -> Result<()>;

    fn analyze(&mut self, _results: &S::Results, _result_keys: &[String]) -> Result<()> {
        Ok(())
    }

    fn plot(&mut self, _results: &S::Results, _sink: &mut dyn PlotSink) -> Result<()> {
        Ok(())
    }
}

pub struct ExperimentRunner<S: Session, D> {
    session: S,
    name: String,
    sample: SampleIdentity,
    definition: D,
    result_keys: Vec<String>,
    plot: bool,
    analyze: bool,
    defined: Option<S::Experiment>,
    compiled: Option<S::Compiled>,
    full_result: Option<S::Results>,
}

impl<S, D> ExperimentRunner<S, D>
where
    S: Session,
    D: ExperimentDefinition<S>,
{
    /// Create a runner with analysis and plotting enabled.
    pub fn new<K>(
        session: S,
        name: impl Into<String>,
        sample: SampleIdentity,
        definition: D,
        result_keys: impl IntoIterator<Item = K>,
    ) -> Self
    where
        K: Into<String>,
    {
        ExperimentRunner {
            session,
            name: name.into(),
            sample,
            definition,
            result_keys: result_keys.into_iter().map(Into::into).collect(),
            plot: true,
            analyze: true,
            defined: None,
            compiled: None,
            full_result: None,
        }
    }

    pub fn with_plot(mut self, enabled: bool) -> Self {
        self.plot = enabled;
        self
    }

    pub fn with_analyze(mut self, enabled: bool) -> Self {
        self.analyze = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self) -> &SampleIdentity {
        &self.sample
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn result_keys(&self) -> &[String] {
        &self.result_keys
    }

    pub fn is_defined(&self) -> bool {
        self.defined.is_some()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn results(&self) -> Option<&S::Results> {
        self.full_result.as_ref()
    }

    /// Define the experiment, discarding any earlier compilation and results.
    pub fn define(&mut self) -> Result<()> {
        let experiment = self.definition.define_experiment(&self.sample)?;
        self.defined = Some(experiment);
        self.compiled = None;
        self.full_result = None;
        Ok(())
    }

    pub fn setup(&mut self) -> Result<()> {
        self.definition.setup(&mut self.session)
    }

    pub fn compile(&mut self) -> Result<()> {
        let defined = self
            .defined
            .as_ref()
            .ok_or_else(|| Error::NotConfigured("Experiment not yet defined.".to_string()))?;
        let compiled = self
            .session
            .compile(defined)
            .with_context(|| format!("Failed to compile experiment '{}'", self.name))?;
        diagnostic!("Compiled experiment '{}'", self.name);
        self.compiled = Some(compiled);
        self.full_result = None;
        Ok(())
    }

    pub fn run(&mut self) -> Result<&S::Results> {
        let compiled = self
            .compiled
            .as_ref()
            .ok_or_else(|| Error::NotConfigured("Experiment not yet compiled.".to_string()))?;
        let results = self
            .session
            .run(compiled)
            .with_context(|| format!("Failed to run experiment '{}'", self.name))?;
        diagnostic!("Finished experiment '{}'", self.name);
        Ok(self.full_result.insert(results))
    }

    pub fn analyze(&mut self) -> Result<()> {
        let results = self.full_result.as_ref().ok_or_else(not_run)?;
        self.definition.analyze(results, &self.result_keys)
    }

    pub fn plot(&mut self, sink: &mut dyn PlotSink) -> Result<()> {
        let results = self.full_result.as_ref().ok_or_else(not_run)?;
        self.definition.plot(results, sink)
    }

    /// Execute every step in order, skipping analysis and plotting when
    /// they are disabled.
    pub fn run_all(&mut self, sink: &mut dyn PlotSink) -> Result<()> {
        self.define()?;
        self.setup()?;
        self.compile()?;
        self.run()?;
        if self.analyze {
            self.analyze()?;
        }
        if self.plot {
            self.plot(sink)?;
        }
        Ok(())
    }
}

fn not_run() -> Error {
    Error::NotConfigured("Experiment not yet run.".to_string())
}
