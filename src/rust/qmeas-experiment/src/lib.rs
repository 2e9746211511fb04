// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod experiment;
pub mod plot;
pub mod pulse;

pub use crate::experiment::{ExperimentDefinition, ExperimentRunner, Session};
pub use crate::plot::{PlotSink, RecordingSink, show_pulse};
pub use crate::pulse::{Pulse, PulseFunction, SampledPulse};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotConfigured(String),

    #[error("Invalid pulse: {0}")]
    InvalidPulse(String),

    #[error(transparent)]
    Params(#[from] qmeas_params::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: &str) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
