// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::Result;
use crate::pulse::Pulse;

/// A surface that renders sampled time series.
pub trait PlotSink {
    fn plot(&mut self, x: &[f64], y: &[f64]);
    fn set_labels(&mut self, x_label: &str, y_label: &str);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Sink that keeps everything it is asked to draw.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub traces: Vec<Trace>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl PlotSink for RecordingSink {
    fn plot(&mut self, x: &[f64], y: &[f64]) {
        self.traces.push(Trace {
            x: x.to_vec(),
            y: y.to_vec(),
        });
    }

    fn set_labels(&mut self, x_label: &str, y_label: &str) {
        self.x_label = Some(x_label.to_string());
        self.y_label = Some(y_label.to_string());
    }
}

/// Plot the real part of the sampled pulse against time.
pub fn show_pulse(pulse: &Pulse, sink: &mut dyn PlotSink, sampling_rate: f64) -> Result<()> {
    let sampled = pulse.generate_sampled_pulse(sampling_rate)?;
    let real: Vec<f64> = sampled.samples.iter().map(|s| s.re).collect();
    sink.plot(&sampled.time, &real);
    sink.set_labels("Time", "Relative Amplitude");
    Ok(())
}
