// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Functional pulses and their sampled envelopes.
//!
//! Envelopes are evaluated on the normalized axis `x` running from -1 at the
//! first sample to +1 at the last one, then scaled by the pulse amplitude.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use num_complex::Complex64;
use qmeas_params::{ParameterValue, PulseDescriptor};
use serde_json::Value;

use crate::{Error, Result};

/// Sampling rate used when none is given, in samples per second.
pub const DEFAULT_SAMPLING_RATE: f64 = 2.0e9;

/// Upper bound on the number of samples of one pulse.
pub const MAX_SAMPLES: usize = 1 << 24;

const DEFAULT_SIGMA: f64 = 1.0 / 3.0;
const DEFAULT_BETA: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseFunction {
    Const,
    Gaussian,
    Drag,
    /// Flat top of `width` seconds with gaussian rise and fall.
    GaussianSquare,
}

impl PulseFunction {
    pub fn name(&self) -> &'static str {
        match self {
            PulseFunction::Const => "const",
            PulseFunction::Gaussian => "gaussian",
            PulseFunction::Drag => "drag",
            PulseFunction::GaussianSquare => "gaussian_square",
        }
    }

    fn envelope(&self, x: f64, length: f64, parameters: &PulseParameters) -> Result<Complex64> {
        let value = match self {
            PulseFunction::Const => Complex64::new(1.0, 0.0),
            PulseFunction::Gaussian => {
                let sigma = parameters.sigma()?;
                Complex64::new(gaussian(x, sigma, parameters.flag("zero_boundaries")?), 0.0)
            }
            PulseFunction::Drag => {
                let sigma = parameters.sigma()?;
                let beta = parameters.float("beta", DEFAULT_BETA)?;
                let g = gaussian(x, sigma, parameters.flag("zero_boundaries")?);
                Complex64::new(g, -beta * x / (sigma * sigma) * g)
            }
            PulseFunction::GaussianSquare => {
                let width = parameters.float("width", 0.9 * length)?;
                if !(0.0..=length).contains(&width) {
                    return Err(Error::InvalidPulse(format!(
                        "flat top width {width} exceeds pulse length {length}"
                    )));
                }
                let sigma = parameters.sigma()?;
                // Distance from the flat top, normalized to the rise time.
                let flat = width / length;
                let edge = (x.abs() - flat).max(0.0);
                let risefall = 1.0 - flat;
                let y = if edge == 0.0 || risefall == 0.0 {
                    1.0
                } else {
                    gaussian(edge / risefall, sigma, parameters.flag("zero_boundaries")?)
                };
                Complex64::new(y, 0.0)
            }
        };
        Ok(value)
    }
}

fn gaussian(x: f64, sigma: f64, zero_boundaries: bool) -> f64 {
    let g = |x: f64| (-x * x / (2.0 * sigma * sigma)).exp();
    if zero_boundaries {
        let boundary = g(1.0);
        (g(x) - boundary) / (1.0 - boundary)
    } else {
        g(x)
    }
}

impl fmt::Display for PulseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PulseFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "const" => Ok(PulseFunction::Const),
            "gaussian" => Ok(PulseFunction::Gaussian),
            "drag" => Ok(PulseFunction::Drag),
            "gaussian_square" => Ok(PulseFunction::GaussianSquare),
            other => Err(Error::InvalidPulse(format!(
                "unknown pulse function '{other}'"
            ))),
        }
    }
}

struct PulseParameters<'a>(Option<&'a IndexMap<String, Value>>);

impl PulseParameters<'_> {
    fn float(&self, name: &str, default: f64) -> Result<f64> {
        match self.0.and_then(|p| p.get(name)) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| {
                Error::InvalidPulse(format!("pulse parameter '{name}' must be a number"))
            }),
        }
    }

    fn sigma(&self) -> Result<f64> {
        let sigma = self.float("sigma", DEFAULT_SIGMA)?;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidPulse(format!(
                "sigma must be positive, got {sigma}"
            )));
        }
        Ok(sigma)
    }

    fn flag(&self, name: &str) -> Result<bool> {
        match self.0.and_then(|p| p.get(name)) {
            None | Some(Value::Null) => Ok(false),
            Some(value) => value.as_bool().ok_or_else(|| {
                Error::InvalidPulse(format!("pulse parameter '{name}' must be a boolean"))
            }),
        }
    }
}

/// Sampled envelope of a pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPulse {
    /// Sample times in seconds, starting at zero.
    pub time: Vec<f64>,
    pub samples: Vec<Complex64>,
}

/// A functional pulse: a named envelope function with length and amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    uid: String,
    function: PulseFunction,
    length: f64,
    amplitude: f64,
    can_compress: bool,
    pulse_parameters: Option<IndexMap<String, Value>>,
}

impl Pulse {
    /// Create a pulse of unit amplitude; `length` is in seconds.
    pub fn new(uid: impl Into<String>, function: PulseFunction, length: f64) -> Result<Self> {
        if !length.is_finite() || length <= 0.0 {
            return Err(Error::InvalidPulse(format!(
                "length must be positive, got {length}"
            )));
        }
        Ok(Pulse {
            uid: uid.into(),
            function,
            length,
            amplitude: 1.0,
            can_compress: false,
            pulse_parameters: None,
        })
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_can_compress(mut self, can_compress: bool) -> Self {
        self.can_compress = can_compress;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pulse_parameters
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn from_descriptor(descriptor: &PulseDescriptor) -> Result<Self> {
        let mut pulse = Pulse::new(
            descriptor.uid.clone(),
            descriptor.function.parse()?,
            descriptor.length,
        )?;
        pulse.amplitude = descriptor.amplitude;
        pulse.can_compress = descriptor.can_compress;
        pulse.pulse_parameters = descriptor.pulse_parameters.clone();
        Ok(pulse)
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn function(&self) -> PulseFunction {
        self.function
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn can_compress(&self) -> bool {
        self.can_compress
    }

    pub fn pulse_parameters(&self) -> Option<&IndexMap<String, Value>> {
        self.pulse_parameters.as_ref()
    }

    pub fn descriptor(&self) -> PulseDescriptor {
        PulseDescriptor {
            uid: self.uid.clone(),
            function: self.function.name().to_string(),
            length: self.length,
            amplitude: self.amplitude,
            can_compress: self.can_compress,
            pulse_parameters: self.pulse_parameters.clone(),
        }
    }

    /// Sample the envelope at `sampling_rate` samples per second.
    pub fn generate_sampled_pulse(&self, sampling_rate: f64) -> Result<SampledPulse> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(Error::InvalidPulse(format!(
                "sampling rate must be positive, got {sampling_rate}"
            )));
        }
        let count = (self.length * sampling_rate).round();
        if count < 1.0 {
            return Err(Error::InvalidPulse(format!(
                "pulse '{}' is shorter than one sample at {sampling_rate} Sa/s",
                self.uid
            )));
        }
        if !count.is_finite() || count > MAX_SAMPLES as f64 {
            return Err(Error::InvalidPulse(format!(
                "pulse '{}' needs {count} samples at {sampling_rate} Sa/s, at most {MAX_SAMPLES} are supported",
                self.uid
            )));
        }
        let count = count as usize;
        let parameters = PulseParameters(self.pulse_parameters.as_ref());
        let mut time = Vec::with_capacity(count);
        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let x = if count == 1 {
                0.0
            } else {
                -1.0 + 2.0 * i as f64 / (count - 1) as f64
            };
            time.push(i as f64 / sampling_rate);
            samples.push(self.amplitude * self.function.envelope(x, self.length, &parameters)?);
        }
        Ok(SampledPulse { time, samples })
    }
}

impl From<&Pulse> for ParameterValue {
    fn from(pulse: &Pulse) -> Self {
        ParameterValue::Pulse(pulse.descriptor())
    }
}

impl From<Pulse> for ParameterValue {
    fn from(pulse: Pulse) -> Self {
        ParameterValue::Pulse(pulse.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_const_pulse() {
        let pulse = Pulse::new("flat", PulseFunction::Const, 10e-9)
            .unwrap()
            .with_amplitude(0.5);
        let sampled = pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE).unwrap();
        assert_eq!(sampled.samples.len(), 20);
        assert!(sampled.samples.iter().all(|s| *s == Complex64::new(0.5, 0.0)));
        assert_eq!(sampled.time[0], 0.0);
        assert_eq!(sampled.time[1], 0.5e-9);
    }

    #[test]
    fn test_gaussian_peaks_at_centre() {
        let pulse = Pulse::new("g", PulseFunction::Gaussian, 10e-9).unwrap();
        let sampled = pulse.generate_sampled_pulse(2.1e9).unwrap();
        assert_eq!(sampled.samples.len(), 21);
        assert!((sampled.samples[10].re - 1.0).abs() < 1e-12);
        assert!(sampled.samples[0].re < sampled.samples[5].re);
        assert!((sampled.samples[0].re - sampled.samples[20].re).abs() < 1e-12);
    }

    #[test]
    fn test_zero_boundaries() {
        let pulse = Pulse::new("g", PulseFunction::Gaussian, 10e-9)
            .unwrap()
            .with_parameter("zero_boundaries", true);
        let sampled = pulse.generate_sampled_pulse(2.1e9).unwrap();
        assert!(sampled.samples[0].re.abs() < 1e-12);
        assert!((sampled.samples[10].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_quadrature_is_antisymmetric() {
        let pulse = Pulse::new("x90", PulseFunction::Drag, 10e-9)
            .unwrap()
            .with_parameter("beta", 0.5);
        let sampled = pulse.generate_sampled_pulse(2.1e9).unwrap();
        assert!(sampled.samples[10].im.abs() < 1e-12);
        assert!((sampled.samples[3].im + sampled.samples[17].im).abs() < 1e-12);
        assert!(sampled.samples[3].im > 0.0);
    }

    #[test]
    fn test_gaussian_square_has_flat_top() {
        let pulse = Pulse::new("readout", PulseFunction::GaussianSquare, 100e-9)
            .unwrap()
            .with_parameter("width", 50e-9);
        let sampled = pulse.generate_sampled_pulse(1e9).unwrap();
        assert_eq!(sampled.samples.len(), 100);
        assert_eq!(sampled.samples[50].re, 1.0);
        assert!(sampled.samples[0].re < 1.0);

        let too_wide = Pulse::new("readout", PulseFunction::GaussianSquare, 100e-9)
            .unwrap()
            .with_parameter("width", 200e-9);
        assert!(matches!(
            too_wide.generate_sampled_pulse(1e9),
            Err(Error::InvalidPulse(_))
        ));
    }

    #[test]
    fn test_invalid_pulses() {
        assert!(Pulse::new("p", PulseFunction::Const, 0.0).is_err());
        let pulse = Pulse::new("p", PulseFunction::Const, 1e-12).unwrap();
        assert!(pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE).is_err());
        assert!(pulse.generate_sampled_pulse(-1.0).is_err());

        let pulse = Pulse::new("p", PulseFunction::Gaussian, 10e-9)
            .unwrap()
            .with_parameter("sigma", "wide");
        assert!(matches!(
            pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE),
            Err(Error::InvalidPulse(_))
        ));
    }

    #[test]
    fn test_sample_count_is_bounded() {
        let pulse = Pulse::new("long", PulseFunction::Const, 1e300).unwrap();
        assert!(matches!(
            pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE),
            Err(Error::InvalidPulse(_))
        ));
        // A length given in seconds instead of nanoseconds.
        let pulse = Pulse::new("typo", PulseFunction::Gaussian, 1.0).unwrap();
        assert!(matches!(
            pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE),
            Err(Error::InvalidPulse(_))
        ));
        let pulse = Pulse::new("limit", PulseFunction::Const, (MAX_SAMPLES + 1) as f64).unwrap();
        assert!(pulse.generate_sampled_pulse(1.0).is_err());
    }

    #[test]
    fn test_sigma_must_be_positive() {
        for function in [
            PulseFunction::Gaussian,
            PulseFunction::Drag,
            PulseFunction::GaussianSquare,
        ] {
            for sigma in [0.0, -0.1] {
                let pulse = Pulse::new("p", function, 10e-9)
                    .unwrap()
                    .with_parameter("sigma", sigma);
                assert!(matches!(
                    pulse.generate_sampled_pulse(DEFAULT_SAMPLING_RATE),
                    Err(Error::InvalidPulse(_))
                ));
            }
        }
    }

    #[test]
    fn test_descriptor() {
        let pulse = Pulse::new("x90", PulseFunction::Drag, 40e-9)
            .unwrap()
            .with_amplitude(0.8)
            .with_can_compress(true)
            .with_parameter("sigma", 0.3);
        let descriptor = pulse.descriptor();
        assert_eq!(descriptor.function, "drag");
        assert_eq!(
            descriptor.pulse_parameters,
            Some(IndexMap::from([("sigma".to_string(), json!(0.3))]))
        );
        assert_eq!(Pulse::from_descriptor(&descriptor).unwrap(), pulse);

        let mut unknown = descriptor;
        unknown.function = "sinc".to_string();
        assert!(Pulse::from_descriptor(&unknown).is_err());
    }

    #[test]
    fn test_function_names() {
        for function in [
            PulseFunction::Const,
            PulseFunction::Gaussian,
            PulseFunction::Drag,
            PulseFunction::GaussianSquare,
        ] {
            assert_eq!(function.name().parse::<PulseFunction>().unwrap(), function);
        }
    }
}
