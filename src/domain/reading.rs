// Sensor reading domain model - one parsed line of the field log
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of numeric parameters a field sensor can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    M1,
    M2,
    Charge,
    AhtM,
    AhtTemp,
    BmpPressure,
    Temp,
    BmpTemp,
    Rain,
}

impl Parameter {
    pub const ALL: [Parameter; 9] = [
        Parameter::M1,
        Parameter::M2,
        Parameter::Charge,
        Parameter::AhtM,
        Parameter::AhtTemp,
        Parameter::BmpPressure,
        Parameter::Temp,
        Parameter::BmpTemp,
        Parameter::Rain,
    ];

    /// Query-string key used in the log line
    pub fn key(self) -> &'static str {
        match self {
            Parameter::M1 => "m1",
            Parameter::M2 => "m2",
            Parameter::Charge => "charge",
            Parameter::AhtM => "aht_m",
            Parameter::AhtTemp => "aht_temp",
            Parameter::BmpPressure => "bmp_pressure",
            Parameter::Temp => "temp",
            Parameter::BmpTemp => "bmp_temp",
            Parameter::Rain => "rain",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Parameter::M1 => "Soil moisture (m1, resistive)",
            Parameter::M2 => "Soil moisture (m2, capacitive)",
            Parameter::Charge => "Battery charge (V)",
            Parameter::AhtM => "Air humidity (aht_m, %)",
            Parameter::AhtTemp => "Outside temperature (aht_temp, °C)",
            Parameter::BmpPressure => "Atmospheric pressure (bmp_pressure, Pa)",
            Parameter::Temp => "Device temperature (temp, °C)",
            Parameter::BmpTemp => "Outside temperature (bmp_temp, °C)",
            Parameter::Rain => "Rain sensor",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parameter: {0}")]
pub struct UnknownParameter(pub String);

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

/// A single structured log line. Every numeric field is optional: a sensor
/// reports whatever subset of parameters it has hardware for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLogPoint {
    pub timestamp: i64,
    pub sensor_id: String,
    pub coords: Option<String>,
    pub rain: Option<f64>,
    pub m1: Option<f64>,
    pub m2: Option<f64>,
    pub charge: Option<f64>,
    pub temp: Option<f64>,
    pub aht_m: Option<f64>,
    pub aht_temp: Option<f64>,
    pub bmp_temp: Option<f64>,
    pub bmp_pressure: Option<f64>,
}

impl RawLogPoint {
    pub fn new(timestamp: i64, sensor_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            sensor_id: sensor_id.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::M1 => self.m1,
            Parameter::M2 => self.m2,
            Parameter::Charge => self.charge,
            Parameter::AhtM => self.aht_m,
            Parameter::AhtTemp => self.aht_temp,
            Parameter::BmpPressure => self.bmp_pressure,
            Parameter::Temp => self.temp,
            Parameter::BmpTemp => self.bmp_temp,
            Parameter::Rain => self.rain,
        }
    }

    pub fn slot_mut(&mut self, parameter: Parameter) -> &mut Option<f64> {
        match parameter {
            Parameter::M1 => &mut self.m1,
            Parameter::M2 => &mut self.m2,
            Parameter::Charge => &mut self.charge,
            Parameter::AhtM => &mut self.aht_m,
            Parameter::AhtTemp => &mut self.aht_temp,
            Parameter::BmpPressure => &mut self.bmp_pressure,
            Parameter::Temp => &mut self.temp,
            Parameter::BmpTemp => &mut self.bmp_temp,
            Parameter::Rain => &mut self.rain,
        }
    }

    /// Builder-style setter, mostly for tests and fixtures
    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        *self.slot_mut(parameter) = Some(value);
        self
    }
}
