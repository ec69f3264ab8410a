// Sensor health domain model - threshold classification of the latest reading
use serde::{Deserialize, Serialize};

use super::reading::RawLogPoint;

/// Ordered worst-last, so `max` aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    NoData,
    Good,
    Warn,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerSide {
    /// Bad below the danger limit
    Min,
    /// Bad above the danger limit
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricLimits {
    pub warn_min: f64,
    pub warn_max: f64,
    pub danger: f64,
    pub side: DangerSide,
}

impl MetricLimits {
    pub fn classify(&self, value: f64) -> Health {
        if !value.is_finite() {
            return Health::NoData;
        }
        let bad = match self.side {
            DangerSide::Min => value < self.danger,
            DangerSide::Max => value > self.danger,
        };
        if bad {
            Health::Bad
        } else if value < self.warn_min || value > self.warn_max {
            Health::Warn
        } else {
            Health::Good
        }
    }

    fn classify_opt(&self, value: Option<f64>) -> Health {
        value.map_or(Health::NoData, |v| self.classify(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ThresholdOverrides")]
pub struct Thresholds {
    pub moisture: MetricLimits,
    pub temperature: MetricLimits,
    pub charge: MetricLimits,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            moisture: MetricLimits { warn_min: 20.0, warn_max: 80.0, danger: 10.0, side: DangerSide::Min },
            temperature: MetricLimits { warn_min: 5.0, warn_max: 35.0, danger: 40.0, side: DangerSide::Max },
            charge: MetricLimits { warn_min: 3.5, warn_max: 4.3, danger: 3.3, side: DangerSide::Min },
        }
    }
}

/// Configured thresholds; any limit left out keeps its per-metric default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThresholdOverrides {
    moisture: LimitOverrides,
    temperature: LimitOverrides,
    charge: LimitOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LimitOverrides {
    warn_min: Option<f64>,
    warn_max: Option<f64>,
    danger: Option<f64>,
    side: Option<DangerSide>,
}

impl LimitOverrides {
    fn over(self, base: MetricLimits) -> MetricLimits {
        MetricLimits {
            warn_min: self.warn_min.unwrap_or(base.warn_min),
            warn_max: self.warn_max.unwrap_or(base.warn_max),
            danger: self.danger.unwrap_or(base.danger),
            side: self.side.unwrap_or(base.side),
        }
    }
}

impl From<ThresholdOverrides> for Thresholds {
    fn from(overrides: ThresholdOverrides) -> Self {
        let base = Thresholds::default();
        Self {
            moisture: overrides.moisture.over(base.moisture),
            temperature: overrides.temperature.over(base.temperature),
            charge: overrides.charge.over(base.charge),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorHealth {
    pub overall: Health,
    pub moisture: Health,
    pub temperature: Health,
    pub charge: Health,
}

impl Thresholds {
    /// Worst-of classification; metrics the sensor does not report stay `NoData`
    /// and do not affect the overall state unless nothing was reported.
    pub fn assess(&self, reading: &RawLogPoint) -> SensorHealth {
        let moisture = self.moisture.classify_opt(reading.m1);
        let temperature = self.temperature.classify_opt(reading.aht_temp.or(reading.temp));
        let charge = self.charge.classify_opt(reading.charge);

        SensorHealth {
            overall: moisture.max(temperature).max(charge),
            moisture,
            temperature,
            charge,
        }
    }
}

/// Most recent reading of the given sensor
pub fn latest_reading<'a>(points: &'a [RawLogPoint], sensor_id: &str) -> Option<&'a RawLogPoint> {
    points
        .iter()
        .filter(|p| p.sensor_id == sensor_id)
        .max_by_key(|p| p.timestamp)
}
