// Chart series domain model - per-sensor, per-parameter numeric samples
use serde::Serialize;

use super::reading::{Parameter, RawLogPoint};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ts: i64,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(ts: i64, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Extract one parameter of one sensor from the buffer.
///
/// Points whose parameter is missing or non-finite are skipped. The result is
/// strictly increasing in `ts`: same-timestamp samples are merged into their
/// mean by [`normalize_timestamps`].
pub fn build_series(points: &[RawLogPoint], sensor_id: &str, parameter: Parameter) -> Vec<ChartPoint> {
    let samples: Vec<ChartPoint> = points
        .iter()
        .filter(|p| p.sensor_id == sensor_id)
        .filter_map(|p| {
            p.get(parameter)
                .filter(|v| v.is_finite())
                .map(|v| ChartPoint::new(p.timestamp, v))
        })
        .collect();

    normalize_timestamps(samples)
}

/// Sort by timestamp and average samples that share one.
pub fn normalize_timestamps(mut samples: Vec<ChartPoint>) -> Vec<ChartPoint> {
    if samples.len() < 2 {
        return samples;
    }

    if !samples.is_sorted_by_key(|p| p.ts) {
        samples.sort_by_key(|p| p.ts);
    }

    let mut out: Vec<ChartPoint> = Vec::with_capacity(samples.len());
    let mut sum = 0.0;
    let mut count = 0usize;

    for point in samples {
        match out.last_mut() {
            Some(last) if last.ts == point.ts => {
                sum += point.value;
                count += 1;
                last.value = sum / count as f64;
            }
            _ => {
                out.push(point);
                sum = point.value;
                count = 1;
            }
        }
    }

    out
}

/// Sorted, de-duplicated sensor ids present in the buffer
pub fn sensor_ids(points: &[RawLogPoint]) -> Vec<String> {
    let mut ids: Vec<String> = points.iter().map(|p| p.sensor_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}
