// Downsampling - reduce a series to a bounded number of renderable points
use serde::{Deserialize, Serialize};

use super::series::ChartPoint;

/// Extra points the min/max reduction may emit beyond its budget for the two
/// forced endpoints.
pub const ENDPOINT_SLACK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// Keep the extrema of every bucket so spikes survive
    #[default]
    MinMax,
    /// Replace every bucket by its mean, for trend reading
    Average,
}

/// Point budget for a series of `n` points, growing with log2(n) between
/// `min_budget` and `max_budget`.
pub fn effective_limit(n: usize, min_budget: usize, max_budget: usize) -> usize {
    if n == 0 {
        return min_budget;
    }
    let scaled = (900.0 + (n as f64).log2() * 180.0).round() as usize;
    scaled.clamp(min_budget, max_budget.max(min_budget))
}

pub fn downsample(series: &[ChartPoint], max_points: usize, mode: ReductionMode) -> Vec<ChartPoint> {
    match mode {
        ReductionMode::MinMax => downsample_min_max(series, max_points),
        ReductionMode::Average => downsample_average(series, max_points),
    }
}

/// Min/max-per-bucket reduction.
///
/// Each bucket contributes its minimum and maximum in their original order,
/// the first and last input points are always kept verbatim, and a uniform
/// stride is applied only if the result still overshoots the budget.
pub fn downsample_min_max(series: &[ChartPoint], max_points: usize) -> Vec<ChartPoint> {
    let n = series.len();
    if max_points == 0 || n <= max_points || n < 3 {
        return series.to_vec();
    }

    let bucket_count = max_points.div_ceil(2);
    let bucket_size = n.div_ceil(bucket_count);
    let last_index = n - 1;

    let mut picked: Vec<usize> = Vec::with_capacity(max_points + ENDPOINT_SLACK);
    picked.push(0);

    for start in (0..n).step_by(bucket_size) {
        let end = (start + bucket_size).min(n);
        let (min_idx, max_idx) = extrema(series, start, end);

        let (a, b) = if min_idx <= max_idx { (min_idx, max_idx) } else { (max_idx, min_idx) };
        for idx in [a, b] {
            if idx == 0 || idx == last_index {
                continue;
            }
            if picked.last() != Some(&idx) {
                picked.push(idx);
            }
        }
    }

    picked.push(last_index);

    let mut out: Vec<ChartPoint> = picked.into_iter().map(|i| series[i]).collect();

    if out.len() > max_points + ENDPOINT_SLACK {
        let stride = out.len().div_ceil(max_points);
        let last = out[out.len() - 1];
        out = out.into_iter().step_by(stride).collect();
        if out.last().map(|p| p.ts) != Some(last.ts) {
            out.push(last);
        }
    }

    out
}

fn extrema(series: &[ChartPoint], start: usize, end: usize) -> (usize, usize) {
    let mut min_idx = start;
    let mut max_idx = start;
    for i in start + 1..end {
        if series[i].value < series[min_idx].value {
            min_idx = i;
        }
        if series[i].value > series[max_idx].value {
            max_idx = i;
        }
    }
    (min_idx, max_idx)
}

/// Bucket-mean reduction with exact first and last points.
pub fn downsample_average(series: &[ChartPoint], max_points: usize) -> Vec<ChartPoint> {
    let n = series.len();
    if max_points < 3 || n <= max_points {
        return series.to_vec();
    }

    let interior = &series[1..n - 1];
    let bucket_size = interior.len().div_ceil(max_points - 2);

    let mut out = Vec::with_capacity(max_points);
    out.push(series[0]);

    for chunk in interior.chunks(bucket_size) {
        let len = chunk.len();
        let ts_sum: i128 = chunk.iter().map(|p| p.ts as i128).sum();
        let value_sum: f64 = chunk.iter().map(|p| p.value).sum();
        out.push(ChartPoint::new((ts_sum / len as i128) as i64, value_sum / len as f64));
    }

    out.push(series[n - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<ChartPoint> {
        (0..n)
            .map(|i| ChartPoint::new(i as i64 * 1000, (i as f64 / 25.0).sin() * 10.0))
            .collect()
    }

    #[test]
    fn test_effective_limit_scales_sublinearly() {
        assert_eq!(effective_limit(1, 1200, 4000), 1200);
        assert_eq!(effective_limit(100, 1200, 4000), 2096);
        assert_eq!(effective_limit(10_000, 1200, 4000), 3292);
        assert_eq!(effective_limit(usize::MAX, 1200, 4000), 4000);
    }

    #[test]
    fn test_short_series_unchanged() {
        let series = wave(50);
        assert_eq!(downsample_min_max(&series, 100), series);
        assert_eq!(downsample_average(&series, 100), series);
        assert_eq!(downsample_min_max(&series, 50), series);
    }

    #[test]
    fn test_min_max_respects_budget_and_endpoints() {
        let series = wave(10_000);
        let out = downsample_min_max(&series, 1200);

        assert!(out.len() <= 1200 + ENDPOINT_SLACK);
        assert_eq!(out.first(), series.first());
        assert_eq!(out.last(), series.last());
        assert!(out.windows(2).all(|w| w[0].ts < w[1].ts));
    }

    #[test]
    fn test_spike_survives_anywhere() {
        for position in [1, 777, 5_000, 9_998] {
            let mut series: Vec<ChartPoint> =
                (0..10_000).map(|i| ChartPoint::new(i as i64, 1.0)).collect();
            series[position].value = 500.0;

            let out = downsample_min_max(&series, 1200);
            assert!(
                out.iter().any(|p| p.ts == position as i64 && p.value == 500.0),
                "spike at {} lost",
                position
            );
        }
    }

    #[test]
    fn test_max_emitted_before_later_min() {
        let series = vec![
            ChartPoint::new(0, 0.0),
            ChartPoint::new(1, 9.0),
            ChartPoint::new(2, -9.0),
            ChartPoint::new(3, 0.0),
            ChartPoint::new(4, 0.0),
            ChartPoint::new(5, 0.0),
        ];

        let out = downsample_min_max(&series, 2);
        let ts: Vec<i64> = out.iter().map(|p| p.ts).collect();
        assert_eq!(ts, vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_stride_fallback_keeps_last_point() {
        // Odd budget with a zigzag: every bucket yields two interior extrema.
        let mut series: Vec<ChartPoint> = (0..30)
            .map(|i| ChartPoint::new(i, if i % 2 == 0 { i as f64 } else { -(i as f64) }))
            .collect();
        series[29].value = 0.0;

        let out = downsample_min_max(&series, 5);
        let ts: Vec<i64> = out.iter().map(|p| p.ts).collect();
        assert_eq!(ts, vec![0, 9, 19, 28, 29]);
    }

    #[test]
    fn test_average_mode_keeps_exact_endpoints() {
        let series = wave(5_000);
        let out = downsample_average(&series, 500);

        assert!(out.len() <= 500);
        assert_eq!(out.first(), series.first());
        assert_eq!(out.last(), series.last());
        assert!(out.windows(2).all(|w| w[0].ts < w[1].ts));
    }
}
