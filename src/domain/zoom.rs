// Zoom domain model - visible time range, clamping and axis bounds
use serde::{Deserialize, Serialize};

use super::series::ChartPoint;

/// Smallest step for programmatic shifts, in milliseconds
pub const MIN_SHIFT_MS: i64 = 1000;

/// Fraction of the domain width moved by one shift
const SHIFT_FRACTION: f64 = 0.25;

/// A visible time range. Always `from < to`; "full extent" is `Option::None`
/// at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomDomain {
    pub from: i64,
    pub to: i64,
}

impl ZoomDomain {
    pub fn new(from: i64, to: i64) -> Option<Self> {
        (from < to).then_some(Self { from, to })
    }

    /// Domain spanning two edges given in any order
    pub fn spanning(a: i64, b: i64) -> Option<Self> {
        Self::new(a.min(b), a.max(b))
    }

    pub fn width(&self) -> i64 {
        self.to - self.from
    }

    pub fn translate(&self, delta: i64) -> Self {
        Self {
            from: self.from.saturating_add(delta),
            to: self.to.saturating_add(delta),
        }
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.from && ts <= self.to
    }
}

/// Timestamp extent of the loaded series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBounds {
    pub min_ts: i64,
    pub max_ts: i64,
}

impl TimeBounds {
    pub fn new(min_ts: i64, max_ts: i64) -> Self {
        Self { min_ts, max_ts }
    }

    /// Extent of a series sorted by timestamp
    pub fn of(series: &[ChartPoint]) -> Option<Self> {
        match (series.first(), series.last()) {
            (Some(first), Some(last)) => Some(Self::new(first.ts, last.ts)),
            _ => None,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_ts - self.min_ts
    }

    pub fn is_degenerate(&self) -> bool {
        self.max_ts <= self.min_ts
    }

    pub fn encloses(&self, domain: &ZoomDomain) -> bool {
        domain.from >= self.min_ts && domain.to <= self.max_ts
    }

    pub fn as_domain(&self) -> Option<ZoomDomain> {
        ZoomDomain::new(self.min_ts, self.max_ts)
    }
}

/// Fit `candidate` inside `bounds` without changing its width.
///
/// A candidate at least as wide as the bounds snaps to the bounds. Degenerate
/// bounds collapse to full extent (`None`).
pub fn clamp_domain(candidate: ZoomDomain, bounds: TimeBounds) -> Option<ZoomDomain> {
    if bounds.is_degenerate() {
        return None;
    }

    let width = candidate.width();
    if width >= bounds.width() {
        return bounds.as_domain();
    }

    if candidate.from < bounds.min_ts {
        ZoomDomain::new(bounds.min_ts, bounds.min_ts + width)
    } else if candidate.to > bounds.max_ts {
        ZoomDomain::new(bounds.max_ts - width, bounds.max_ts)
    } else {
        Some(candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Move the domain by a quarter of its width (at least one second)
pub fn shift_domain(domain: ZoomDomain, direction: ShiftDirection, bounds: TimeBounds) -> Option<ZoomDomain> {
    let step = ((domain.width() as f64 * SHIFT_FRACTION).round() as i64).max(MIN_SHIFT_MS);
    let delta = match direction {
        ShiftDirection::Left => -step,
        ShiftDirection::Right => step,
    };
    clamp_domain(domain.translate(delta), bounds)
}

/// Points inside the domain, or the whole series for full extent
pub fn clip(series: &[ChartPoint], domain: Option<ZoomDomain>) -> Vec<ChartPoint> {
    match domain {
        Some(d) => series.iter().copied().filter(|p| d.contains(p.ts)).collect(),
        None => series.to_vec(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YAxisBounds {
    pub min: f64,
    pub max: f64,
}

/// Integer Y-axis range around the visible values.
///
/// The range is centred on the midpoint with a half-range of 75% of the
/// spread, and never narrower than two units.
pub fn y_axis_bounds(values: impl IntoIterator<Item = f64>) -> Option<YAxisBounds> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    let mid = (lo + hi) / 2.0;
    let spread = hi - lo;
    let half = if spread > 0.0 {
        spread * 0.75
    } else {
        (mid.abs() * 0.05).max(1.0)
    };

    let min = (mid - half).floor();
    let max = (mid + half).ceil();

    if max - min < 2.0 {
        let center = mid.round();
        return Some(YAxisBounds { min: center - 1.0, max: center + 1.0 });
    }

    Some(YAxisBounds { min, max })
}
