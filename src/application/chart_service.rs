// Chart service - builds the renderable series for the current selection
use serde::Serialize;

use crate::application::viewport::SelectionArea;
use crate::domain::downsample::{downsample, effective_limit};
use crate::domain::reading::{Parameter, RawLogPoint};
use crate::domain::series::{build_series, ChartPoint};
use crate::domain::smoothing::{adaptive_window, smooth};
use crate::domain::window::SeriesWindow;
use crate::domain::zoom::{clip, y_axis_bounds, TimeBounds, YAxisBounds, ZoomDomain};
use crate::infrastructure::config::ChartSettings;

/// Series for one sensor/parameter after reduction and smoothing, before
/// zoom clipping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedSeries {
    pub points: Vec<ChartPoint>,
    pub total_points: usize,
    pub downsampled: bool,
    pub smoothing_window: usize,
}

impl PreparedSeries {
    pub fn bounds(&self) -> Option<TimeBounds> {
        TimeBounds::of(&self.points)
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub sensor_id: Option<String>,
    pub parameter: Parameter,
    pub window: SeriesWindow,
    pub points: Vec<ChartPoint>,
    /// `None` means full extent
    pub zoom: Option<ZoomDomain>,
    pub y_axis: Option<YAxisBounds>,
    pub selection: Option<SelectionArea>,
    pub total_points: usize,
    pub displayed_points: usize,
    pub downsampled: bool,
    pub smoothing_window: usize,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct ChartService {
    settings: ChartSettings,
}

impl ChartService {
    pub fn new(settings: ChartSettings) -> Self {
        Self { settings }
    }

    pub fn prepare(
        &self,
        buffer: &[RawLogPoint],
        sensor_id: &str,
        parameter: Parameter,
        window: SeriesWindow,
    ) -> PreparedSeries {
        let series = build_series(buffer, sensor_id, parameter);
        let total_points = series.len();

        let (series, downsampled) =
            if window == SeriesWindow::All && total_points > self.settings.downsample_threshold {
                let limit = effective_limit(total_points, self.settings.min_budget, self.settings.max_budget);
                (downsample(&series, limit, self.settings.reduction), true)
            } else {
                (series, false)
            };

        let smoothing_window = adaptive_window(series.len());
        let points = if self.settings.smoothing {
            smooth(&series, smoothing_window)
        } else {
            series
        };

        tracing::debug!(
            "Prepared {} {} series: {} raw points, {} kept, window {}",
            sensor_id,
            parameter,
            total_points,
            points.len(),
            smoothing_window
        );

        PreparedSeries {
            points,
            total_points,
            downsampled,
            smoothing_window,
        }
    }

    /// Clip a prepared series to the zoom domain and derive the Y axis from
    /// what remains visible.
    pub fn view(&self, prepared: &PreparedSeries, zoom: Option<ZoomDomain>) -> VisibleSeries {
        let points = clip(&prepared.points, zoom);
        let y_axis = y_axis_bounds(points.iter().map(|p| p.value));
        VisibleSeries { points, y_axis }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleSeries {
    pub points: Vec<ChartPoint>,
    pub y_axis: Option<YAxisBounds>,
}
