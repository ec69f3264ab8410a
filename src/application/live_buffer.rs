// Live buffer - reconciles each polled log snapshot with the in-memory view
use std::fmt;

use serde::Serialize;

use crate::application::log_source::FetchError;
use crate::domain::reading::RawLogPoint;
use crate::domain::window::SeriesWindow;

/// Last transition of the polling state machine, rendered as status text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedStatus {
    Loading,
    HistoryLoaded,
    Empty,
    NoNewData,
    NewPoints { count: usize },
    Error { message: String },
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Loading => f.write_str("loading log…"),
            FeedStatus::HistoryLoaded => f.write_str("history loaded, live updates on"),
            FeedStatus::Empty => f.write_str("log empty, waiting for data"),
            FeedStatus::NoNewData => f.write_str("live: no new data yet"),
            FeedStatus::NewPoints { count } => write!(f, "live: +{} new points", count),
            FeedStatus::Error { message } => write!(f, "load error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub first_load: bool,
    pub buffered: usize,
    pub new_points: usize,
}

#[derive(Debug, Clone)]
pub struct LiveBuffer {
    window: SeriesWindow,
    cap: usize,
    points: Vec<RawLogPoint>,
    watermark: Option<i64>,
    generation: u64,
    status: FeedStatus,
    last_fetch_at: Option<i64>,
}

impl LiveBuffer {
    pub fn new(window: SeriesWindow, cap: usize) -> Self {
        Self {
            window,
            cap: cap.max(1),
            points: Vec::new(),
            watermark: None,
            generation: 0,
            status: FeedStatus::Loading,
            last_fetch_at: None,
        }
    }

    pub fn window(&self) -> SeriesWindow {
        self.window
    }

    pub fn points(&self) -> &[RawLogPoint] {
        &self.points
    }

    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn last_fetch_at(&self) -> Option<i64> {
        self.last_fetch_at
    }

    /// Start over for a new window. Results tagged with an older generation
    /// are ignored from now on.
    pub fn reset(&mut self, window: SeriesWindow) -> u64 {
        self.window = window;
        self.points.clear();
        self.watermark = None;
        self.status = FeedStatus::Loading;
        self.generation += 1;
        self.generation
    }

    /// Replace the buffer with a freshly parsed snapshot.
    ///
    /// Returns `None` when the snapshot belongs to a superseded generation.
    pub fn apply_snapshot(&mut self, generation: u64, parsed: Vec<RawLogPoint>, now_ms: i64) -> Option<RefreshOutcome> {
        if generation != self.generation {
            return None;
        }

        let mut fresh = self.window.filter(parsed, now_ms);
        let newest = fresh.iter().map(|p| p.timestamp).max();
        self.last_fetch_at = Some(now_ms);

        let outcome = match self.watermark {
            None => {
                self.status = if fresh.is_empty() { FeedStatus::Empty } else { FeedStatus::HistoryLoaded };
                self.watermark = newest;
                RefreshOutcome { first_load: true, buffered: 0, new_points: fresh.len() }
            }
            Some(mark) => {
                let count = fresh.iter().filter(|p| p.timestamp > mark).count();
                self.status = if count == 0 { FeedStatus::NoNewData } else { FeedStatus::NewPoints { count } };
                self.watermark = newest.map_or(Some(mark), |n| Some(n.max(mark)));
                RefreshOutcome { first_load: false, buffered: 0, new_points: count }
            }
        };

        if fresh.len() > self.cap {
            fresh.drain(..fresh.len() - self.cap);
        }
        self.points = fresh;

        Some(RefreshOutcome { buffered: self.points.len(), ..outcome })
    }

    /// Record a failed fetch; the buffer keeps its last good contents.
    pub fn apply_failure(&mut self, generation: u64, error: &FetchError) -> bool {
        if generation != self.generation {
            return false;
        }
        self.status = FeedStatus::Error { message: error.to_string() };
        true
    }
}
