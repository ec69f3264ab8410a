// Live session - polling refresh loop owning the buffer, selection and viewport
//
// All state lives inside one task. Timer ticks, fetch completions and
// commands from the presentation layer are handled one at a time, so there
// is never more than one writer.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::chart_service::{ChartService, ChartView, PreparedSeries};
use crate::application::live_buffer::LiveBuffer;
use crate::application::log_source::{FetchError, LogSource};
use crate::application::viewport::{PointerEvent, ViewportController};
use crate::domain::health::{latest_reading, SensorHealth, Thresholds};
use crate::domain::reading::Parameter;
use crate::domain::series::sensor_ids;
use crate::domain::window::SeriesWindow;
use crate::domain::zoom::ShiftDirection;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::log_parser::{parse_text_counted, ParsedLog};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub buffer_cap: usize,
    pub window: SeriesWindow,
    pub parameter: Parameter,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.live.poll_interval_secs.max(1)),
            fetch_timeout: Duration::from_millis(config.source.timeout_ms),
            buffer_cap: config.live.effective_buffer_cap(),
            window: config.live.default_window,
            parameter: Parameter::M1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub id: String,
    pub last_seen: Option<i64>,
    pub health: Option<SensorHealth>,
}

#[derive(Debug)]
pub enum SessionCommand {
    SelectWindow(SeriesWindow),
    SelectSensor(String),
    SelectParameter(Parameter),
    Pointer(PointerEvent),
    AnimationFrame,
    Shift(ShiftDirection),
    ResetZoom,
    View(oneshot::Sender<ChartView>),
    Sensors(oneshot::Sender<Vec<SensorSummary>>),
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
#[error("live session is no longer running")]
pub struct SessionClosed;

struct FetchCompletion {
    generation: u64,
    result: Result<ParsedLog, FetchError>,
}

/// Owner's handle on a running session. Dropping it stops the poll timer.
pub struct LiveSessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl LiveSessionHandle {
    pub fn spawn(
        source: Arc<dyn LogSource>,
        chart_service: ChartService,
        thresholds: Thresholds,
        settings: SessionSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let session = LiveSession::new(source, chart_service, thresholds, settings);
        let task = tokio::spawn(session.run(rx));
        Self { commands: tx, task }
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }

    pub async fn view(&self) -> Result<ChartView, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::View(tx)).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn sensors(&self) -> Result<Vec<SensorSummary>, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Sensors(tx)).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Stop polling and wait for the session task to finish
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        let _ = (&mut self.task).await;
    }
}

impl Drop for LiveSessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct LiveSession {
    source: Arc<dyn LogSource>,
    chart_service: ChartService,
    thresholds: Thresholds,
    settings: SessionSettings,
    buffer: LiveBuffer,
    sensor_id: Option<String>,
    parameter: Parameter,
    viewport: ViewportController,
    prepared: PreparedSeries,
    in_flight: Option<u64>,
}

impl LiveSession {
    fn new(
        source: Arc<dyn LogSource>,
        chart_service: ChartService,
        thresholds: Thresholds,
        settings: SessionSettings,
    ) -> Self {
        let mut buffer = LiveBuffer::new(settings.window, settings.buffer_cap);
        buffer.reset(settings.window);
        let parameter = settings.parameter;

        Self {
            source,
            chart_service,
            thresholds,
            settings,
            buffer,
            sensor_id: None,
            parameter,
            viewport: ViewportController::new(),
            prepared: PreparedSeries::default(),
            in_flight: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        let (done_tx, mut done_rx) = mpsc::channel::<FetchCompletion>(4);
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Live session started: window {}, polling every {:?}",
            self.buffer.window(),
            self.settings.poll_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.start_fetch(&done_tx),
                Some(done) = done_rx.recv() => self.finish_fetch(done),
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => {
                        if self.handle(command) {
                            ticker.reset_immediately();
                        }
                    }
                },
            }
        }

        self.viewport.teardown();
        tracing::info!("Live session stopped");
    }

    fn start_fetch(&mut self, done: &mpsc::Sender<FetchCompletion>) {
        let generation = self.buffer.generation();
        if self.in_flight == Some(generation) {
            tracing::debug!("Previous fetch still running, skipping tick");
            return;
        }
        self.in_flight = Some(generation);

        let source = self.source.clone();
        let timeout = self.settings.fetch_timeout;
        let done = done.clone();

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, source.fetch_text()).await {
                Ok(Ok(text)) => Ok(parse_text_counted(&text)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(FetchError::Timeout { url: "log source".to_string() }),
            };
            let _ = done.send(FetchCompletion { generation, result }).await;
        });
    }

    fn finish_fetch(&mut self, done: FetchCompletion) {
        if self.in_flight == Some(done.generation) {
            self.in_flight = None;
        }

        match done.result {
            Ok(parsed) => {
                if parsed.dropped > 0 {
                    tracing::debug!("Dropped {} malformed log lines", parsed.dropped);
                }
                let now = Utc::now().timestamp_millis();
                let Some(outcome) = self.buffer.apply_snapshot(done.generation, parsed.points, now) else {
                    tracing::debug!("Discarding stale fetch result (generation {})", done.generation);
                    return;
                };

                tracing::debug!(
                    "Refreshed: {} buffered, {} new, first load: {}",
                    outcome.buffered,
                    outcome.new_points,
                    outcome.first_load
                );

                if self.sensor_id.is_none() {
                    self.sensor_id = self.buffer.points().last().map(|p| p.sensor_id.clone());
                }
                self.invalidate();
            }
            Err(e) => {
                if self.buffer.apply_failure(done.generation, &e) {
                    tracing::warn!("Log fetch failed: {}", e);
                }
            }
        }
    }

    /// Returns true when the poll timer should fire again immediately
    fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SelectWindow(window) => {
                let generation = self.buffer.reset(window);
                self.viewport.reset();
                self.invalidate();
                tracing::info!("Window switched to {} (generation {})", window, generation);
                return true;
            }
            SessionCommand::SelectSensor(id) => {
                self.sensor_id = Some(id);
                self.viewport.reset();
                self.invalidate();
            }
            SessionCommand::SelectParameter(parameter) => {
                self.parameter = parameter;
                self.viewport.reset();
                self.invalidate();
            }
            SessionCommand::Pointer(event) => self.viewport.apply(event),
            SessionCommand::AnimationFrame => {
                self.viewport.animation_frame();
            }
            SessionCommand::Shift(direction) => self.viewport.shift(direction),
            SessionCommand::ResetZoom => self.viewport.reset(),
            SessionCommand::View(reply) => {
                let _ = reply.send(self.chart_view());
            }
            SessionCommand::Sensors(reply) => {
                let _ = reply.send(self.sensor_summaries());
            }
            SessionCommand::Shutdown => {}
        }
        false
    }

    /// Rebuild the prepared series and re-validate the zoom against it
    fn invalidate(&mut self) {
        let prepared = match &self.sensor_id {
            Some(id) => self.chart_service.prepare(self.buffer.points(), id, self.parameter, self.buffer.window()),
            None => PreparedSeries::default(),
        };
        self.viewport.set_bounds(prepared.bounds());
        self.prepared = prepared;
    }

    fn chart_view(&self) -> ChartView {
        let zoom = self.viewport.zoom();
        let prepared = &self.prepared;
        let visible = self.chart_service.view(prepared, zoom);

        ChartView {
            sensor_id: self.sensor_id.clone(),
            parameter: self.parameter,
            window: self.buffer.window(),
            displayed_points: visible.points.len(),
            points: visible.points,
            zoom,
            y_axis: visible.y_axis,
            selection: self.viewport.selection(),
            total_points: prepared.total_points,
            downsampled: prepared.downsampled,
            smoothing_window: prepared.smoothing_window,
            status: self.buffer.status().to_string(),
        }
    }

    fn sensor_summaries(&self) -> Vec<SensorSummary> {
        let points = self.buffer.points();
        sensor_ids(points)
            .into_iter()
            .map(|id| {
                let latest = latest_reading(points, &id);
                SensorSummary {
                    last_seen: latest.map(|p| p.timestamp),
                    health: latest.map(|p| self.thresholds.assess(p)),
                    id,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_buffer::FeedStatus;
    use crate::application::viewport::PointerKind;
    use crate::infrastructure::config::ChartSettings;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const LOG: &str = "\
2026-02-07 21:38:55 >>> 1.2.3.4 >>> host/path?id=7&m1=40&charge=3.9
2026-02-07 21:39:05 >>> 1.2.3.4 >>> host/path?id=7&m1=42&charge=3.8
2026-02-07 21:39:10 >>> 1.2.3.4 >>> host/path?id=9&m1=12&charge=3.2
";

    /// Replays scripted responses; repeats the last one once exhausted
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<String, u16>>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<&str, u16>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(|r| r.map(str::to_string)).collect()),
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::from(vec![Ok(LOG.to_string())])),
                delay,
            })
        }
    }

    #[async_trait]
    impl LogSource for ScriptedSource {
        async fn fetch_text(&self) -> Result<String, FetchError> {
            tokio::time::sleep(self.delay).await;
            let next = {
                let mut queue = self.responses.lock().unwrap();
                if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
            };
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(status)) => Err(FetchError::Status { url: "scripted".to_string(), status }),
                None => Err(FetchError::NoEndpoints),
            }
        }
    }

    fn settings(window: SeriesWindow) -> SessionSettings {
        SessionSettings {
            poll_interval: Duration::from_millis(20),
            fetch_timeout: Duration::from_secs(2),
            buffer_cap: 3000,
            window,
            parameter: Parameter::M1,
        }
    }

    fn spawn(source: Arc<dyn LogSource>, settings: SessionSettings) -> LiveSessionHandle {
        LiveSessionHandle::spawn(source, ChartService::new(ChartSettings::default()), Thresholds::default(), settings)
    }

    async fn wait_for_status(handle: &LiveSessionHandle, predicate: impl Fn(&str) -> bool) -> ChartView {
        for _ in 0..200 {
            let view = handle.view().await.unwrap();
            if predicate(&view.status) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("status never matched");
    }

    #[tokio::test]
    async fn test_first_fetch_selects_latest_sensor() {
        let handle = spawn(ScriptedSource::new(vec![Ok(LOG)]), settings(SeriesWindow::All));

        let view = wait_for_status(&handle, |s| s != "loading log…").await;
        assert_eq!(view.sensor_id.as_deref(), Some("9"));

        handle.send(SessionCommand::SelectSensor("7".to_string())).await.unwrap();
        let view = handle.view().await.unwrap();
        let values: Vec<f64> = view.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![40.0, 42.0]);
        assert_eq!(view.total_points, 2);
        assert_eq!(view.displayed_points, 2);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_failure_keeps_loaded_data() {
        let handle = spawn(ScriptedSource::new(vec![Ok(LOG), Err(503)]), settings(SeriesWindow::All));

        let view = wait_for_status(&handle, |s| s.starts_with("load error")).await;
        assert_eq!(view.status, "load error: scripted answered HTTP 503");
        assert_eq!(view.total_points, 1);

        let sensors = handle.sensors().await.unwrap();
        let ids: Vec<&str> = sensors.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "9"]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let mut s = settings(SeriesWindow::All);
        s.fetch_timeout = Duration::from_millis(30);
        let handle = spawn(ScriptedSource::slow(Duration::from_secs(5)), s);

        let view = wait_for_status(&handle, |s| s.starts_with("load error")).await;
        assert!(view.status.contains("timed out"));
        assert!(view.points.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_window_switch_resets_zoom_and_refetches() {
        let handle = spawn(ScriptedSource::new(vec![Ok(LOG)]), settings(SeriesWindow::All));
        handle.send(SessionCommand::SelectSensor("7".to_string())).await.unwrap();
        wait_for_status(&handle, |s| s != "loading log…").await;

        let view = handle.view().await.unwrap();
        let (first, last) = (view.points[0].ts, view.points[1].ts);
        for (kind, ts) in [(PointerKind::Down, first), (PointerKind::Move, first + 5_000), (PointerKind::Up, first + 5_000)] {
            let event = PointerEvent { kind, ts: Some(ts as f64), px: None, plot_width: None, modifier: false };
            handle.send(SessionCommand::Pointer(event)).await.unwrap();
        }
        let zoomed = handle.view().await.unwrap();
        assert_eq!(zoomed.zoom.map(|z| (z.from, z.to)), Some((first, first + 5_000)));
        assert_eq!(zoomed.displayed_points, 1);
        assert!(last > first);

        handle.send(SessionCommand::SelectWindow(SeriesWindow::Week)).await.unwrap();
        let view = handle.view().await.unwrap();
        assert_eq!(view.zoom, None);
        assert_eq!(view.window, SeriesWindow::Week);

        handle.shutdown().await;
    }

    #[test]
    fn test_stale_result_after_reset_is_ignored() {
        let source = ScriptedSource::new(vec![Ok(LOG)]);
        let mut session = LiveSession::new(
            source,
            ChartService::new(ChartSettings::default()),
            Thresholds::default(),
            settings(SeriesWindow::All),
        );
        let stale_generation = session.buffer.generation();
        session.handle(SessionCommand::SelectWindow(SeriesWindow::Day));

        session.finish_fetch(FetchCompletion {
            generation: stale_generation,
            result: Ok(parse_text_counted(LOG)),
        });

        assert!(session.buffer.points().is_empty());
        assert_eq!(session.buffer.status(), &FeedStatus::Loading);
        assert_eq!(session.sensor_id, None);
    }
}
