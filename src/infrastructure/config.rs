// Application configuration - file and environment settings
use serde::Deserialize;

use crate::domain::downsample::ReductionMode;
use crate::domain::health::Thresholds;
use crate::domain::window::SeriesWindow;

pub const MIN_BUFFER_CAP: usize = 3000;
pub const MAX_BUFFER_CAP: usize = 20_000;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub live: LiveSettings,
    pub chart: ChartSettings,
    pub server: ServerSettings,
    pub thresholds: Thresholds,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceSettings {
    pub endpoints: Vec<String>,
    pub timeout_ms: u64,
    pub cache_bust: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://127.0.0.1:3001/api/sensors-log".to_string()],
            timeout_ms: 7000,
            cache_bust: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveSettings {
    pub poll_interval_secs: u64,
    pub buffer_cap: usize,
    pub default_window: SeriesWindow,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            buffer_cap: MIN_BUFFER_CAP,
            default_window: SeriesWindow::Day,
        }
    }
}

impl LiveSettings {
    pub fn effective_buffer_cap(&self) -> usize {
        self.buffer_cap.clamp(MIN_BUFFER_CAP, MAX_BUFFER_CAP)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    /// Raw point count above which the "all" window is downsampled
    pub downsample_threshold: usize,
    pub min_budget: usize,
    pub max_budget: usize,
    pub reduction: ReductionMode,
    pub smoothing: bool,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            downsample_threshold: 1200,
            min_budget: 1200,
            max_budget: 4000,
            reduction: ReductionMode::MinMax,
            smoothing: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Load `config/field-telemetry.{toml,...}` if present, then
/// `FIELD_TELEMETRY__SECTION__KEY` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/field-telemetry").required(false))
        .add_source(
            config::Environment::with_prefix("FIELD_TELEMETRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("source.endpoints"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
