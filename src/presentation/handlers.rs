// HTTP request handlers
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::chart_service::ChartView;
use crate::application::live_session::{LiveSessionHandle, SensorSummary, SessionClosed, SessionCommand};
use crate::application::viewport::PointerEvent;
use crate::domain::reading::Parameter;
use crate::domain::window::SeriesWindow;
use crate::domain::zoom::ShiftDirection;
use crate::presentation::app_state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/sensors", get(list_sensors))
        .route("/parameters", get(list_parameters))
        .route("/chart", get(chart))
        .route("/selection", post(update_selection))
        .route("/viewport/pointer", post(pointer))
        .route("/viewport/frame", post(animation_frame))
        .route("/viewport/shift/:direction", post(shift))
        .route("/viewport/reset", post(reset_zoom))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for SessionClosed {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Request failed: {}", self);
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    pub sensor: Option<String>,
    pub parameter: Option<Parameter>,
    pub window: Option<SeriesWindow>,
}

#[derive(Debug, Serialize)]
pub struct ParameterInfo {
    pub key: &'static str,
    pub label: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Known sensors with their latest health assessment
pub async fn list_sensors(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SensorSummary>>, SessionClosed> {
    Ok(Json(state.session.sensors().await?))
}

pub async fn list_parameters() -> Json<Vec<ParameterInfo>> {
    Json(parameter_catalog())
}

/// Current chart frame for the active selection and zoom
pub async fn chart(State(state): State<Arc<AppState>>) -> Result<Json<ChartView>, SessionClosed> {
    Ok(Json(state.session.view().await?))
}

pub async fn update_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<ChartView>, SessionClosed> {
    apply_selection(&state.session, request).await?;
    Ok(Json(state.session.view().await?))
}

/// Feed one pointer event to the viewport.
///
/// Pan moves are coalesced: the translated domain only becomes the zoom on
/// the next `POST /viewport/frame`, or on pointer up/leave. A renderer that
/// never posts frames sees the pan land when the drag ends.
pub async fn pointer(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PointerEvent>,
) -> Result<Json<ChartView>, SessionClosed> {
    state.session.send(SessionCommand::Pointer(event)).await?;
    Ok(Json(state.session.view().await?))
}

pub async fn animation_frame(State(state): State<Arc<AppState>>) -> Result<Json<ChartView>, SessionClosed> {
    state.session.send(SessionCommand::AnimationFrame).await?;
    Ok(Json(state.session.view().await?))
}

pub async fn shift(
    Path(direction): Path<ShiftDirection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartView>, SessionClosed> {
    state.session.send(SessionCommand::Shift(direction)).await?;
    Ok(Json(state.session.view().await?))
}

pub async fn reset_zoom(State(state): State<Arc<AppState>>) -> Result<Json<ChartView>, SessionClosed> {
    state.session.send(SessionCommand::ResetZoom).await?;
    Ok(Json(state.session.view().await?))
}

async fn apply_selection(session: &LiveSessionHandle, request: SelectionRequest) -> Result<(), SessionClosed> {
    if let Some(window) = request.window {
        session.send(SessionCommand::SelectWindow(window)).await?;
    }
    if let Some(sensor) = request.sensor.filter(|s| !s.trim().is_empty()) {
        session.send(SessionCommand::SelectSensor(sensor.trim().to_string())).await?;
    }
    if let Some(parameter) = request.parameter {
        session.send(SessionCommand::SelectParameter(parameter)).await?;
    }
    Ok(())
}

fn parameter_catalog() -> Vec<ParameterInfo> {
    Parameter::ALL
        .iter()
        .map(|p| ParameterInfo { key: p.key(), label: p.label() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_request_parses_wire_names() {
        let request: SelectionRequest =
            serde_json::from_str(r#"{"sensor":"7","parameter":"aht_temp","window":"7d"}"#).unwrap();
        assert_eq!(request.sensor.as_deref(), Some("7"));
        assert_eq!(request.parameter, Some(Parameter::AhtTemp));
        assert_eq!(request.window, Some(SeriesWindow::Week));

        let empty: SelectionRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.sensor.is_none() && empty.parameter.is_none() && empty.window.is_none());
    }

    #[test]
    fn test_pointer_event_defaults() {
        let event: PointerEvent = serde_json::from_str(r#"{"kind":"down","ts":1700000000000}"#).unwrap();
        assert_eq!(event.ts, Some(1_700_000_000_000.0));
        assert_eq!(event.px, None);
        assert!(!event.modifier);
    }

    #[test]
    fn test_parameter_catalog_matches_log_keys() {
        let catalog = parameter_catalog();
        assert_eq!(catalog.len(), Parameter::ALL.len());
        assert_eq!(catalog[0].key, "m1");
        assert!(catalog.iter().any(|p| p.key == "bmp_pressure"));
    }

    #[test]
    fn test_shift_direction_path_names() {
        let left: ShiftDirection = serde_json::from_str(r#""left""#).unwrap();
        assert_eq!(left, ShiftDirection::Left);
    }
}
