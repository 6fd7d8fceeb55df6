// GET/POST handlers: version, chart configurations, annotations, memos

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::client::RequestError;
use crate::models::{Annotation, ChartScope};
use crate::presenter::ChartKind;
use crate::presenter::editor::{MemoEditor, MemoError, save_memo};
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/charts: both system-watch charts with current memo overlays.
pub(super) async fn charts_handler(State(state): State<AppState>) -> impl IntoResponse {
    let presenter = state.presenter.read().await;
    Json(json!({
        "resource": presenter.resource_chart(),
        "network": presenter.network_chart(),
    }))
}

/// GET /api/charts/{chart}
pub(super) async fn chart_handler(
    State(state): State<AppState>,
    Path(chart): Path<String>,
) -> Response {
    let kind: ChartKind = match chart.parse() {
        Ok(kind) => kind,
        Err(e) => return error_response(StatusCode::NOT_FOUND, &e.to_string()),
    };
    let presenter = state.presenter.read().await;
    Json(presenter.chart(kind)).into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct AnnotationsQuery {
    chart: ChartScope,
}

/// GET /api/annotations?chart=resource|network|both
pub(super) async fn annotations_handler(
    State(state): State<AppState>,
    Query(query): Query<AnnotationsQuery>,
) -> impl IntoResponse {
    let presenter = state.presenter.read().await;
    let annotations: Vec<Annotation> = presenter
        .store()
        .all_for_chart(query.chart)
        .cloned()
        .collect();
    Json(annotations)
}

#[derive(Debug, Deserialize)]
pub(super) struct MemoRequest {
    chart: ChartKind,
    /// x value (epoch milliseconds) of the clicked point.
    timestamp: i64,
    description: String,
    #[serde(default)]
    label: Option<String>,
}

/// POST /api/memos: selects a point and saves a memo for it in one step.
pub(super) async fn memo_handler(
    State(state): State<AppState>,
    Json(req): Json<MemoRequest>,
) -> Response {
    let point = state.presenter.read().await.point_at(req.chart, req.timestamp);
    let Some(point) = point else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("no memo point at {} on chart {}", req.timestamp, req.chart),
        );
    };

    let mut editor = MemoEditor::new();
    if let Err(e) = editor.open(point) {
        return error_response(StatusCode::CONFLICT, &e.to_string());
    }
    match save_memo(
        &mut editor,
        state.presenter.as_ref(),
        &state.client,
        &req.description,
        req.label,
    )
    .await
    {
        Ok(annotation) => (StatusCode::CREATED, Json(annotation)).into_response(),
        Err(e) => error_response(memo_error_status(&e), &e.to_string()),
    }
}

fn memo_error_status(e: &MemoError) -> StatusCode {
    match e {
        MemoError::Validation(_) => StatusCode::BAD_REQUEST,
        MemoError::Request(RequestError::Configuration) => StatusCode::SERVICE_UNAVAILABLE,
        MemoError::Request(_) => StatusCode::BAD_GATEWAY,
        MemoError::NotOpen | MemoError::Busy => StatusCode::CONFLICT,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
