// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::client::RequestClient;
use crate::presenter::{RenderFrame, SharedPresenter};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) presenter: SharedPresenter,
    pub(crate) client: Arc<RequestClient>,
    pub(crate) frames_tx: broadcast::Sender<RenderFrame>,
}

pub fn app(
    presenter: SharedPresenter,
    client: Arc<RequestClient>,
    frames_tx: broadcast::Sender<RenderFrame>,
) -> Router {
    let state = AppState {
        presenter,
        client,
        frames_tx,
    };
    Router::new()
        .route("/", get(|| async { "watchboard: system-watch console" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/charts", get(http::charts_handler)) // GET /api/charts
        .route("/api/charts/{chart}", get(http::chart_handler)) // GET /api/charts/{chart}
        .route("/api/annotations", get(http::annotations_handler)) // GET /api/annotations?chart=
        .route("/api/memos", post(http::memo_handler)) // POST /api/memos
        .route("/ws/charts", get(ws::ws_charts)) // WS /ws/charts
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
