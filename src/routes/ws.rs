// WebSocket chart session: initial render, redraw stream, and the memo modal commands

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::presenter::editor::{MemoEditor, MemoError, save_memo};
use crate::presenter::{ChartKind, RenderFrame};

const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands a page sends while the operator edits a memo.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientCommand {
    /// Point click on a chart, identified by the point's x value.
    Select { chart: ChartKind, timestamp: i64 },
    Save {
        description: String,
        #[serde(default)]
        label: Option<String>,
    },
    Cancel,
}

pub(super) async fn ws_charts(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        // Subscribe before the initial render so no redraw slips in between.
        let rx = state.frames_tx.subscribe();
        if let Err(e) = stream_charts(socket, rx, state).await {
            tracing::info!("Chart stream error: {}", e);
        }
    })
}

async fn stream_charts(
    socket: WebSocket,
    mut rx: broadcast::Receiver<RenderFrame>,
    state: AppState,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to chart stream");

    let (mut sender, mut receiver) = socket.split();

    let initial: Vec<RenderFrame> = {
        let presenter = state.presenter.read().await;
        ChartKind::SYSTEM_WATCH
            .iter()
            .map(|&kind| RenderFrame::new(kind, presenter.chart(kind)))
            .collect()
    };
    for frame in &initial {
        if !send_json(&mut sender, frame).await? {
            return Ok(());
        }
    }

    let mut editor = MemoEditor::new();
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(message)) = incoming else {
                    break;
                };
                match message {
                    Message::Text(text) => {
                        let reply = handle_command(text.as_str(), &mut editor, &state).await;
                        if !send_json(&mut sender, &reply).await? {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if !send_json(&mut sender, &frame).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/charts client lagged, skipped {} frames", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Applies one command to the session's editor and builds the reply frame.
async fn handle_command(text: &str, editor: &mut MemoEditor, state: &AppState) -> Value {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => return error_frame(&format!("invalid command: {e}")),
    };
    match command {
        ClientCommand::Select { chart, timestamp } => {
            let point = state.presenter.read().await.point_at(chart, timestamp);
            let Some(point) = point else {
                return error_frame(&format!("no memo point at {timestamp} on chart {chart}"));
            };
            match editor.open(point) {
                Ok(()) => modal_frame(editor, None),
                Err(e) => error_frame(&e.to_string()),
            }
        }
        ClientCommand::Save { description, label } => {
            let outcome = save_memo(
                editor,
                state.presenter.as_ref(),
                &state.client,
                &description,
                label,
            )
            .await;
            match outcome {
                Ok(annotation) => modal_frame(editor, Some(json!(annotation))),
                Err(e @ (MemoError::NotOpen | MemoError::Busy)) => error_frame(&e.to_string()),
                Err(_) => modal_frame(editor, None),
            }
        }
        ClientCommand::Cancel => {
            editor.cancel();
            modal_frame(editor, None)
        }
    }
}

fn modal_frame(editor: &MemoEditor, annotation: Option<Value>) -> Value {
    let mut frame = json!({ "type": "modal", "editor": editor.state() });
    if let Some(annotation) = annotation {
        frame["annotation"] = annotation;
    }
    frame
}

fn error_frame(message: &str) -> Value {
    json!({ "type": "error", "message": message })
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> anyhow::Result<bool> {
    let json = serde_json::to_string(value)?;
    let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}
