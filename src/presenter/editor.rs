// Memo-editing flow: Idle -> ModalOpen -> Submitting -> Idle | ModalOpen(error).
// The presenter lock is taken only after the backend confirms the memo.

use reqwest::Method;
use serde::Serialize;
use tokio::sync::RwLock;

use super::{ChartPoint, ChartPresenter, ChartRenderer};
use crate::annotations::{self, AnnotationError};
use crate::client::{RequestClient, RequestError};
use crate::models::Annotation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoError {
    #[error(transparent)]
    Validation(#[from] AnnotationError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("no chart point is selected")]
    NotOpen,
    #[error("a memo for this point is already being saved")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EditorState {
    Idle,
    #[serde(rename_all = "camelCase")]
    ModalOpen {
        point: ChartPoint,
        error: Option<String>,
    },
    Submitting {
        point: ChartPoint,
    },
}

/// Validated memo on its way to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoDraft {
    pub point: ChartPoint,
    pub description: String,
    pub label: Option<String>,
}

/// Backend path that persists a memo for one metric sample.
pub fn memo_path(metric_id: i64) -> String {
    format!("system-watch/{metric_id}/memo")
}

#[derive(Debug, Clone)]
pub struct MemoEditor {
    state: EditorState,
}

impl Default for MemoEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Idle,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Opens the modal for `point`, replacing any point already open.
    pub fn open(&mut self, point: ChartPoint) -> Result<(), MemoError> {
        if matches!(self.state, EditorState::Submitting { .. }) {
            return Err(MemoError::Busy);
        }
        self.state = EditorState::ModalOpen { point, error: None };
        Ok(())
    }

    /// Closes an open modal without touching the store. Returns false while submitting.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            EditorState::Submitting { .. } => false,
            _ => {
                self.state = EditorState::Idle;
                true
            }
        }
    }

    /// Validates the form. A blank description keeps the modal open with the error
    /// and never reaches the network.
    pub fn begin_submit(
        &mut self,
        description: &str,
        label: Option<String>,
    ) -> Result<MemoDraft, MemoError> {
        let point = match &self.state {
            EditorState::ModalOpen { point, .. } => *point,
            EditorState::Submitting { .. } => return Err(MemoError::Busy),
            EditorState::Idle => return Err(MemoError::NotOpen),
        };
        let description = match annotations::validate_description(description) {
            Ok(d) => d.to_string(),
            Err(e) => {
                self.state = EditorState::ModalOpen {
                    point,
                    error: Some(e.to_string()),
                };
                return Err(e.into());
            }
        };
        self.state = EditorState::Submitting { point };
        Ok(MemoDraft {
            point,
            description,
            label: label.filter(|l| !l.trim().is_empty()),
        })
    }

    /// Settles a submission: success closes the modal, failure reopens it with the message.
    pub fn finish(&mut self, outcome: &Result<Annotation, MemoError>) {
        let EditorState::Submitting { point } = self.state else {
            return;
        };
        self.state = match outcome {
            Ok(_) => EditorState::Idle,
            Err(e) => EditorState::ModalOpen {
                point,
                error: Some(e.to_string()),
            },
        };
    }
}

/// Full save: validate, persist on the backend, then upsert and redraw both charts.
pub async fn save_memo<R: ChartRenderer>(
    editor: &mut MemoEditor,
    presenter: &RwLock<ChartPresenter<R>>,
    client: &RequestClient,
    description: &str,
    label: Option<String>,
) -> Result<Annotation, MemoError> {
    let draft = editor.begin_submit(description, label)?;
    let outcome = persist_and_apply(presenter, client, draft).await;
    editor.finish(&outcome);
    outcome
}

async fn persist_and_apply<R: ChartRenderer>(
    presenter: &RwLock<ChartPresenter<R>>,
    client: &RequestClient,
    draft: MemoDraft,
) -> Result<Annotation, MemoError> {
    client
        .send_query(
            &memo_path(draft.point.metric_id),
            Method::POST,
            &[("description", draft.description.as_str())],
            None,
        )
        .await?;
    tracing::info!(
        metric_id = draft.point.metric_id,
        scope = ?draft.point.scope,
        "memo persisted"
    );
    let mut presenter = presenter.write().await;
    Ok(presenter.apply_memo(&draft.point, &draft.description, draft.label)?)
}
