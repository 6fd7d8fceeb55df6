// In-memory memo index keyed by (timestamp, chart scope).
// Owned by the presenter; persistence happens on the backend before any upsert.

use crate::models::{Annotation, ChartScope, MetricSample};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("memo description must not be empty")]
    EmptyDescription,
}

/// Rejects descriptions that are empty after trimming; returns the trimmed text.
pub fn validate_description(description: &str) -> Result<&str, AnnotationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AnnotationError::EmptyDescription);
    }
    Ok(trimmed)
}

#[derive(Debug, Default, Clone)]
pub struct AnnotationStore {
    entries: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from the memos already persisted on a fetched batch.
    /// Persisted memos carry no chart scope, so they show on both charts.
    pub fn seed_from_samples(samples: &[MetricSample]) -> Self {
        let mut store = Self::new();
        for sample in samples {
            let Some(memo) = sample.persisted_memo() else {
                continue;
            };
            if let Err(e) = store.upsert(
                ChartScope::Both,
                sample.timestamp_millis(),
                memo,
                sample.label.clone(),
                sample.id,
            ) {
                tracing::warn!(metric_id = sample.id, error = %e, "skipping persisted memo");
            }
        }
        store
    }

    /// Replaces the description/label of the entry with the same timestamp and an
    /// overlapping scope, or appends a new entry. Fails without touching the store
    /// when the description is blank.
    pub fn upsert(
        &mut self,
        scope: ChartScope,
        timestamp_millis: i64,
        description: &str,
        label: Option<String>,
        metric_id: i64,
    ) -> Result<&Annotation, AnnotationError> {
        let description = validate_description(description)?.to_string();
        let label = label.filter(|l| !l.trim().is_empty());

        let existing = self
            .entries
            .iter()
            .position(|a| a.timestamp == timestamp_millis && a.scope.overlaps(scope));
        let index = match existing {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.description = description;
                entry.label = label;
                entry.metric_id = metric_id;
                i
            }
            None => {
                self.entries.push(Annotation {
                    scope,
                    timestamp: timestamp_millis,
                    description,
                    label,
                    metric_id,
                });
                self.entries.len() - 1
            }
        };
        tracing::debug!(
            ?scope,
            timestamp = timestamp_millis,
            metric_id,
            updated = existing.is_some(),
            "annotation upserted"
        );
        Ok(&self.entries[index])
    }

    /// Exact-millisecond lookup for a point on the `scope` chart.
    pub fn find_for_point(&self, scope: ChartScope, timestamp_millis: i64) -> Option<&Annotation> {
        self.entries
            .iter()
            .find(|a| a.timestamp == timestamp_millis && a.scope.shows_on(scope))
    }

    /// Annotations drawn on the `scope` chart, in insertion order.
    pub fn all_for_chart(&self, scope: ChartScope) -> impl Iterator<Item = &Annotation> + Clone {
        self.entries.iter().filter(move |a| a.scope.shows_on(scope))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
