// Operator memos attached to chart points

use serde::{Deserialize, Serialize};

/// Which chart(s) an annotation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartScope {
    Resource,
    Network,
    Both,
}

impl ChartScope {
    /// Same key space: equal scopes, or either side is `Both`.
    pub fn overlaps(self, other: ChartScope) -> bool {
        self == other || self == ChartScope::Both || other == ChartScope::Both
    }

    /// Whether an annotation with this scope is drawn on the `chart` chart.
    pub fn shows_on(self, chart: ChartScope) -> bool {
        self == chart || self == ChartScope::Both
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub scope: ChartScope,
    /// Epoch milliseconds, same representation as `MetricSample::timestamp_millis`.
    pub timestamp: i64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub metric_id: i64,
}
