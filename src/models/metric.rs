// System-watch and endpoint metric records as sent by the backend

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One system-level sample. Percentages are conventionally 0-100 but not enforced;
/// any numeric field may be absent or carry the backend's `-1` "no data" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub cpu_usage_percent: Option<f64>,
    #[serde(default)]
    pub memory_usage_percent: Option<f64>,
    #[serde(default)]
    pub disk_usage_percent: Option<f64>,
    #[serde(default)]
    pub jvm_heap_usage_percent: Option<f64>,
    #[serde(default)]
    pub jvm_non_heap_usage_percent: Option<f64>,
    #[serde(default)]
    pub jvm_total_memory_used: Option<i64>,
    #[serde(default)]
    pub network_in_bytes: Option<i64>,
    #[serde(default)]
    pub network_out_bytes: Option<i64>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl MetricSample {
    /// Epoch milliseconds; the backend's zone-less timestamp is read as UTC.
    /// Store keys, chart labels and tooltip lookups all use this representation.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.and_utc().timestamp_millis()
    }

    /// Value of one percentage field.
    pub fn percent(&self, metric: PercentMetric) -> Option<f64> {
        match metric {
            PercentMetric::Cpu => self.cpu_usage_percent,
            PercentMetric::Memory => self.memory_usage_percent,
            PercentMetric::Disk => self.disk_usage_percent,
            PercentMetric::JvmHeap => self.jvm_heap_usage_percent,
            PercentMetric::JvmNonHeap => self.jvm_non_heap_usage_percent,
        }
    }

    /// Persisted memo text, if it holds anything besides whitespace.
    pub fn persisted_memo(&self) -> Option<&str> {
        self.memo
            .as_deref()
            .map(str::trim)
            .filter(|memo| !memo.is_empty())
    }
}

/// The bounded-percentage fields of [`MetricSample`], in the order the resource chart draws them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PercentMetric {
    Cpu,
    Memory,
    Disk,
    JvmHeap,
    JvmNonHeap,
}

impl PercentMetric {
    pub const ALL: [PercentMetric; 5] = [
        PercentMetric::Cpu,
        PercentMetric::Memory,
        PercentMetric::Disk,
        PercentMetric::JvmHeap,
        PercentMetric::JvmNonHeap,
    ];

    /// Legend text on the resource chart.
    pub fn series_label(self) -> &'static str {
        match self {
            PercentMetric::Cpu => "CPU Usage (%)",
            PercentMetric::Memory => "Memory Usage (%)",
            PercentMetric::Disk => "Disk Usage (%)",
            PercentMetric::JvmHeap => "JVM Heap Usage (%)",
            PercentMetric::JvmNonHeap => "JVM Non-Heap Usage (%)",
        }
    }

    /// Line and fill colours (border, background).
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            PercentMetric::Cpu => ("rgba(255, 99, 132, 1)", "rgba(255, 99, 132, 0.2)"),
            PercentMetric::Memory => ("rgba(54, 162, 235, 1)", "rgba(54, 162, 235, 0.2)"),
            PercentMetric::Disk => ("rgba(255, 206, 86, 1)", "rgba(255, 206, 86, 0.2)"),
            PercentMetric::JvmHeap => ("rgba(75, 192, 192, 1)", "rgba(75, 192, 192, 0.2)"),
            PercentMetric::JvmNonHeap => ("rgba(153, 102, 255, 1)", "rgba(153, 102, 255, 0.2)"),
        }
    }
}

/// Daily per-endpoint aggregate shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetricSample {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_page_view: Option<i64>,
    /// Milliseconds.
    #[serde(default)]
    pub average_response_time: Option<i64>,
    #[serde(default)]
    pub ratelimit_fail_count: Option<i64>,
}
