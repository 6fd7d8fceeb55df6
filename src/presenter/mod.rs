// Chart presenter: turns fetched metrics plus the annotation store into chart configurations
// and hands them to the rendering capability.

pub mod chart;
pub mod editor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::{RwLock, broadcast};

use crate::annotations::{AnnotationError, AnnotationStore};
use crate::config::DEFAULT_NO_DATA_MESSAGE;
use crate::models::{Annotation, ChartScope, EndpointMetricSample, MetricSample, PercentMetric};
use crate::series::{self, ByteUnit, SeriesPoint};
use chart::{
    AnnotationPlugin, AxisKey, ChartConfig, ChartOptions, Dataset, Legend, LineMarker,
    NoDataMessage, Plugins, Scale, Ticks, TimeUnit, Title, Tooltip, TooltipNote, ValueFormat,
};

/// Percentage axes tick every 5 points.
const PERCENT_TICK_STEP: f64 = 5.0;
const DASHBOARD_LINE_COLOR: &str = "rgb(75, 192, 192)";
const DASHBOARD_TENSION: f64 = 0.1;

/// Every chart the console can build. Only the two system-watch charts take memos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChartKind {
    Resource,
    Network,
    NetworkGb,
    Endpoint,
    Metric(PercentMetric),
}

impl ChartKind {
    /// The two charts redrawn together after every memo.
    pub const SYSTEM_WATCH: [ChartKind; 2] = [ChartKind::Resource, ChartKind::Network];

    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::Resource => "resource",
            ChartKind::Network => "network",
            ChartKind::NetworkGb => "network-gb",
            ChartKind::Endpoint => "endpoint",
            ChartKind::Metric(PercentMetric::Cpu) => "cpu",
            ChartKind::Metric(PercentMetric::Memory) => "memory",
            ChartKind::Metric(PercentMetric::Disk) => "disk",
            ChartKind::Metric(PercentMetric::JvmHeap) => "jvm-heap",
            ChartKind::Metric(PercentMetric::JvmNonHeap) => "jvm-non-heap",
        }
    }

    /// Annotation scope of a chart that accepts memos.
    pub fn scope(self) -> Option<ChartScope> {
        match self {
            ChartKind::Resource => Some(ChartScope::Resource),
            ChartKind::Network => Some(ChartScope::Network),
            _ => None,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart: {0}")]
pub struct UnknownChart(pub String);

impl FromStr for ChartKind {
    type Err = UnknownChart;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "resource" => ChartKind::Resource,
            "network" => ChartKind::Network,
            "network-gb" => ChartKind::NetworkGb,
            "endpoint" => ChartKind::Endpoint,
            "cpu" => ChartKind::Metric(PercentMetric::Cpu),
            "memory" => ChartKind::Metric(PercentMetric::Memory),
            "disk" => ChartKind::Metric(PercentMetric::Disk),
            "jvm-heap" => ChartKind::Metric(PercentMetric::JvmHeap),
            "jvm-non-heap" => ChartKind::Metric(PercentMetric::JvmNonHeap),
            other => return Err(UnknownChart(other.to_string())),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for ChartKind {
    type Error = UnknownChart;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.slug().to_string()
    }
}

/// A clicked point on a memo-enabled chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub scope: ChartScope,
    pub timestamp_millis: i64,
    pub metric_id: i64,
}

/// Rendering capability: accepts a full configuration and (re)draws the chart.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, kind: ChartKind, config: &ChartConfig);
}

/// One redraw, as pushed to /ws/charts clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub chart: ChartKind,
    pub config: ChartConfig,
}

impl RenderFrame {
    pub fn new(chart: ChartKind, config: ChartConfig) -> Self {
        Self {
            frame_type: "render".into(),
            chart,
            config,
        }
    }
}

/// Publishes every render on a broadcast channel; each WebSocket client subscribes.
#[derive(Clone)]
pub struct BroadcastRenderer {
    tx: broadcast::Sender<RenderFrame>,
}

impl BroadcastRenderer {
    pub fn new(tx: broadcast::Sender<RenderFrame>) -> Self {
        Self { tx }
    }
}

impl ChartRenderer for BroadcastRenderer {
    fn render(&self, kind: ChartKind, config: &ChartConfig) {
        match self.tx.send(RenderFrame::new(kind, config.clone())) {
            Ok(receivers) => tracing::debug!(chart = %kind, receivers, "render frame published"),
            Err(_) => tracing::debug!(chart = %kind, "render frame dropped, no /ws/charts clients"),
        }
    }
}

/// Presenter shared between HTTP handlers and WebSocket sessions.
pub type SharedPresenter = std::sync::Arc<RwLock<ChartPresenter<BroadcastRenderer>>>;

pub struct ChartPresenter<R> {
    samples: Vec<MetricSample>,
    endpoint_samples: Vec<EndpointMetricSample>,
    store: AnnotationStore,
    renderer: R,
    no_data_message: String,
}

impl<R: ChartRenderer> ChartPresenter<R> {
    /// Orders the batch by timestamp (warning if the backend did not) and seeds the
    /// store from memos the backend already persisted.
    pub fn new(mut samples: Vec<MetricSample>, renderer: R) -> Self {
        let ordered = samples
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp);
        if !ordered {
            tracing::warn!(
                samples = samples.len(),
                "metric batch is not ordered by timestamp; sorting"
            );
            samples.sort_by_key(|s| s.timestamp);
        }
        let store = AnnotationStore::seed_from_samples(&samples);
        tracing::info!(
            samples = samples.len(),
            annotations = store.len(),
            "chart presenter ready"
        );
        Self {
            samples,
            endpoint_samples: Vec::new(),
            store,
            renderer,
            no_data_message: DEFAULT_NO_DATA_MESSAGE.into(),
        }
    }

    pub fn with_endpoint_metrics(mut self, samples: Vec<EndpointMetricSample>) -> Self {
        self.endpoint_samples = samples;
        self
    }

    pub fn with_no_data_message(mut self, message: &str) -> Self {
        self.no_data_message = message.into();
        self
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn chart(&self, kind: ChartKind) -> ChartConfig {
        match kind {
            ChartKind::Resource => self.resource_chart(),
            ChartKind::Network => self.network_chart(),
            ChartKind::NetworkGb => self.network_gb_chart(),
            ChartKind::Endpoint => self.endpoint_chart(),
            ChartKind::Metric(metric) => self.metric_chart(metric),
        }
    }

    /// Hands both system-watch charts to the renderer. Both are always redrawn: `both`-scoped
    /// memos appear on either chart.
    pub fn render_all(&self) {
        for kind in ChartKind::SYSTEM_WATCH {
            self.renderer.render(kind, &self.chart(kind));
        }
    }

    /// Resolves a click on a memo-enabled chart by the clicked point's x value. Datasets are
    /// filtered, so an element's position within them says nothing about which sample it is.
    pub fn point_at(&self, kind: ChartKind, timestamp_millis: i64) -> Option<ChartPoint> {
        let scope = kind.scope()?;
        let sample = self
            .samples
            .iter()
            .find(|s| s.timestamp_millis() == timestamp_millis)?;
        Some(ChartPoint {
            scope,
            timestamp_millis: sample.timestamp_millis(),
            metric_id: sample.id,
        })
    }

    /// Records a memo the backend has already persisted, then redraws both charts.
    pub fn apply_memo(
        &mut self,
        point: &ChartPoint,
        description: &str,
        label: Option<String>,
    ) -> Result<Annotation, AnnotationError> {
        let annotation = self
            .store
            .upsert(
                point.scope,
                point.timestamp_millis,
                description,
                label,
                point.metric_id,
            )?
            .clone();
        self.render_all();
        Ok(annotation)
    }

    /// Extra tooltip line for a point; empty when the point has no memo.
    pub fn tooltip_after_body(&self, scope: ChartScope, timestamp_millis: i64) -> String {
        self.store
            .find_for_point(scope, timestamp_millis)
            .map(|a| format!("Memo: {}", a.description))
            .unwrap_or_default()
    }

    pub fn resource_chart(&self) -> ChartConfig {
        let datasets: Vec<Dataset> = PercentMetric::ALL
            .iter()
            .map(|&metric| {
                let (border, background) = metric.colors();
                Dataset::new(
                    metric.series_label(),
                    self.time_series(|s| s.percent(metric)),
                    border,
                )
                .background(background)
            })
            .collect();
        let bounds = series::percent_bounds(datasets.iter().map(|d| d.data.as_slice()));

        let scales = BTreeMap::from([
            ("x".to_string(), Scale::time("Time", TimeUnit::Minute)),
            (
                "y".to_string(),
                Scale::linear("Usage (%)")
                    .bounds(bounds.min, bounds.max)
                    .ticks(Ticks::step(PERCENT_TICK_STEP)),
            ),
        ]);
        self.system_watch_config(
            ChartScope::Resource,
            "System Resource Usage Over Time",
            datasets,
            scales,
        )
    }

    pub fn network_chart(&self) -> ChartConfig {
        let unit = ByteUnit::Megabytes;
        let datasets = vec![
            Dataset::new(
                "Network In (MB)",
                self.time_series(|s| unit.convert(s.network_in_bytes)),
                "rgba(255, 159, 64, 1)",
            )
            .background("rgba(255, 159, 64, 0.2)"),
            Dataset::new(
                "Network Out (MB)",
                self.time_series(|s| unit.convert(s.network_out_bytes)),
                "rgba(0, 128, 0, 1)",
            )
            .background("rgba(0, 128, 0, 0.2)"),
        ];
        let bounds = series::traffic_bounds(datasets.iter().map(|d| d.data.as_slice()));
        let max = series::value_range(datasets.iter().map(|d| d.data.as_slice()))
            .map(|(_, max)| max)
            .unwrap_or(0.0);

        let scales = BTreeMap::from([
            ("x".to_string(), Scale::time("Time", TimeUnit::Minute)),
            (
                "y".to_string(),
                Scale::linear("Traffic (MB)")
                    .bounds(bounds.min, bounds.max)
                    .ticks(
                        Ticks::step(series::traffic_step(max))
                            .formatted(ValueFormat::new(2, unit.suffix())),
                    ),
            ),
        ]);
        self.system_watch_config(ChartScope::Network, "Network Traffic Over Time", datasets, scales)
    }

    /// Single percentage series on a day-unit time axis (dashboard cards).
    pub fn metric_chart(&self, metric: PercentMetric) -> ChartConfig {
        let datasets = vec![
            Dataset::new(
                metric.series_label(),
                self.time_series(|s| s.percent(metric)),
                DASHBOARD_LINE_COLOR,
            )
            .tension(DASHBOARD_TENSION),
        ];
        let scales = BTreeMap::from([
            ("x".to_string(), Scale::time("Time", TimeUnit::Day)),
            (
                "y".to_string(),
                Scale::linear(metric.series_label()).from_zero(),
            ),
        ]);
        let plugins = Plugins {
            title: None,
            legend: Some(Legend::hidden()),
            tooltip: Tooltip {
                value_format: Some(ValueFormat::new(2, "%")),
                after_body: Vec::new(),
            },
            no_data_message: self.no_data(&datasets),
            annotation: AnnotationPlugin::default(),
        };
        ChartConfig::line(self.time_labels(), datasets, ChartOptions::new(scales, plugins))
    }

    /// Dashboard network chart in gigabytes.
    pub fn network_gb_chart(&self) -> ChartConfig {
        let unit = ByteUnit::Gigabytes;
        let datasets = vec![
            Dataset::new(
                "Network In",
                self.time_series(|s| unit.convert(s.network_in_bytes)),
                DASHBOARD_LINE_COLOR,
            )
            .tension(DASHBOARD_TENSION),
            Dataset::new(
                "Network Out",
                self.time_series(|s| unit.convert(s.network_out_bytes)),
                "rgb(255, 99, 132)",
            )
            .tension(DASHBOARD_TENSION),
        ];
        let format = ValueFormat::new(2, unit.suffix());
        let scales = BTreeMap::from([
            ("x".to_string(), Scale::time("Time", TimeUnit::Day)),
            (
                "y".to_string(),
                Scale::linear("Gigabytes (GB)")
                    .from_zero()
                    .ticks(Ticks {
                        step_size: None,
                        format: Some(format.clone()),
                    }),
            ),
        ]);
        let plugins = Plugins {
            title: None,
            legend: None,
            tooltip: Tooltip {
                value_format: Some(format),
                after_body: Vec::new(),
            },
            no_data_message: self.no_data(&datasets),
            annotation: AnnotationPlugin::default(),
        };
        ChartConfig::line(self.time_labels(), datasets, ChartOptions::new(scales, plugins))
    }

    /// Visit count, average response time and rate-limit failures per day, each on its own axis.
    pub fn endpoint_chart(&self) -> ChartConfig {
        let rows = &self.endpoint_samples;
        let by_date = |value_of: fn(&EndpointMetricSample) -> Option<i64>| {
            series::pair_series(
                rows,
                |s| AxisKey::Date(s.date),
                move |s| value_of(s).map(|v| v as f64),
            )
        };
        let datasets = vec![
            Dataset::new(
                "Visit Count",
                by_date(|s| s.total_page_view),
                DASHBOARD_LINE_COLOR,
            )
            .tension(DASHBOARD_TENSION)
            .on_axis("y-axis-1"),
            Dataset::new(
                "Average Response Time (ms)",
                by_date(|s| s.average_response_time),
                "rgb(255, 99, 132)",
            )
            .tension(DASHBOARD_TENSION)
            .on_axis("y-axis-2"),
            Dataset::new(
                "Rate Limit Failures",
                by_date(|s| s.ratelimit_fail_count),
                "rgb(54, 162, 235)",
            )
            .tension(DASHBOARD_TENSION)
            .on_axis("y-axis-3"),
        ];
        let scales = BTreeMap::from([
            ("x".to_string(), Scale::category("Date")),
            (
                "y-axis-1".to_string(),
                Scale::linear("Visit Count").primary(),
            ),
            (
                "y-axis-2".to_string(),
                Scale::linear("Avg Response Time (ms)").secondary(),
            ),
            (
                "y-axis-3".to_string(),
                Scale::linear("Rate Limit Failures").secondary(),
            ),
        ]);
        let plugins = Plugins {
            title: Some(Title::shown("Endpoint Metrics")),
            legend: Some(Legend::top()),
            tooltip: Tooltip::default(),
            no_data_message: self.no_data(&datasets),
            annotation: AnnotationPlugin::default(),
        };
        let labels = rows.iter().map(|s| AxisKey::Date(s.date)).collect();
        ChartConfig::line(labels, datasets, ChartOptions::new(scales, plugins))
    }

    fn system_watch_config(
        &self,
        scope: ChartScope,
        title: &str,
        datasets: Vec<Dataset>,
        scales: BTreeMap<String, Scale>,
    ) -> ChartConfig {
        let after_body = self
            .samples
            .iter()
            .filter_map(|s| {
                let text = self.tooltip_after_body(scope, s.timestamp_millis());
                (!text.is_empty()).then(|| TooltipNote {
                    x: AxisKey::Millis(s.timestamp_millis()),
                    text,
                })
            })
            .collect();
        let markers = self
            .store
            .all_for_chart(scope)
            .map(LineMarker::for_annotation)
            .collect();
        let plugins = Plugins {
            title: Some(Title::shown(title)),
            legend: None,
            tooltip: Tooltip {
                value_format: None,
                after_body,
            },
            no_data_message: self.no_data(&datasets),
            annotation: AnnotationPlugin {
                annotations: markers,
            },
        };
        ChartConfig::line(self.time_labels(), datasets, ChartOptions::new(scales, plugins))
    }

    fn time_labels(&self) -> Vec<AxisKey> {
        self.samples
            .iter()
            .map(|s| AxisKey::Millis(s.timestamp_millis()))
            .collect()
    }

    fn time_series(&self, value_of: impl Fn(&MetricSample) -> Option<f64>) -> Vec<SeriesPoint<AxisKey>> {
        series::pair_series(
            &self.samples,
            |s| AxisKey::Millis(s.timestamp_millis()),
            value_of,
        )
    }

    fn no_data(&self, datasets: &[Dataset]) -> NoDataMessage {
        let mut overlay = NoDataMessage::new(&self.no_data_message);
        overlay.active = datasets.iter().all(|d| d.data.is_empty());
        overlay
    }
}
