// Declarative chart configuration handed to the renderer (line charts with time or date x-axes).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Annotation;
use crate::series::SeriesPoint;

/// x value of a point: epoch milliseconds for system charts, a day for endpoint charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisKey {
    Millis(i64),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartConfig {
    pub fn line(labels: Vec<AxisKey>, datasets: Vec<Dataset>, options: ChartOptions) -> Self {
        Self {
            chart_type: "line".into(),
            data: ChartData { labels, datasets },
            options,
        }
    }

    /// True when every series is empty; the renderer then draws the no-data placeholder.
    pub fn is_empty(&self) -> bool {
        self.data.datasets.iter().all(|d| d.data.is_empty())
    }

    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.data.datasets.iter().find(|d| d.label == label)
    }

    pub fn scale(&self, id: &str) -> Option<&Scale> {
        self.options.scales.get(id)
    }

    pub fn markers(&self) -> &[LineMarker] {
        &self.options.plugins.annotation.annotations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<AxisKey>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<SeriesPoint<AxisKey>>,
    pub border_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(rename = "yAxisID", default, skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<String>,
}

impl Dataset {
    pub fn new(label: &str, data: Vec<SeriesPoint<AxisKey>>, border_color: &str) -> Self {
        Self {
            label: label.into(),
            data,
            border_color: border_color.into(),
            background_color: None,
            tension: None,
            y_axis_id: None,
        }
    }

    pub fn background(mut self, color: &str) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn tension(mut self, tension: f64) -> Self {
        self.tension = Some(tension);
        self
    }

    pub fn on_axis(mut self, axis_id: &str) -> Self {
        self.y_axis_id = Some(axis_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub scales: BTreeMap<String, Scale>,
    pub plugins: Plugins,
}

impl ChartOptions {
    pub fn new(scales: BTreeMap<String, Scale>, plugins: Plugins) -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            scales,
            plugins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    #[serde(rename = "type")]
    pub scale_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at_zero: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Ticks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
}

impl Scale {
    fn of_type(scale_type: &str, title: &str) -> Self {
        Self {
            scale_type: scale_type.into(),
            display: None,
            position: None,
            title: Some(Title::shown(title)),
            time: None,
            begin_at_zero: None,
            min: None,
            max: None,
            ticks: None,
            grid: None,
        }
    }

    /// Time axis with the given unit and tick display format (date-fns tokens).
    pub fn time(title: &str, unit: TimeUnit) -> Self {
        let mut scale = Self::of_type("time", title);
        scale.time = Some(TimeOptions::for_unit(unit));
        scale
    }

    /// Category axis, for labels the chart must show verbatim.
    pub fn category(title: &str) -> Self {
        Self::of_type("category", title)
    }

    pub fn linear(title: &str) -> Self {
        Self::of_type("linear", title)
    }

    pub fn bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn from_zero(mut self) -> Self {
        self.begin_at_zero = Some(true);
        self
    }

    pub fn ticks(mut self, ticks: Ticks) -> Self {
        self.ticks = Some(ticks);
        self
    }

    /// Secondary axis on the right that does not draw its own gridlines over the plot.
    pub fn secondary(mut self) -> Self {
        self.display = Some(true);
        self.position = Some("right".into());
        self.grid = Some(Grid {
            draw_on_chart_area: false,
        });
        self
    }

    pub fn primary(mut self) -> Self {
        self.display = Some(true);
        self.position = Some("left".into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    Day,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOptions {
    pub unit: TimeUnit,
    pub display_formats: BTreeMap<String, String>,
    pub tooltip_format: String,
}

impl TimeOptions {
    fn for_unit(unit: TimeUnit) -> Self {
        let (key, format, tooltip) = match unit {
            TimeUnit::Minute => ("minute", "MMM d, HH:mm", "yyyy-MM-dd HH:mm:ss"),
            TimeUnit::Day => ("day", "MMM d", "yyyy-MM-dd"),
        };
        Self {
            unit,
            display_formats: BTreeMap::from([(key.to_string(), format.to_string())]),
            tooltip_format: tooltip.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
}

impl Ticks {
    pub fn step(step_size: f64) -> Self {
        Self {
            step_size: Some(step_size),
            format: None,
        }
    }

    pub fn formatted(mut self, format: ValueFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Fixed-decimals number with a unit suffix, e.g. `12.50 MB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFormat {
    pub decimals: usize,
    pub suffix: String,
}

impl ValueFormat {
    pub fn new(decimals: usize, suffix: &str) -> Self {
        Self {
            decimals,
            suffix: suffix.into(),
        }
    }

    pub fn apply(&self, value: f64) -> String {
        format!("{:.*} {}", self.decimals, value, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub draw_on_chart_area: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub display: bool,
    pub text: String,
}

impl Title {
    pub fn shown(text: &str) -> Self {
        Self {
            display: true,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    pub tooltip: Tooltip,
    pub no_data_message: NoDataMessage,
    pub annotation: AnnotationPlugin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub display: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl Legend {
    pub fn hidden() -> Self {
        Self {
            display: false,
            position: None,
        }
    }

    pub fn top() -> Self {
        Self {
            display: true,
            position: Some("top".into()),
        }
    }
}

/// Tooltip text: optional value format for the body, and the extra line shown after the
/// body of points that carry a memo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<ValueFormat>,
    #[serde(default)]
    pub after_body: Vec<TooltipNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipNote {
    pub x: AxisKey,
    pub text: String,
}

/// Options of the placeholder overlay drawn centered on the plot when `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoDataMessage {
    pub active: bool,
    pub message: String,
    pub font: Font,
    pub color: String,
}

impl NoDataMessage {
    pub fn new(message: &str) -> Self {
        Self {
            active: false,
            message: message.into(),
            font: Font {
                size: 16,
                family: "Arial".into(),
            },
            color: "rgba(100, 100, 100, 0.8)".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size: u32,
    pub family: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPlugin {
    pub annotations: Vec<LineMarker>,
}

/// Vertical line at an annotation's timestamp, labelled with its description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMarker {
    pub id: String,
    #[serde(rename = "type")]
    pub marker_type: String,
    #[serde(rename = "scaleID")]
    pub scale_id: String,
    pub value: i64,
    pub border_color: String,
    pub border_width: u32,
    pub label: MarkerLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLabel {
    pub display: bool,
    pub content: String,
}

impl LineMarker {
    pub fn for_annotation(annotation: &Annotation) -> Self {
        Self {
            id: format!("memo-{}-{}", annotation.metric_id, annotation.timestamp),
            marker_type: "line".into(),
            scale_id: "x".into(),
            value: annotation.timestamp,
            border_color: "rgba(220, 53, 69, 0.8)".into(),
            border_width: 2,
            label: MarkerLabel {
                display: true,
                content: annotation.description.clone(),
            },
        }
    }
}
