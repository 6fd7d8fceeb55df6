// Domain models: backend metric records and operator annotations

mod annotation;
mod metric;

pub use annotation::{Annotation, ChartScope};
pub use metric::{EndpointMetricSample, MetricSample, PercentMetric};
