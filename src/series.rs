// Plot-ready series: (x, value) pairing, "no data" filtering, unit conversion and axis bounds.
// Values are paired with their x key before filtering so a dropped value never shifts later
// values onto the wrong timestamp.

use serde::{Deserialize, Serialize};

/// Backend marker for "no measurement".
pub const NO_DATA_SENTINEL: f64 = -1.0;

/// Padding added around percentage series before clamping to [0, 100].
pub const PERCENT_AXIS_PADDING: f64 = 5.0;

/// Headroom multiplier above the highest traffic value.
pub const TRAFFIC_HEADROOM: f64 = 1.1;

/// Roughly this many gridlines on the traffic axis.
const TRAFFIC_GRIDLINES: f64 = 5.0;

/// One plotted point. Serialized as `{ "x": .., "y": .. }` so the chart places it by x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<X> {
    pub x: X,
    pub y: f64,
}

/// Byte-count unit for traffic charts; one unit per chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    Gigabytes,
    Megabytes,
}

impl ByteUnit {
    pub fn divisor(self) -> f64 {
        match self {
            ByteUnit::Gigabytes => 1024.0 * 1024.0 * 1024.0,
            ByteUnit::Megabytes => 1024.0 * 1024.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ByteUnit::Gigabytes => "GB",
            ByteUnit::Megabytes => "MB",
        }
    }

    /// Converts a raw byte count. The sentinel is kept as-is so filtering still sees it.
    pub fn convert(self, bytes: Option<i64>) -> Option<f64> {
        let raw = bytes? as f64;
        if raw == NO_DATA_SENTINEL {
            return Some(raw);
        }
        Some(raw / self.divisor())
    }
}

/// False for absent values, NaN/infinity and the "no data" sentinel.
pub fn is_plottable(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && v != NO_DATA_SENTINEL)
}

/// Pairs each record's x key with its value, then drops pairs whose value is not plottable.
pub fn pair_series<T, X>(
    records: &[T],
    x_of: impl Fn(&T) -> X,
    value_of: impl Fn(&T) -> Option<f64>,
) -> Vec<SeriesPoint<X>> {
    records
        .iter()
        .map(|record| (x_of(record), value_of(record)))
        .filter(|(_, value)| is_plottable(*value))
        .filter_map(|(x, value)| value.map(|y| SeriesPoint { x, y }))
        .collect()
}

/// Smallest and largest value across several series; `None` when all are empty.
pub fn value_range<'a, X: 'a>(
    series: impl IntoIterator<Item = &'a [SeriesPoint<X>]>,
) -> Option<(f64, f64)> {
    series
        .into_iter()
        .flat_map(|points| points.iter().map(|p| p.y))
        .fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((min, max)) => Some((min.min(y), max.max(y))),
        })
}

/// y-axis bounds for a chart of percentage series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

/// Pads the observed range by [`PERCENT_AXIS_PADDING`] and clamps both ends into [0, 100].
/// Out-of-range batches collapse onto the nearest edge rather than inverting the axis.
pub fn percent_bounds<'a, X: 'a>(series: impl IntoIterator<Item = &'a [SeriesPoint<X>]>) -> AxisBounds {
    match value_range(series) {
        Some((min, max)) => {
            let min = (min - PERCENT_AXIS_PADDING).clamp(0.0, 100.0);
            AxisBounds {
                min,
                max: (max + PERCENT_AXIS_PADDING).clamp(min, 100.0),
            }
        }
        None => AxisBounds {
            min: 0.0,
            max: 100.0,
        },
    }
}

/// Traffic axes start at zero and leave 10% headroom above the highest value.
pub fn traffic_bounds<'a, X: 'a>(series: impl IntoIterator<Item = &'a [SeriesPoint<X>]>) -> AxisBounds {
    let max = value_range(series).map(|(_, max)| max).unwrap_or(0.0);
    AxisBounds {
        min: 0.0,
        max: max * TRAFFIC_HEADROOM,
    }
}

/// Tick step giving about five gridlines regardless of scale.
pub fn traffic_step(max: f64) -> f64 {
    if max > TRAFFIC_GRIDLINES {
        (max / TRAFFIC_GRIDLINES).ceil()
    } else {
        1.0
    }
}
