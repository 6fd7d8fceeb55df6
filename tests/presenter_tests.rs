// Chart presenter: chart configurations, markers, tooltips and redraws

mod common;

use chrono::NaiveDate;
use common::{RecordingRenderer, millis_at_minute, minimal_sample, sample};
use watchboard::config::DEFAULT_NO_DATA_MESSAGE;
use watchboard::models::{ChartScope, EndpointMetricSample, PercentMetric};
use watchboard::presenter::chart::{AxisKey, TimeUnit};
use watchboard::presenter::{ChartKind, ChartPoint, ChartPresenter};

fn presenter_for(samples: Vec<watchboard::models::MetricSample>) -> (ChartPresenter<RecordingRenderer>, RecordingRenderer) {
    let renderer = RecordingRenderer::default();
    (ChartPresenter::new(samples, renderer.clone()), renderer)
}

fn point(scope: ChartScope, minute: u32, metric_id: i64) -> ChartPoint {
    ChartPoint {
        scope,
        timestamp_millis: millis_at_minute(minute),
        metric_id,
    }
}

#[test]
fn render_all_draws_both_system_watch_charts() {
    let (presenter, renderer) = presenter_for(vec![sample(1, 0, 10.0)]);
    presenter.render_all();
    assert_eq!(renderer.kinds(), vec![ChartKind::Resource, ChartKind::Network]);
}

#[test]
fn resource_chart_has_five_series_and_padded_percent_axis() {
    let mut low = sample(1, 0, 10.0);
    low.memory_usage_percent = Some(60.0);
    let (presenter, _) = presenter_for(vec![low, sample(2, 1, 30.0)]);
    let config = presenter.resource_chart();

    assert_eq!(config.chart_type, "line");
    assert_eq!(config.data.datasets.len(), 5);
    let labels: Vec<&str> = config.data.datasets.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(
        labels,
        PercentMetric::ALL.iter().map(|m| m.series_label()).collect::<Vec<_>>()
    );

    let y = config.scale("y").unwrap();
    assert_eq!(y.min, Some(5.0));
    assert_eq!(y.max, Some(65.0));
    assert_eq!(y.ticks.as_ref().unwrap().step_size, Some(5.0));
    let x = config.scale("x").unwrap();
    assert_eq!(x.scale_type, "time");
    assert_eq!(x.time.as_ref().unwrap().unit, TimeUnit::Minute);
    assert!(!config.options.plugins.no_data_message.active);
}

#[test]
fn filtered_values_keep_their_own_timestamps() {
    let mut gap = sample(2, 1, 20.0);
    gap.cpu_usage_percent = Some(-1.0);
    let samples = vec![sample(1, 0, 10.0), gap, sample(3, 2, 30.0)];
    let (presenter, _) = presenter_for(samples);
    let config = presenter.resource_chart();

    let cpu = config.dataset(PercentMetric::Cpu.series_label()).unwrap();
    let xs: Vec<AxisKey> = cpu.data.iter().map(|p| p.x).collect();
    assert_eq!(
        xs,
        vec![AxisKey::Millis(millis_at_minute(0)), AxisKey::Millis(millis_at_minute(2))]
    );
    assert_eq!(cpu.data[1].y, 30.0);
    // the label axis keeps every sample
    assert_eq!(config.data.labels.len(), 3);
}

#[test]
fn network_chart_converts_to_megabytes_with_headroom() {
    let mut s = sample(1, 0, 10.0);
    s.network_in_bytes = Some(20 * 1024 * 1024);
    s.network_out_bytes = Some(5 * 1024 * 1024);
    let (presenter, _) = presenter_for(vec![s]);
    let config = presenter.network_chart();

    assert_eq!(config.dataset("Network In (MB)").unwrap().data[0].y, 20.0);
    assert_eq!(config.dataset("Network Out (MB)").unwrap().data[0].y, 5.0);
    let y = config.scale("y").unwrap();
    assert_eq!(y.min, Some(0.0));
    assert!((y.max.unwrap() - 22.0).abs() < 1e-9);
    let ticks = y.ticks.as_ref().unwrap();
    assert_eq!(ticks.step_size, Some(4.0));
    assert_eq!(ticks.format.as_ref().unwrap().apply(1.5), "1.50 MB");
}

#[test]
fn empty_batch_activates_no_data_overlay() {
    let (presenter, _) = presenter_for(Vec::new());
    for kind in ChartKind::SYSTEM_WATCH {
        let config = presenter.chart(kind);
        assert!(config.is_empty());
        assert!(config.options.plugins.no_data_message.active);
        assert_eq!(config.options.plugins.no_data_message.message, DEFAULT_NO_DATA_MESSAGE);
    }
    let y = presenter.resource_chart().scale("y").cloned().unwrap();
    assert_eq!((y.min, y.max), (Some(0.0), Some(100.0)));
}

#[test]
fn all_absent_values_count_as_no_data() {
    let (presenter, _) = presenter_for(vec![minimal_sample(1, 0), minimal_sample(2, 1)]);
    let presenter = presenter.with_no_data_message("Nothing yet");
    let config = presenter.network_chart();
    assert!(config.options.plugins.no_data_message.active);
    assert_eq!(config.options.plugins.no_data_message.message, "Nothing yet");
    assert_eq!(config.data.labels.len(), 2);
}

#[test]
fn network_scoped_memo_is_drawn_only_on_network_chart() {
    let (mut presenter, renderer) = presenter_for(vec![sample(1, 0, 10.0), sample(2, 1, 20.0)]);
    let annotation = presenter
        .apply_memo(&point(ChartScope::Network, 1, 2), "traffic spike", None)
        .unwrap();
    assert_eq!(annotation.scope, ChartScope::Network);

    let network = renderer.last(ChartKind::Network).unwrap();
    let resource = renderer.last(ChartKind::Resource).unwrap();
    assert_eq!(network.markers().len(), 1);
    assert!(resource.markers().is_empty());

    let marker = &network.markers()[0];
    assert_eq!(marker.value, millis_at_minute(1));
    assert_eq!(marker.scale_id, "x");
    assert_eq!(marker.label.content, "traffic spike");
    assert_eq!(marker.id, format!("memo-2-{}", millis_at_minute(1)));
}

#[test]
fn apply_memo_redraws_both_charts() {
    let (mut presenter, renderer) = presenter_for(vec![sample(1, 0, 10.0)]);
    renderer.clear();
    presenter
        .apply_memo(&point(ChartScope::Resource, 0, 1), "reboot", Some("ops".into()))
        .unwrap();
    assert_eq!(renderer.kinds(), vec![ChartKind::Resource, ChartKind::Network]);
}

#[test]
fn blank_memo_changes_nothing_and_skips_redraw() {
    let (mut presenter, renderer) = presenter_for(vec![sample(1, 0, 10.0)]);
    renderer.clear();
    let err = presenter
        .apply_memo(&point(ChartScope::Resource, 0, 1), "  ", None)
        .unwrap_err();
    assert_eq!(err.to_string(), "memo description must not be empty");
    assert!(presenter.store().is_empty());
    assert!(renderer.kinds().is_empty());
}

#[test]
fn tooltip_after_body_shows_memo_for_matching_scope_only() {
    let (mut presenter, _) = presenter_for(vec![sample(1, 0, 10.0)]);
    let ts = millis_at_minute(0);
    assert_eq!(presenter.tooltip_after_body(ChartScope::Resource, ts), "");
    presenter
        .apply_memo(&point(ChartScope::Resource, 0, 1), "cpu hot", None)
        .unwrap();
    assert_eq!(
        presenter.tooltip_after_body(ChartScope::Resource, ts),
        "Memo: cpu hot"
    );
    assert_eq!(presenter.tooltip_after_body(ChartScope::Network, ts), "");

    let config = presenter.resource_chart();
    let notes = &config.options.plugins.tooltip.after_body;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].x, AxisKey::Millis(ts));
    assert_eq!(notes[0].text, "Memo: cpu hot");
}

#[test]
fn persisted_memos_appear_on_both_charts() {
    let mut s = sample(9, 3, 10.0);
    s.memo = Some("deploy".into());
    let (presenter, _) = presenter_for(vec![s]);
    assert_eq!(presenter.resource_chart().markers().len(), 1);
    assert_eq!(presenter.network_chart().markers().len(), 1);
}

#[test]
fn unordered_batch_is_sorted_by_timestamp() {
    let (presenter, _) = presenter_for(vec![sample(2, 5, 10.0), sample(1, 1, 10.0), sample(3, 9, 10.0)]);
    let ids: Vec<i64> = presenter.samples().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn point_at_resolves_memo_enabled_charts_only() {
    let (presenter, _) = presenter_for(vec![sample(4, 0, 10.0), sample(5, 2, 10.0)]);
    assert_eq!(
        presenter.point_at(ChartKind::Network, millis_at_minute(2)),
        Some(point(ChartScope::Network, 2, 5))
    );
    assert_eq!(presenter.point_at(ChartKind::Network, millis_at_minute(1)), None);
    assert_eq!(presenter.point_at(ChartKind::NetworkGb, millis_at_minute(0)), None);
    assert_eq!(
        presenter.point_at(ChartKind::Metric(PercentMetric::Cpu), millis_at_minute(0)),
        None
    );
}

#[test]
fn clicked_point_after_a_dropped_value_resolves_to_its_own_sample() {
    let mut missing = sample(1, 0, 10.0);
    missing.cpu_usage_percent = Some(-1.0);
    let (presenter, _) = presenter_for(vec![missing, sample(2, 1, 60.0)]);
    let config = presenter.resource_chart();

    let cpu = config.dataset(PercentMetric::Cpu.series_label()).unwrap();
    assert_eq!(cpu.data.len(), 1);
    let AxisKey::Millis(clicked) = cpu.data[0].x else {
        panic!("system charts use millisecond x values");
    };

    let point = presenter.point_at(ChartKind::Resource, clicked).unwrap();
    assert_eq!(point.metric_id, 2);
    assert_eq!(point.timestamp_millis, millis_at_minute(1));
}

#[test]
fn metric_chart_uses_day_axis_and_percent_tooltip() {
    let (presenter, _) = presenter_for(vec![sample(1, 0, 42.0)]);
    let config = presenter.chart(ChartKind::Metric(PercentMetric::Disk));
    assert_eq!(config.data.datasets.len(), 1);
    assert_eq!(config.data.datasets[0].label, "Disk Usage (%)");
    assert_eq!(config.scale("x").unwrap().time.as_ref().unwrap().unit, TimeUnit::Day);
    assert_eq!(config.scale("y").unwrap().begin_at_zero, Some(true));
    let legend = config.options.plugins.legend.as_ref().unwrap();
    assert!(!legend.display);
    let format = config.options.plugins.tooltip.value_format.as_ref().unwrap();
    assert_eq!(format.apply(42.0), "42.00 %");
}

#[test]
fn network_gb_chart_converts_to_gigabytes() {
    let mut s = sample(1, 0, 10.0);
    s.network_in_bytes = Some(3 * 1024 * 1024 * 1024);
    let (presenter, _) = presenter_for(vec![s]);
    let config = presenter.chart(ChartKind::NetworkGb);
    assert_eq!(config.dataset("Network In").unwrap().data[0].y, 3.0);
    assert_eq!(
        config.scale("y").unwrap().title.as_ref().unwrap().text,
        "Gigabytes (GB)"
    );
}

#[test]
fn endpoint_chart_places_series_on_three_axes() {
    let day = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
    let rows = vec![
        EndpointMetricSample {
            date: day(1),
            total_page_view: Some(100),
            average_response_time: Some(35),
            ratelimit_fail_count: Some(-1),
        },
        EndpointMetricSample {
            date: day(2),
            total_page_view: Some(140),
            average_response_time: None,
            ratelimit_fail_count: Some(2),
        },
    ];
    let (presenter, _) = presenter_for(Vec::new());
    let presenter = presenter.with_endpoint_metrics(rows);
    let config = presenter.chart(ChartKind::Endpoint);

    assert_eq!(config.data.labels, vec![AxisKey::Date(day(1)), AxisKey::Date(day(2))]);
    assert_eq!(config.scale("x").unwrap().scale_type, "category");
    let visits = config.dataset("Visit Count").unwrap();
    assert_eq!(visits.y_axis_id.as_deref(), Some("y-axis-1"));
    assert_eq!(visits.data.len(), 2);
    assert_eq!(config.dataset("Average Response Time (ms)").unwrap().data.len(), 1);
    let failures = config.dataset("Rate Limit Failures").unwrap();
    assert_eq!(failures.data.len(), 1);
    assert_eq!(failures.data[0].x, AxisKey::Date(day(2)));

    let secondary = config.scale("y-axis-3").unwrap();
    assert_eq!(secondary.position.as_deref(), Some("right"));
    assert!(!secondary.grid.as_ref().unwrap().draw_on_chart_area);
    assert_eq!(config.scale("y-axis-1").unwrap().position.as_deref(), Some("left"));
    assert!(!config.options.plugins.no_data_message.active);
}

#[test]
fn chart_config_serializes_for_the_renderer() {
    let mut s = sample(7, 0, 10.0);
    s.memo = Some("note".into());
    let (presenter, _) = presenter_for(vec![s]);
    let json = serde_json::to_value(presenter.resource_chart()).unwrap();
    assert_eq!(json["type"], "line");
    assert_eq!(json["data"]["datasets"][0]["data"][0]["x"], millis_at_minute(0));
    assert_eq!(json["options"]["maintainAspectRatio"], false);
    let marker = &json["options"]["plugins"]["annotation"]["annotations"][0];
    assert_eq!(marker["scaleID"], "x");
    assert_eq!(marker["type"], "line");
}
