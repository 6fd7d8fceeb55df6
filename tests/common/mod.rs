// Shared test helpers
#![allow(dead_code)]

use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};
use watchboard::models::*;
use watchboard::presenter::ChartKind;
use watchboard::presenter::ChartRenderer;
use watchboard::presenter::chart::ChartConfig;

pub fn at_minute(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(12, minute, 0)
        .unwrap()
}

pub fn millis_at_minute(minute: u32) -> i64 {
    at_minute(minute).and_utc().timestamp_millis()
}

/// Sample with every field populated; percentages all equal `percent`.
pub fn sample(id: i64, minute: u32, percent: f64) -> MetricSample {
    MetricSample {
        id,
        timestamp: at_minute(minute),
        cpu_usage_percent: Some(percent),
        memory_usage_percent: Some(percent),
        disk_usage_percent: Some(percent),
        jvm_heap_usage_percent: Some(percent),
        jvm_non_heap_usage_percent: Some(percent),
        jvm_total_memory_used: Some(0),
        network_in_bytes: Some(0),
        network_out_bytes: Some(0),
        memo: None,
        label: None,
    }
}

pub fn minimal_sample(id: i64, minute: u32) -> MetricSample {
    MetricSample {
        id,
        timestamp: at_minute(minute),
        cpu_usage_percent: None,
        memory_usage_percent: None,
        disk_usage_percent: None,
        jvm_heap_usage_percent: None,
        jvm_non_heap_usage_percent: None,
        jvm_total_memory_used: None,
        network_in_bytes: None,
        network_out_bytes: None,
        memo: None,
        label: None,
    }
}

/// Renderer that records every frame it is handed.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<(ChartKind, ChartConfig)>>>,
}

impl RecordingRenderer {
    pub fn kinds(&self) -> Vec<ChartKind> {
        self.frames.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn last(&self, kind: ChartKind) -> Option<ChartConfig> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| c.clone())
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }
}

impl ChartRenderer for RecordingRenderer {
    fn render(&self, kind: ChartKind, config: &ChartConfig) {
        self.frames.lock().unwrap().push((kind, config.clone()));
    }
}

/// Serves `router` on an ephemeral local port; returns the base path (`http://addr/api/`).
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api/")
}
