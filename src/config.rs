use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides `backend.base_path`.
pub const BASE_PATH_ENV: &str = "BACKEND_BASE_PATH";

/// Placeholder text when `charts.no_data_message` is not set.
pub const DEFAULT_NO_DATA_MESSAGE: &str = "No data available";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Prefix every backend path is joined onto, e.g. `http://localhost:8080/springdog/`.
    /// Absence is reported when the first request is attempted.
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Daily endpoint metrics for the dashboard chart; skipped when unset.
    #[serde(default)]
    pub endpoint_metrics_path: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_metrics_path() -> String {
    "system-watch/metrics".into()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    /// Max number of render frames kept for /ws/charts (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Placeholder drawn when every series of a chart is empty.
    #[serde(default = "default_no_data_message")]
    pub no_data_message: String,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
            no_data_message: default_no_data_message(),
        }
    }
}

fn default_broadcast_capacity() -> usize {
    16
}

fn default_no_data_message() -> String {
    DEFAULT_NO_DATA_MESSAGE.into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let mut config = Self::load_from_path(&path)?;
        config.apply_base_path_override(std::env::var(BASE_PATH_ENV).ok());
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// A non-blank value replaces whatever the file configured.
    pub fn apply_base_path_override(&mut self, value: Option<String>) {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.backend.base_path = Some(v);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            !self.backend.metrics_path.trim().is_empty(),
            "backend.metrics_path must be non-empty"
        );
        anyhow::ensure!(
            self.backend.request_timeout_ms > 0,
            "backend.request_timeout_ms must be > 0, got {}",
            self.backend.request_timeout_ms
        );
        anyhow::ensure!(
            self.charts.broadcast_capacity > 0,
            "charts.broadcast_capacity must be > 0, got {}",
            self.charts.broadcast_capacity
        );
        Ok(())
    }
}
