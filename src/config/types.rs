use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Canvas-Export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Remote service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    /// Base URL of the Canvas instance (e.g., "https://canvas.example.edu")
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Personal access token; may also come from the environment or the CLI
    #[serde(rename = "api-token", default)]
    pub api_token: Option<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
        }
    }
}

fn default_api_url() -> String {
    "https://canvas.instructure.com".to_string()
}

/// Adaptive pacing settings shared by every remote call
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Interval between calls at startup (milliseconds)
    #[serde(rename = "initial-interval-ms", default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Floor the interval never drops below (milliseconds)
    #[serde(rename = "min-interval-ms", default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Ceiling the interval never exceeds (milliseconds)
    #[serde(rename = "max-interval-ms", default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Consecutive successes required before speeding up
    #[serde(rename = "success-threshold", default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Multiplier applied to the interval on speed-up (< 1)
    #[serde(rename = "speedup-factor", default = "default_speedup_factor")]
    pub speedup_factor: f64,

    /// Multiplier applied to the interval on a soft throttle (> 1)
    #[serde(rename = "slowdown-factor", default = "default_slowdown_factor")]
    pub slowdown_factor: f64,

    /// Pause enforced after a hard throttle (seconds)
    #[serde(rename = "cooldown-secs", default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl PacingConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            success_threshold: default_success_threshold(),
            speedup_factor: default_speedup_factor(),
            slowdown_factor: default_slowdown_factor(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Retry and backoff settings for failed remote calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries for transient failures (throttles are not counted)
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first transient retry (milliseconds)
    #[serde(rename = "base-backoff-ms", default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Growth factor applied per transient retry
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound of the uniform random jitter added to each backoff (milliseconds)
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Settle time after a soft throttle before retrying (milliseconds)
    #[serde(rename = "soft-throttle-pause-ms", default = "default_soft_throttle_pause_ms")]
    pub soft_throttle_pause_ms: u64,
}

impl RetryConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn soft_throttle_pause(&self) -> Duration {
        Duration::from_millis(self.soft_throttle_pause_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            jitter_ms: default_jitter_ms(),
            soft_throttle_pause_ms: default_soft_throttle_pause_ms(),
        }
    }
}

/// Export output settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Number of concurrent worker tasks shared by the whole run
    #[serde(rename = "worker-count", default = "default_worker_count")]
    pub worker_count: u32,

    /// Directory that receives one sub-directory per course
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,

    /// Whether embedded images are downloaded next to the document
    #[serde(rename = "download-images", default)]
    pub download_images: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            output_dir: default_output_dir(),
            download_images: false,
        }
    }
}

fn default_initial_interval_ms() -> u64 {
    100
}

fn default_min_interval_ms() -> u64 {
    10
}

fn default_max_interval_ms() -> u64 {
    5000
}

fn default_success_threshold() -> u32 {
    50
}

fn default_speedup_factor() -> f64 {
    0.9
}

fn default_slowdown_factor() -> f64 {
    2.0
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_soft_throttle_pause_ms() -> u64 {
    1000
}

fn default_worker_count() -> u32 {
    16
}

fn default_output_dir() -> String {
    "Canvas_Exports".to_string()
}
