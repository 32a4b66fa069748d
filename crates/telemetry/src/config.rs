use std::collections::HashMap;
use std::time::Duration;

use opentelemetry_sdk::trace::Sampler;
use serde::{Deserialize, Serialize};

/// Sampling policy applied to the span pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "policy", content = "ratio")]
pub enum SamplingPolicy {
    AlwaysOn,
    AlwaysOff,
    Ratio(f64),
}

impl SamplingPolicy {
    /// Maps the policy onto an SDK sampler. Out-of-range ratios collapse to
    /// the nearest constant sampler.
    pub fn to_sampler(&self) -> Sampler {
        match self {
            Self::AlwaysOn => Sampler::AlwaysOn,
            Self::AlwaysOff => Sampler::AlwaysOff,
            Self::Ratio(ratio) if *ratio >= 1.0 => Sampler::AlwaysOn,
            Self::Ratio(ratio) if *ratio <= 0.0 => Sampler::AlwaysOff,
            Self::Ratio(ratio) => Sampler::TraceIdRatioBased(*ratio),
        }
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::AlwaysOn
    }
}

// Configuration for traces
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TracesConfig {
    #[serde(default)]
    pub sampling: SamplingPolicy,
}

// Configuration for metrics
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MetricsConfig {
    /// Interval between pushes of accumulated metrics to the collector.
    #[serde(default = "default_push_interval_secs")]
    pub push_interval_secs: u64,
}

impl MetricsConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            push_interval_secs: default_push_interval_secs(),
        }
    }
}

// Configuration for profiles. The profiler is an external subsystem; pulse
// only co-schedules its start and stop.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
}

// Configuration for telemetry components
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Master switch. When false no collector connection is attempted and
    /// the request pipeline runs uninstrumented.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP/gRPC collector endpoint, shared by the trace and metric
    /// exporters.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,
    #[serde(default)]
    pub traces: TracesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// Labels attached to every emitted span and metric.
    #[serde(default)]
    pub global_labels: HashMap<String, String>,
}

impl TelemetryConfig {
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            endpoint: default_endpoint(),
            export_timeout_secs: default_export_timeout_secs(),
            traces: TracesConfig::default(),
            metrics: MetricsConfig::default(),
            profiles: ProfilesConfig::default(),
            global_labels: HashMap::new(),
        }
    }
}

fn default_service_name() -> String {
    "pulse".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:4317".to_string()
}

const fn default_push_interval_secs() -> u64 {
    60
}

const fn default_export_timeout_secs() -> u64 {
    5
}
