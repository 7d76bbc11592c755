//! 追踪初始化、请求 ID 生成与进程计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 单次 HTTP 请求的追踪标识对。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 管道计数快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub samples_generated: u64,
    pub sample_persist_failures: u64,
    pub events_published: u64,
    pub subscriber_lag_drops: u64,
    pub writes_routed: u64,
    pub writes_applied: u64,
    pub endpoint_starts: u64,
    pub endpoint_failures: u64,
    pub relay_connections: u64,
}

/// 管道计数器。
pub struct TelemetryMetrics {
    samples_generated: AtomicU64,
    sample_persist_failures: AtomicU64,
    events_published: AtomicU64,
    subscriber_lag_drops: AtomicU64,
    writes_routed: AtomicU64,
    writes_applied: AtomicU64,
    endpoint_starts: AtomicU64,
    endpoint_failures: AtomicU64,
    relay_connections: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            samples_generated: AtomicU64::new(0),
            sample_persist_failures: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
            subscriber_lag_drops: AtomicU64::new(0),
            writes_routed: AtomicU64::new(0),
            writes_applied: AtomicU64::new(0),
            endpoint_starts: AtomicU64::new(0),
            endpoint_failures: AtomicU64::new(0),
            relay_connections: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_generated: self.samples_generated.load(Ordering::Relaxed),
            sample_persist_failures: self.sample_persist_failures.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            subscriber_lag_drops: self.subscriber_lag_drops.load(Ordering::Relaxed),
            writes_routed: self.writes_routed.load(Ordering::Relaxed),
            writes_applied: self.writes_applied.load(Ordering::Relaxed),
            endpoint_starts: self.endpoint_starts.load(Ordering::Relaxed),
            endpoint_failures: self.endpoint_failures.load(Ordering::Relaxed),
            relay_connections: self.relay_connections.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（级别取 PLCGW_LOG，默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("PLCGW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 为一次请求生成全新的标识对。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录信号发生器产出样本次数。
pub fn record_sample_generated() {
    metrics().samples_generated.fetch_add(1, Ordering::Relaxed);
}

/// 记录样本落库失败次数。
pub fn record_sample_persist_failure() {
    metrics()
        .sample_persist_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录事件中枢发布次数。
pub fn record_event_published() {
    metrics().events_published.fetch_add(1, Ordering::Relaxed);
}

/// 记录订阅端因滞后被跳过的事件条数。
pub fn record_subscriber_lag_drops(skipped: u64) {
    metrics()
        .subscriber_lag_drops
        .fetch_add(skipped, Ordering::Relaxed);
}

/// 记录路由引擎产生输出写请求次数。
pub fn record_write_routed() {
    metrics().writes_routed.fetch_add(1, Ordering::Relaxed);
}

/// 记录输出端点实际应用写入次数。
pub fn record_write_applied() {
    metrics().writes_applied.fetch_add(1, Ordering::Relaxed);
}

/// 记录协议端点启动成功次数。
pub fn record_endpoint_start() {
    metrics().endpoint_starts.fetch_add(1, Ordering::Relaxed);
}

/// 记录协议端点启动失败次数。
pub fn record_endpoint_failure() {
    metrics().endpoint_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录广播中继接入连接次数。
pub fn record_relay_connection() {
    metrics().relay_connections.fetch_add(1, Ordering::Relaxed);
}
