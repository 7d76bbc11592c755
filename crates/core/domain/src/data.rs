use crate::{DeviceStatus, LogLevel, now_epoch_ms};

/// 信号源产生的一次标签采样。
#[derive(Debug, Clone)]
pub struct TagSample {
    pub device_id: String,
    pub tag_id: String,
    pub tag_name: String,
    pub value: f64,
    pub quality: String,
    pub ts_ms: i64,
}

/// 路由引擎产生的一次输出写请求。
///
/// 不携带时间戳：写入方在落到变量时打上最新时间。
#[derive(Debug, Clone)]
pub struct OutputWrite {
    pub target_device_id: String,
    pub tag_name: String,
    pub address: String,
    pub value: f64,
    pub quality: String,
}

/// 设备状态变更事件。
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub device_id: String,
    pub device_name: String,
    pub status: DeviceStatus,
    pub message: Option<String>,
    pub ts_ms: i64,
}

impl StatusChange {
    pub fn new(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        status: DeviceStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            status,
            message,
            ts_ms: now_epoch_ms(),
        }
    }
}

/// 系统日志事件（经事件中枢广播给外部观察者）。
///
/// 时间戳在构造时打上，订阅方收到的即发布时刻。
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    pub ts_ms: i64,
}

impl LogEvent {
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            ts_ms: now_epoch_ms(),
        }
    }
}

/// 归一化后的最新值（按 设备+标签 各缓存一条）。
#[derive(Debug, Clone)]
pub struct NormalizedSample {
    pub device_id: String,
    pub tag_name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub quality: String,
    pub ts_ms: i64,
}
