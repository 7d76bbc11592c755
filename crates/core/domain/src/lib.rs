//! 核心领域模型：事件载荷、状态枚举与领域常量。

pub mod constants;
pub mod data;

pub use data::{LogEvent, NormalizedSample, OutputWrite, StatusChange, TagSample};

/// 设备运行状态：两类监督器（仿真/输出）共用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Running,
    Stopped,
    Error,
}

impl DeviceStatus {
    /// 对外展示的小写状态文本（状态事件与 API 返回共用）。
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Running => "running",
            DeviceStatus::Stopped => "stopped",
            DeviceStatus::Error => "error",
        }
    }
}

/// 系统日志事件级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 获取当前时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
