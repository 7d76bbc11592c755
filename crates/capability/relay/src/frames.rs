//! 广播帧的线上格式。
//!
//! 每帧一行 JSON，外层 `event` 标注类型、`data` 携带载荷，
//! 字段名一律驼峰。

use serde::Serialize;

use domain::{LogEvent, StatusChange, TagSample};
use plcgw_bus::GatewayEvent;

/// 下行广播帧。
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum RelayFrame {
    #[serde(rename = "tag:update")]
    TagUpdate(TagUpdateFrame),
    #[serde(rename = "plc:status")]
    PlcStatus(StatusFrame),
    #[serde(rename = "system:log")]
    SystemLog(LogFrame),
}

/// 点位新值帧。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUpdateFrame {
    pub device_id: String,
    pub tag_id: String,
    pub tag_name: String,
    pub value: f64,
    pub quality: String,
    pub timestamp: i64,
}

/// 设备状态变化帧。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFrame {
    pub device_id: String,
    pub device_name: String,
    pub status: String,
    pub message: Option<String>,
}

/// 管道日志帧。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFrame {
    pub level: String,
    pub source: String,
    pub message: String,
    pub timestamp: i64,
}

impl RelayFrame {
    /// 把中枢事件转成广播帧。只有三类事件对外广播，
    /// 输出写请求属于管道内部流量，返回 `None`。
    pub fn from_event(event: GatewayEvent) -> Option<Self> {
        match event {
            GatewayEvent::TagUpdate(sample) => Some(Self::TagUpdate(sample.into())),
            GatewayEvent::Status(change) => Some(Self::PlcStatus(change.into())),
            GatewayEvent::Log(log) => Some(Self::SystemLog(log.into())),
            GatewayEvent::WriteRequest(_) => None,
        }
    }
}

impl From<TagSample> for TagUpdateFrame {
    fn from(sample: TagSample) -> Self {
        Self {
            device_id: sample.device_id,
            tag_id: sample.tag_id,
            tag_name: sample.tag_name,
            value: sample.value,
            quality: sample.quality,
            timestamp: sample.ts_ms,
        }
    }
}

impl From<StatusChange> for StatusFrame {
    fn from(change: StatusChange) -> Self {
        Self {
            device_id: change.device_id,
            device_name: change.device_name,
            status: change.status.as_str().to_string(),
            message: change.message,
        }
    }
}

impl From<LogEvent> for LogFrame {
    fn from(log: LogEvent) -> Self {
        Self {
            level: log.level.as_str().to_string(),
            source: log.source,
            message: log.message,
            timestamp: log.ts_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DeviceStatus, LogLevel, OutputWrite};
    use serde_json::json;

    #[test]
    fn tag_update_frame_shape() {
        let frame = RelayFrame::from_event(GatewayEvent::TagUpdate(TagSample {
            device_id: "dev-1".to_string(),
            tag_id: "tag-1".to_string(),
            tag_name: "Pressure_Tank1".to_string(),
            value: 112.5,
            quality: "GOOD".to_string(),
            ts_ms: 1_700_000_000_000,
        }))
        .expect("frame");

        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(
            value,
            json!({
                "event": "tag:update",
                "data": {
                    "deviceId": "dev-1",
                    "tagId": "tag-1",
                    "tagName": "Pressure_Tank1",
                    "value": 112.5,
                    "quality": "GOOD",
                    "timestamp": 1_700_000_000_000_i64,
                }
            })
        );
    }

    #[test]
    fn status_frame_shape() {
        let frame = RelayFrame::from_event(GatewayEvent::Status(StatusChange::new(
            "dev-1",
            "Siemens S7-1500",
            DeviceStatus::Running,
            Some("simulation started".to_string()),
        )))
        .expect("frame");

        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["event"], "plc:status");
        assert_eq!(value["data"]["deviceId"], "dev-1");
        assert_eq!(value["data"]["deviceName"], "Siemens S7-1500");
        assert_eq!(value["data"]["status"], "running");
        assert_eq!(value["data"]["message"], "simulation started");
    }

    #[test]
    fn log_frame_shape() {
        let frame = RelayFrame::from_event(GatewayEvent::Log(LogEvent::new(
            LogLevel::Warn,
            "simulation",
            "persist failed for tag Pressure_Tank1",
        )))
        .expect("frame");

        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["event"], "system:log");
        assert_eq!(value["data"]["level"], "warn");
        assert_eq!(value["data"]["source"], "simulation");
        assert!(value["data"]["timestamp"].is_i64());
    }

    #[test]
    fn write_requests_stay_internal() {
        let frame = RelayFrame::from_event(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: "dev-2".to_string(),
            tag_name: "Gateway_Pressure".to_string(),
            address: "ns=1;s=Pressure".to_string(),
            value: 7.75,
            quality: "GOOD".to_string(),
        }));
        assert!(frame.is_none());
    }
}
