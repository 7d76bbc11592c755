//! HTTP 层的请求/响应结构，字段名一律 camelCase。

use serde::{Deserialize, Serialize};

/// 所有接口共用的响应外壳。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 错误码加可读信息。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 创建设备的请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    pub name: String,
    pub brand: Option<String>,
    pub protocol: String,
    /// `SOURCE`（仿真输入）或 `SINK`（输出模拟），缺省为 `SOURCE`。
    pub direction: Option<String>,
    pub port: Option<u16>,
    pub protocol_config: Option<serde_json::Value>,
}

/// 设备更新请求体。方向在创建后不可变更。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub protocol_config: Option<serde_json::Value>,
}

/// 设备信息返回给前端的形态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub device_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub protocol: String,
    pub direction: String,
    pub enabled: bool,
    pub port: Option<u16>,
    pub endpoint: Option<String>,
    pub protocol_config: Option<serde_json::Value>,
}

/// 设备列表查询参数。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub direction: Option<String>,
    pub enabled: Option<bool>,
}

/// 点位（tag）创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub device_id: String,
    pub name: String,
    pub address: String,
    pub data_type: Option<String>,
    pub unit: Option<String>,
    /// 波形类型：`SINE` / `RAMP` / `RANDOM` / `DIGITAL`，缺省 `SINE`。
    pub signal_type: Option<String>,
    pub frequency: Option<f64>,
    pub amplitude: Option<f64>,
    pub offset: Option<f64>,
}

/// 更新点位的请求体，全部字段可选。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub data_type: Option<String>,
    pub unit: Option<String>,
    pub signal_type: Option<String>,
    pub frequency: Option<f64>,
    pub amplitude: Option<f64>,
    pub offset: Option<f64>,
}

/// 点位信息返回给前端的形态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub tag_id: String,
    pub device_id: String,
    pub name: String,
    pub address: String,
    pub data_type: String,
    pub unit: Option<String>,
    pub value: f64,
    pub quality: String,
    pub signal_type: String,
    pub frequency: Option<f64>,
    pub amplitude: Option<f64>,
    pub offset: Option<f64>,
}

/// 路由映射创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMappingRequest {
    pub input_tag_id: String,
    pub output_device_id: String,
    pub output_tag_name: String,
    pub output_address: String,
    pub scale_factor: Option<f64>,
    pub offset: Option<f64>,
    pub enabled: Option<bool>,
}

/// 路由映射更新请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMappingRequest {
    pub output_tag_name: Option<String>,
    pub output_address: Option<String>,
    pub scale_factor: Option<f64>,
    pub offset: Option<f64>,
    pub enabled: Option<bool>,
}

/// 路由映射返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDto {
    pub mapping_id: String,
    pub input_tag_id: String,
    pub output_device_id: String,
    pub output_tag_name: String,
    pub output_address: String,
    pub scale_factor: Option<f64>,
    pub offset: Option<f64>,
    pub enabled: bool,
}

/// 单台仿真设备的运行摘要。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedDeviceDto {
    pub device_id: String,
    pub name: String,
    pub tag_count: usize,
}

/// 仿真监督器状态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatusDto {
    pub active: usize,
    pub devices: Vec<SimulatedDeviceDto>,
}

/// 单个输出端点的运行摘要。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmulatedEndpointDto {
    pub device_id: String,
    pub device_name: String,
    pub protocol: String,
    pub port: u16,
    pub endpoint: String,
    pub variable_count: usize,
}

/// 输出模拟监督器状态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmulationStatusDto {
    pub active: usize,
    pub endpoints: Vec<EmulatedEndpointDto>,
}

/// 网关整体状态（GET /api/status）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatusDto {
    pub simulation: SimulationStatusDto,
    pub emulation: EmulationStatusDto,
}

/// 规整后实时值返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSampleDto {
    pub device_id: String,
    pub tag_name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub quality: String,
    pub timestamp: i64,
}

/// Telemetry 计数快照返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
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

/// 健康检查返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub service: String,
    pub version: String,
    pub status: String,
}
