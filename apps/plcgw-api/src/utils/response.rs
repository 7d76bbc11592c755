//! 错误响应构造与 Record 到 DTO 的转换
//!
//! - 错误响应：bad_request_error, not_found_error, storage_error, start_failed_error, stop_failed_error
//! - DTO 转换：device_to_dto, tag_to_dto, mapping_to_dto, sample_to_dto, 运行状态转换
//!
//! 约定：错误一律走 ApiResponse 外壳，错误码与 HTTP 状态一一对应；
//! 转换函数不做业务判断，只搬字段（protocol_config 会尝试解析 JSON）。

use api_contract::{
    ApiResponse, DeviceDto, EmulatedEndpointDto, EmulationStatusDto, MappingDto,
    NormalizedSampleDto, SimulatedDeviceDto, SimulationStatusDto, TagDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::NormalizedSample;
use plcgw_emulate::EmulationStatus;
use plcgw_simulate::SimulationStatus;
use plcgw_storage::{DeviceRecord, MappingRecord, StorageError, StorageErrorKind, TagRecord};

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 存储错误响应。按错误类别映射状态码：
/// 参数不合法 400、唯一性冲突 409、其余 500。
pub fn storage_error(err: StorageError) -> Response {
    let (status, code) = match err.kind() {
        StorageErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "INVALID.REQUEST"),
        StorageErrorKind::Conflict => (StatusCode::CONFLICT, "RESOURCE.CONFLICT"),
        StorageErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR"),
    };
    (status, Json(ApiResponse::<()>::error(code, err.to_string()))).into_response()
}

/// 设备启动失败响应。协议不支持、端口被占等都会走这里。
pub fn start_failed_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiResponse::<()>::error("DEVICE.START_FAILED", message.into())),
    )
        .into_response()
}

/// 设备停止失败响应
pub fn stop_failed_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("DEVICE.STOP_FAILED", message.into())),
    )
        .into_response()
}

/// DeviceRecord 转 DeviceDto。protocol_config 在库里存 JSON 字符串，
/// 出口解析回 JSON 值；解析失败按未配置处理。
pub fn device_to_dto(record: DeviceRecord) -> DeviceDto {
    let protocol_config = record
        .protocol_config
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok());
    DeviceDto {
        device_id: record.device_id,
        name: record.name,
        brand: record.brand,
        protocol: record.protocol,
        direction: record.direction,
        enabled: record.enabled,
        port: record.port,
        endpoint: record.endpoint,
        protocol_config,
    }
}

/// TagRecord 转 TagDto
pub fn tag_to_dto(record: TagRecord) -> TagDto {
    TagDto {
        tag_id: record.tag_id,
        device_id: record.device_id,
        name: record.name,
        address: record.address,
        data_type: record.data_type,
        unit: record.unit,
        value: record.value,
        quality: record.quality,
        signal_type: record.signal_type,
        frequency: record.frequency,
        amplitude: record.amplitude,
        offset: record.offset,
    }
}

/// MappingRecord 转 MappingDto
pub fn mapping_to_dto(record: MappingRecord) -> MappingDto {
    MappingDto {
        mapping_id: record.mapping_id,
        input_tag_id: record.input_tag_id,
        output_device_id: record.output_device_id,
        output_tag_name: record.output_tag_name,
        output_address: record.output_address,
        scale_factor: record.scale_factor,
        offset: record.offset,
        enabled: record.enabled,
    }
}

/// NormalizedSample 转 NormalizedSampleDto
pub fn sample_to_dto(sample: NormalizedSample) -> NormalizedSampleDto {
    NormalizedSampleDto {
        device_id: sample.device_id,
        tag_name: sample.tag_name,
        value: sample.value,
        unit: sample.unit,
        quality: sample.quality,
        timestamp: sample.ts_ms,
    }
}

/// 仿真侧运行状态转 DTO
pub fn simulation_status_to_dto(status: SimulationStatus) -> SimulationStatusDto {
    SimulationStatusDto {
        active: status.active,
        devices: status
            .devices
            .into_iter()
            .map(|device| SimulatedDeviceDto {
                device_id: device.device_id,
                name: device.name,
                tag_count: device.tag_count,
            })
            .collect(),
    }
}

/// 输出侧运行状态转 DTO
pub fn emulation_status_to_dto(status: EmulationStatus) -> EmulationStatusDto {
    EmulationStatusDto {
        active: status.active,
        endpoints: status
            .endpoints
            .into_iter()
            .map(|endpoint| EmulatedEndpointDto {
                device_id: endpoint.device_id,
                device_name: endpoint.device_name,
                protocol: endpoint.protocol,
                port: endpoint.port,
                endpoint: endpoint.endpoint,
                variable_count: endpoint.variable_count,
            })
            .collect(),
    }
}
