//! 设备 CRUD 与生命周期 handlers
//!
//! 提供设备资源的增删改查和启停接口：
//! - GET /api/devices - 列出设备（可按 direction / enabled 过滤）
//! - POST /api/devices - 创建设备
//! - GET /api/devices/{id} - 获取设备详情
//! - PUT /api/devices/{id} - 更新设备
//! - DELETE /api/devices/{id} - 删除设备（先停运行实例，级联删点位与映射）
//! - POST /api/devices/{id}/start - 启动设备（按 direction 分派到对应监督器）
//! - POST /api/devices/{id}/stop - 停止设备
//!
//! 方向语义：
//! - SOURCE 设备由仿真监督器驱动，按 tick 周期生成波形采样
//! - SINK 设备由输出监督器驱动，启动协议端点对外提供变量

use crate::AppState;
use crate::utils::response::{
    bad_request_error, device_to_dto, not_found_error, start_failed_error, stop_failed_error,
    storage_error,
};
use crate::utils::{normalize_optional, normalize_protocol, normalize_required};
use api_contract::{ApiResponse, CreateDeviceRequest, DeviceDto, DeviceQuery, UpdateDeviceRequest};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::constants;
use plcgw_storage::{DeviceFilter, DeviceRecord, DeviceUpdate};
use tracing::warn;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct DevicePath {
    device_id: String,
}

/// 列出设备
///
/// 查询设备列表，支持按方向和启用状态过滤。
///
/// # 参数
///
/// - `state`: 应用状态，包含设备存储实例
/// - `query`: 查询参数，`direction`（SOURCE/SINK）与 `enabled` 均可选
///
/// # 返回
///
/// 成功时返回 `200 OK` 和设备列表，失败时返回相应的错误响应。
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Response {
    let filter = DeviceFilter {
        direction: query.direction,
        enabled: query.enabled,
    };

    match state.devices.list_devices(filter).await {
        Ok(records) => {
            let devices: Vec<DeviceDto> = records.into_iter().map(device_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(devices))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 创建设备
///
/// # 参数
///
/// - `state`: 应用状态，包含设备存储实例
/// - `req`: 创建请求体，`name` 与 `protocol` 必填，`direction` 缺省为 SOURCE
///
/// # 返回
///
/// 成功时返回 `200 OK` 和新建的设备，失败时返回相应的错误响应。
///
/// # 流程
///
/// 1. 规整必填字段（name、protocol），协议名统一为大写
/// 2. 生成 UUID 作为 device_id，新设备默认未启用、无端点
/// 3. protocol_config 以 JSON 字符串落库
/// 4. 存储层校验 direction 合法性与名称唯一性
///
/// # 错误处理
///
/// - `400 BAD REQUEST`: 必填字段为空或 direction 非法
/// - `409 CONFLICT`: 设备名称已存在
/// - `500 INTERNAL SERVER ERROR`: 存储层错误
pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<CreateDeviceRequest>,
) -> Response {
    let name = match normalize_required(req.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let protocol = match normalize_protocol(req.protocol) {
        Ok(protocol) => protocol,
        Err(response) => return response,
    };
    let direction = req
        .direction
        .unwrap_or_else(|| constants::DIRECTION_SOURCE.to_string());

    let record = DeviceRecord {
        device_id: Uuid::new_v4().to_string(),
        name,
        brand: req.brand,
        protocol,
        direction,
        enabled: false,
        port: req.port,
        endpoint: None,
        protocol_config: req.protocol_config.map(|value| value.to_string()),
    };

    match state.devices.create_device(record).await {
        Ok(created) => {
            (StatusCode::OK, Json(ApiResponse::success(device_to_dto(created)))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 获取设备详情
pub async fn get_device(State(state): State<AppState>, Path(path): Path<DevicePath>) -> Response {
    match state.devices.find_device(&path.device_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(device_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 更新设备
///
/// 部分更新：只更新请求体中出现的字段。全空的请求体视为无效。
/// enabled 与 endpoint 不在此接口更新，它们由启停动作回写。
pub async fn update_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Response {
    let name = match normalize_optional(req.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let protocol = match req.protocol.map(normalize_protocol).transpose() {
        Ok(protocol) => protocol,
        Err(response) => return response,
    };

    let update = DeviceUpdate {
        name,
        brand: req.brand,
        protocol,
        port: req.port,
        protocol_config: req.protocol_config.map(|value| value.to_string()),
    };
    if update.name.is_none()
        && update.brand.is_none()
        && update.protocol.is_none()
        && update.port.is_none()
        && update.protocol_config.is_none()
    {
        return bad_request_error("empty update");
    }

    match state.devices.update_device(&path.device_id, update).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(device_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 删除设备
///
/// 删除前先停掉两侧可能存在的运行实例。停止失败只记日志，
/// 不阻挡删除；点位与映射由存储层级联清理。
pub async fn delete_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
) -> Response {
    if let Err(err) = state.simulation.stop(&path.device_id).await {
        warn!(
            target: "plcgw.api",
            device_id = %path.device_id,
            error = %err,
            "stop_before_delete_failed"
        );
    }
    if let Err(err) = state.emulation.stop(&path.device_id).await {
        warn!(
            target: "plcgw.api",
            device_id = %path.device_id,
            error = %err,
            "stop_before_delete_failed"
        );
    }

    match state.devices.delete_device(&path.device_id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success(()))).into_response(),
        Ok(false) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 启动设备
///
/// # 流程
///
/// 1. 查设备，不存在返回 404
/// 2. 按 direction 分派：SOURCE 交给仿真监督器，SINK 交给输出监督器
/// 3. 启动失败返回 502 并携带原因（协议不支持、端口被占等）
/// 4. 成功后回读设备返回最新状态（输出侧启动会写回端口与端点地址）
///
/// 已在运行的设备重复启动是无害操作，同样返回当前状态。
pub async fn start_device(State(state): State<AppState>, Path(path): Path<DevicePath>) -> Response {
    let device = match state.devices.find_device(&path.device_id).await {
        Ok(Some(device)) => device,
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    };

    let failure = if device.direction == constants::DIRECTION_SINK {
        state.emulation.start(&device).await.err().map(|err| err.to_string())
    } else {
        state.simulation.start(&device).await.err().map(|err| err.to_string())
    };
    if let Some(message) = failure {
        return start_failed_error(message);
    }

    match state.devices.find_device(&path.device_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(device_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 停止设备
///
/// 与启动对称。未在运行的设备停止是无害操作。
pub async fn stop_device(State(state): State<AppState>, Path(path): Path<DevicePath>) -> Response {
    let device = match state.devices.find_device(&path.device_id).await {
        Ok(Some(device)) => device,
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    };

    let failure = if device.direction == constants::DIRECTION_SINK {
        state.emulation.stop(&path.device_id).await.err().map(|err| err.to_string())
    } else {
        state.simulation.stop(&path.device_id).await.err().map(|err| err.to_string())
    };
    if let Some(message) = failure {
        return stop_failed_error(message);
    }

    match state.devices.find_device(&path.device_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(device_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
