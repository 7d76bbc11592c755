//! 点位 CRUD handlers
//!
//! - GET /api/devices/{id}/tags - 列出设备下的点位
//! - POST /api/tags - 创建点位
//! - GET /api/tags/{id} - 获取点位详情
//! - PUT /api/tags/{id} - 更新点位
//! - DELETE /api/tags/{id} - 删除点位（相关映射级联清理）
//!
//! 波形参数（signal_type / frequency / amplitude / offset）只对
//! SOURCE 设备的点位有意义，生成器在缺省时使用内部默认值。

use crate::AppState;
use crate::utils::response::{not_found_error, storage_error, tag_to_dto};
use crate::utils::{normalize_optional, normalize_required};
use api_contract::{ApiResponse, CreateTagRequest, TagDto, UpdateTagRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::constants;
use plcgw_storage::{TagRecord, TagUpdate};
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct TagDevicePath {
    device_id: String,
}

#[derive(serde::Deserialize)]
pub struct TagPath {
    tag_id: String,
}

/// 列出设备下的点位
pub async fn list_device_tags(
    State(state): State<AppState>,
    Path(path): Path<TagDevicePath>,
) -> Response {
    match state.devices.find_device(&path.device_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    }

    match state.tags.list_tags(&path.device_id).await {
        Ok(records) => {
            let tags: Vec<TagDto> = records.into_iter().map(tag_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(tags))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 创建点位
///
/// data_type 缺省 FLOAT，signal_type 缺省 SINE，初始值 0.0、质量 GOOD。
/// 存储层校验目标设备存在与名称唯一性。
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> Response {
    let name = match normalize_required(req.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let address = match normalize_required(req.address, "address") {
        Ok(address) => address,
        Err(response) => return response,
    };

    let record = TagRecord {
        tag_id: Uuid::new_v4().to_string(),
        device_id: req.device_id,
        name,
        address,
        data_type: req.data_type.unwrap_or_else(|| "FLOAT".to_string()),
        unit: req.unit,
        value: 0.0,
        quality: constants::QUALITY_GOOD.to_string(),
        signal_type: req
            .signal_type
            .unwrap_or_else(|| constants::SIGNAL_SINE.to_string()),
        frequency: req.frequency,
        amplitude: req.amplitude,
        offset: req.offset,
    };

    match state.tags.create_tag(record).await {
        Ok(created) => {
            (StatusCode::OK, Json(ApiResponse::success(tag_to_dto(created)))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 获取点位详情
pub async fn get_tag(State(state): State<AppState>, Path(path): Path<TagPath>) -> Response {
    match state.tags.find_tag(&path.tag_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(tag_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 更新点位
pub async fn update_tag(
    State(state): State<AppState>,
    Path(path): Path<TagPath>,
    Json(req): Json<UpdateTagRequest>,
) -> Response {
    let name = match normalize_optional(req.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let address = match normalize_optional(req.address, "address") {
        Ok(address) => address,
        Err(response) => return response,
    };

    let update = TagUpdate {
        name,
        address,
        data_type: req.data_type,
        unit: req.unit,
        signal_type: req.signal_type,
        frequency: req.frequency,
        amplitude: req.amplitude,
        offset: req.offset,
    };

    match state.tags.update_tag(&path.tag_id, update).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(tag_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 删除点位
pub async fn delete_tag(State(state): State<AppState>, Path(path): Path<TagPath>) -> Response {
    match state.tags.delete_tag(&path.tag_id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success(()))).into_response(),
        Ok(false) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
