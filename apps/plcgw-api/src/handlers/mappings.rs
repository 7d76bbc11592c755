//! 映射 CRUD handlers
//!
//! - GET /api/mappings - 列出全部映射
//! - POST /api/mappings - 创建映射
//! - GET /api/mappings/{id} - 获取映射详情
//! - PUT /api/mappings/{id} - 更新映射
//! - DELETE /api/mappings/{id} - 删除映射
//!
//! 一条映射把某个输入点位接到某台 SINK 设备的一个输出变量上，
//! 路由时按 value * scale_factor + offset 变换。存储层校验输入
//! 点位存在、输出设备存在且方向为 SINK。

use crate::AppState;
use crate::utils::response::{mapping_to_dto, not_found_error, storage_error};
use crate::utils::{normalize_optional, normalize_required};
use api_contract::{ApiResponse, CreateMappingRequest, MappingDto, UpdateMappingRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plcgw_storage::{MappingRecord, MappingUpdate};
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct MappingPath {
    mapping_id: String,
}

/// 列出全部映射
pub async fn list_mappings(State(state): State<AppState>) -> Response {
    match state.mappings.list_mappings().await {
        Ok(records) => {
            let mappings: Vec<MappingDto> = records.into_iter().map(mapping_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(mappings))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 创建映射。enabled 缺省为 true，scale_factor 与 offset 缺省时
/// 路由按 1.0 / 0.0 处理。
pub async fn create_mapping(
    State(state): State<AppState>,
    Json(req): Json<CreateMappingRequest>,
) -> Response {
    let output_tag_name = match normalize_required(req.output_tag_name, "outputTagName") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let output_address = match normalize_required(req.output_address, "outputAddress") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let record = MappingRecord {
        mapping_id: Uuid::new_v4().to_string(),
        input_tag_id: req.input_tag_id,
        output_device_id: req.output_device_id,
        output_tag_name,
        output_address,
        scale_factor: req.scale_factor,
        offset: req.offset,
        enabled: req.enabled.unwrap_or(true),
    };

    match state.mappings.create_mapping(record).await {
        Ok(created) => {
            (StatusCode::OK, Json(ApiResponse::success(mapping_to_dto(created)))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 获取映射详情
pub async fn get_mapping(State(state): State<AppState>, Path(path): Path<MappingPath>) -> Response {
    match state.mappings.find_mapping(&path.mapping_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(mapping_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 更新映射
pub async fn update_mapping(
    State(state): State<AppState>,
    Path(path): Path<MappingPath>,
    Json(req): Json<UpdateMappingRequest>,
) -> Response {
    let output_tag_name = match normalize_optional(req.output_tag_name, "outputTagName") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let output_address = match normalize_optional(req.output_address, "outputAddress") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let update = MappingUpdate {
        output_tag_name,
        output_address,
        scale_factor: req.scale_factor,
        offset: req.offset,
        enabled: req.enabled,
    };

    match state.mappings.update_mapping(&path.mapping_id, update).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(ApiResponse::success(mapping_to_dto(record)))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 删除映射
pub async fn delete_mapping(
    State(state): State<AppState>,
    Path(path): Path<MappingPath>,
) -> Response {
    match state.mappings.delete_mapping(&path.mapping_id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success(()))).into_response(),
        Ok(false) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
