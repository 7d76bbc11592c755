//! 实时数据查询
//!
//! 路由引擎内存缓存的只读视图，每个 设备+点位 一行最新归一化采样。

use crate::AppState;
use crate::utils::response::sample_to_dto;
use api_contract::{ApiResponse, NormalizedSampleDto};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(serde::Deserialize)]
pub struct RealtimeDevicePath {
    device_id: String,
}

/// GET /api/realtime
pub async fn get_realtime(State(state): State<AppState>) -> Response {
    let samples: Vec<NormalizedSampleDto> = state
        .engine
        .current_data()
        .into_iter()
        .map(sample_to_dto)
        .collect();
    (StatusCode::OK, Json(ApiResponse::success(samples))).into_response()
}

/// GET /api/realtime/{device_id}
///
/// 未知设备返回空列表而不是 404，和整表查询保持一致的形状。
pub async fn get_device_realtime(
    State(state): State<AppState>,
    Path(path): Path<RealtimeDevicePath>,
) -> Response {
    let samples: Vec<NormalizedSampleDto> = state
        .engine
        .data_for_device(&path.device_id)
        .into_iter()
        .map(sample_to_dto)
        .collect();
    (StatusCode::OK, Json(ApiResponse::success(samples))).into_response()
}
