//! 路由表
//!
//! 路径到 handler 的映射全部集中在这一个文件里：
//! - 健康检查：/health
//! - 设备管理：/api/devices/*（含 start/stop 动作）
//! - 点位管理：/api/devices/{id}/tags, /api/tags/*
//! - 映射管理：/api/mappings/*
//! - 运行状态：/api/status
//! - 实时数据：/api/realtime, /api/realtime/{device_id}
//! - 进程指标：/api/metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/devices", get(list_devices).post(create_device))
        .route(
            "/api/devices/:device_id",
            get(get_device).put(update_device).delete(delete_device),
        )
        .route("/api/devices/:device_id/start", post(start_device))
        .route("/api/devices/:device_id/stop", post(stop_device))
        .route("/api/devices/:device_id/tags", get(list_device_tags))
        .route("/api/tags", post(create_tag))
        .route(
            "/api/tags/:tag_id",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
        .route("/api/mappings", get(list_mappings).post(create_mapping))
        .route(
            "/api/mappings/:mapping_id",
            get(get_mapping).put(update_mapping).delete(delete_mapping),
        )
        .route("/api/status", get(get_status))
        .route("/api/realtime", get(get_realtime))
        .route("/api/realtime/:device_id", get(get_device_realtime))
        .route("/api/metrics", get(get_metrics))
}
