//! 网关运行状态

use crate::AppState;
use crate::utils::response::{emulation_status_to_dto, simulation_status_to_dto};
use api_contract::{ApiResponse, GatewayStatusDto};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse, response::Response};

/// GET /api/status
///
/// 两侧监督器的运行快照：仿真中的源设备与对外服务的输出端点。
pub async fn get_status(State(state): State<AppState>) -> Response {
    let dto = GatewayStatusDto {
        simulation: simulation_status_to_dto(state.simulation.status()),
        emulation: emulation_status_to_dto(state.emulation.status()),
    };
    (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
}
