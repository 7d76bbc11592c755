//! 健康检查

use api_contract::HealthDto;
use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

/// GET /health
pub async fn health() -> Response {
    let dto = HealthDto {
        service: "plcgw-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "ok".to_string(),
    };
    (StatusCode::OK, Json(dto)).into_response()
}
