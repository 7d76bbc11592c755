//! 进程指标

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use plcgw_telemetry::metrics;

/// GET /api/metrics
///
/// 进程内累计计数器的一次性快照。
pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    let dto = MetricsSnapshotDto {
        samples_generated: snapshot.samples_generated,
        sample_persist_failures: snapshot.sample_persist_failures,
        events_published: snapshot.events_published,
        subscriber_lag_drops: snapshot.subscriber_lag_drops,
        writes_routed: snapshot.writes_routed,
        writes_applied: snapshot.writes_applied,
        endpoint_starts: snapshot.endpoint_starts,
        endpoint_failures: snapshot.endpoint_failures,
        relay_connections: snapshot.relay_connections,
    };
    (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
}
