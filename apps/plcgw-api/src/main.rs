//! plcgw-api 入口
//!
//! 启动顺序：加载配置、初始化日志、装配数据管道（存储、事件中枢、
//! 路由引擎、双侧监督器、广播中继）、挂载 HTTP 路由。收到 Ctrl+C
//! 后先让 HTTP 层排空，再按数据流向停掉管道。
//!
//! HTTP 层只做参数规整与 DTO 转换，业务动作全部落在能力 crate 里。

mod handlers;
mod pipeline;
mod routes;
mod utils;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use plcgw_config::AppConfig;
use plcgw_emulate::EmulationSupervisor;
use plcgw_route::RouteEngine;
use plcgw_simulate::SimulationSupervisor;
use plcgw_storage::{DeviceStore, MappingStore, TagStore};
use plcgw_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, info, warn};

/// 各 handler 共享的应用状态。成员都是 Arc，克隆零拷贝。
#[derive(Clone)]
struct AppState {
    devices: Arc<dyn DeviceStore>,
    tags: Arc<dyn TagStore>,
    mappings: Arc<dyn MappingStore>,
    engine: Arc<RouteEngine>,
    simulation: Arc<SimulationSupervisor>,
    emulation: Arc<EmulationSupervisor>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 本地开发时读入 .env，缺失不算错
    dotenvy::dotenv().ok();
    // 配置在日志之前就绪，日志级别本身也来自环境
    let config = AppConfig::from_env()?;
    init_tracing();

    let pipeline = pipeline::build(&config).await?;

    let app = routes::create_api_router()
        .with_state(pipeline.state.clone())
        // 每个请求带上追踪标识
        .layer(middleware::from_fn(request_context))
        // 前端面板跨域轮询状态与实时数据
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "plcgw.api", addr = %config.http_addr, "http_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pipeline.shutdown().await;
    Ok(())
}

/// 等 Ctrl+C。监听失败时直接返回，否则进程没有正常退出的路径。
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "plcgw.api", error = %err, "ctrl_c_listen_failed");
    }
    info!(target: "plcgw.api", "shutdown_requested");
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 标识对写进请求扩展供 handler 取用，span 让同一请求的日志可串联
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
