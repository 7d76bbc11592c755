//! 管道装配
//!
//! 把配置变成一条可运行的数据链路：
//!
//! ```text
//!   存储 <── 仿真监督器 ──> 事件中枢 ──> 路由引擎 ──> 写请求 ──> 输出监督器
//!                              │
//!                              └──> 广播中继（外部观察者）
//! ```
//!
//! HTTP 层之外的常驻任务都在这里启动：路由引擎消费循环、
//! 输出侧写请求监听、广播中继接受循环。

use crate::AppState;
use plcgw_bus::InMemoryEventBus;
use plcgw_config::AppConfig;
use plcgw_emulate::EmulationSupervisor;
use plcgw_relay::BroadcastRelay;
use plcgw_route::RouteEngine;
use plcgw_simulate::SimulationSupervisor;
use plcgw_storage::{DeviceStore, MappingStore, TagStore, new_shared_stores, seed_demo};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 装配完成的管道。`state` 交给 HTTP 层，其余部分留给停机时清理。
pub struct Pipeline {
    pub state: AppState,
    relay: BroadcastRelay,
    engine_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl Pipeline {
    /// 按数据流向停机：先停源头采样，再停输出端点，最后断开中继
    /// 并撤掉消费任务。
    pub async fn shutdown(self) {
        let stopped = self.state.simulation.stop_all().await;
        let released = self.state.emulation.stop_all().await;
        self.relay.stop().await;
        self.engine_task.abort();
        self.write_task.abort();
        info!(
            target: "plcgw.api",
            simulations = stopped,
            endpoints = released,
            "pipeline_stopped"
        );
    }
}

/// 装配整条管道并启动常驻任务
pub async fn build(config: &AppConfig) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let (device_store, tag_store, mapping_store) = new_shared_stores();
    let devices: Arc<dyn DeviceStore> = Arc::new(device_store);
    let tags: Arc<dyn TagStore> = Arc::new(tag_store);
    let mappings: Arc<dyn MappingStore> = Arc::new(mapping_store);

    let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));

    let engine = Arc::new(RouteEngine::new(tags.clone(), bus.clone()));
    let engine_task = engine.clone().spawn();

    let simulation = Arc::new(SimulationSupervisor::new(
        devices.clone(),
        tags.clone(),
        bus.clone(),
        Duration::from_millis(config.tick_ms),
    ));
    let emulation = Arc::new(EmulationSupervisor::new(
        devices.clone(),
        mappings.clone(),
        bus.clone(),
        config.opcua_port_base,
        config.modbus_port_base,
    ));
    let write_task = emulation.clone().spawn_write_listener();

    let relay = BroadcastRelay::start(&config.relay_addr, bus.clone()).await?;

    if config.seed_demo {
        if seed_demo(devices.as_ref(), tags.as_ref(), mappings.as_ref()).await? {
            info!(target: "plcgw.api", "demo_data_seeded");
        }
    }

    let state = AppState {
        devices,
        tags,
        mappings,
        engine,
        simulation,
        emulation,
    };

    if config.auto_start {
        match state.simulation.start_enabled().await {
            Ok(count) => info!(target: "plcgw.api", count, "simulations_auto_started"),
            Err(err) => warn!(target: "plcgw.api", error = %err, "simulation_auto_start_failed"),
        }
        match state.emulation.start_enabled().await {
            Ok(count) => info!(target: "plcgw.api", count, "endpoints_auto_started"),
            Err(err) => warn!(target: "plcgw.api", error = %err, "emulation_auto_start_failed"),
        }
    }

    Ok(Pipeline {
        state,
        relay,
        engine_task,
        write_task,
    })
}
