//! 输出监督器：管理每台输出设备的协议端点生命周期。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use domain::{constants, DeviceStatus, LogEvent, LogLevel, OutputWrite, StatusChange};
use plcgw_bus::{EventFilter, EventPublisher, EventTopic, GatewayEvent, InMemoryEventBus};
use plcgw_protocol::{EndpointServer, VariableSpec};
use plcgw_storage::{DeviceFilter, DeviceRecord, DeviceStore, MappingStore};
use plcgw_telemetry::{record_endpoint_failure, record_endpoint_start, record_write_applied};

use crate::ports::PortAllocator;
use crate::EmulateError;

/// 一个运行中端点的运行态记录。
struct RunningEndpoint {
    device_name: String,
    variable_count: usize,
    server: EndpointServer,
}

/// 运行中端点的摘要。
#[derive(Debug, Clone)]
pub struct EmulatedEndpoint {
    pub device_id: String,
    pub device_name: String,
    pub protocol: String,
    pub port: u16,
    pub endpoint: String,
    pub variable_count: usize,
}

/// 输出仿真整体状态快照。
#[derive(Debug, Clone, Default)]
pub struct EmulationStatus {
    pub active: usize,
    pub endpoints: Vec<EmulatedEndpoint>,
}

/// 输出监督器。
///
/// 端点的变量集来自指向该设备的启用映射，在启动时固定。
/// 运行表的占位与移除都在同一把锁内完成，同一设备至多一个端点。
pub struct EmulationSupervisor {
    devices: Arc<dyn DeviceStore>,
    mappings: Arc<dyn MappingStore>,
    bus: Arc<InMemoryEventBus>,
    ports: Mutex<PortAllocator>,
    running: Mutex<HashMap<String, RunningEndpoint>>,
}

impl EmulationSupervisor {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        mappings: Arc<dyn MappingStore>,
        bus: Arc<InMemoryEventBus>,
        opcua_port_base: u16,
        modbus_port_base: u16,
    ) -> Self {
        Self {
            devices,
            mappings,
            bus,
            ports: Mutex::new(PortAllocator::new(opcua_port_base, modbus_port_base)),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// 启动一台输出设备的端点。已在运行则记一条日志返回 `Ok(false)`。
    ///
    /// 协议不支持或端口绑定失败是输出侧唯一对外暴露的失败：发布一条
    /// ERROR 日志事件并把错误抛给调用方，不留下运行实例。
    pub async fn start(&self, device: &DeviceRecord) -> Result<bool, EmulateError> {
        if self.is_running(&device.device_id) {
            info!(
                target: "plcgw.emulate",
                device_id = %device.device_id,
                "emulation_already_running"
            );
            return Ok(false);
        }

        let specs = self.variable_specs(&device.device_id).await?;
        let variable_count = specs.len();
        let port = {
            let mut ports = self.ports.lock().map_err(|_| EmulateError::Lock)?;
            ports.resolve(&device.protocol, device.port)
        };

        let server = match EndpointServer::start(&device.protocol, port, specs).await {
            Ok(server) => server,
            Err(err) => {
                record_endpoint_failure();
                error!(
                    target: "plcgw.emulate",
                    device_id = %device.device_id,
                    device_name = %device.name,
                    protocol = %device.protocol,
                    error = %err,
                    "endpoint_start_failed"
                );
                self.bus
                    .publish(GatewayEvent::Log(LogEvent::new(
                        LogLevel::Error,
                        "emulation",
                        format!("failed to start endpoint for {}: {}", device.name, err),
                    )))
                    .await;
                return Err(EmulateError::Endpoint(err));
            }
        };

        // 端口 0 由系统分配，以实际绑定结果回写设备记录。
        let port = server.port();
        let endpoint = server.endpoint().to_string();
        if let Err(err) = self
            .devices
            .update_device_endpoint(&device.device_id, port, &endpoint)
            .await
        {
            server.stop().await;
            return Err(EmulateError::Storage(err.to_string()));
        }
        if let Err(err) = self
            .devices
            .set_device_enabled(&device.device_id, true)
            .await
        {
            server.stop().await;
            return Err(EmulateError::Storage(err.to_string()));
        }

        let leftover = {
            let mut running = self.running.lock().map_err(|_| EmulateError::Lock)?;
            // 拿锁期间可能有并发 start 抢先，复查后再占位。
            if running.contains_key(&device.device_id) {
                Some(server)
            } else {
                running.insert(
                    device.device_id.clone(),
                    RunningEndpoint {
                        device_name: device.name.clone(),
                        variable_count,
                        server,
                    },
                );
                None
            }
        };
        if let Some(server) = leftover {
            info!(
                target: "plcgw.emulate",
                device_id = %device.device_id,
                "emulation_already_running"
            );
            server.stop().await;
            return Ok(false);
        }

        record_endpoint_start();
        info!(
            target: "plcgw.emulate",
            device_id = %device.device_id,
            device_name = %device.name,
            protocol = %device.protocol,
            port = port,
            endpoint = %endpoint,
            variable_count = variable_count,
            "emulation_started"
        );
        self.bus
            .publish(GatewayEvent::Status(StatusChange::new(
                &device.device_id,
                &device.name,
                DeviceStatus::Running,
                Some(format!("endpoint ready at {endpoint}")),
            )))
            .await;
        self.bus
            .publish(GatewayEvent::Log(LogEvent::new(
                LogLevel::Info,
                "emulation",
                format!(
                    "device {} serving {} variables at {}",
                    device.name, variable_count, endpoint
                ),
            )))
            .await;
        Ok(true)
    }

    /// 停止一台设备的端点。返回后端口已释放。
    pub async fn stop(&self, device_id: &str) -> Result<bool, EmulateError> {
        let removed = {
            let mut running = self.running.lock().map_err(|_| EmulateError::Lock)?;
            running.remove(device_id)
        };
        let Some(instance) = removed else {
            info!(target: "plcgw.emulate", device_id = %device_id, "emulation_not_running");
            return Ok(false);
        };

        instance.server.stop().await;
        self.devices
            .set_device_enabled(device_id, false)
            .await
            .map_err(|err| EmulateError::Storage(err.to_string()))?;

        info!(
            target: "plcgw.emulate",
            device_id = %device_id,
            device_name = %instance.device_name,
            "emulation_stopped"
        );
        self.bus
            .publish(GatewayEvent::Status(StatusChange::new(
                device_id,
                &instance.device_name,
                DeviceStatus::Stopped,
                Some("emulation stopped".to_string()),
            )))
            .await;
        self.bus
            .publish(GatewayEvent::Log(LogEvent::new(
                LogLevel::Info,
                "emulation",
                format!("device {} stopped", instance.device_name),
            )))
            .await;
        Ok(true)
    }

    /// 启动所有 `enabled = true` 的输出设备。单台失败不拦住其余设备。
    pub async fn start_enabled(&self) -> Result<usize, EmulateError> {
        let devices = self
            .devices
            .list_devices(DeviceFilter {
                direction: Some(constants::DIRECTION_SINK.to_string()),
                enabled: Some(true),
            })
            .await
            .map_err(|err| EmulateError::Storage(err.to_string()))?;

        let mut started = 0;
        for device in devices {
            match self.start(&device).await {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        target: "plcgw.emulate",
                        device_id = %device.device_id,
                        error = %err,
                        "emulation_start_failed"
                    );
                }
            }
        }
        Ok(started)
    }

    /// 停止所有运行中的端点，个别失败不影响其余，返回成功停掉的数量。
    pub async fn stop_all(&self) -> usize {
        let ids: Vec<String> = self
            .running
            .lock()
            .map(|running| running.keys().cloned().collect())
            .unwrap_or_default();

        let mut stopped = 0;
        for device_id in ids {
            match self.stop(&device_id).await {
                Ok(true) => stopped += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        target: "plcgw.emulate",
                        device_id = %device_id,
                        error = %err,
                        "emulation_stop_failed"
                    );
                }
            }
        }
        stopped
    }

    pub fn is_running(&self, device_id: &str) -> bool {
        self.running
            .lock()
            .map(|running| running.contains_key(device_id))
            .unwrap_or(false)
    }

    /// 当前运行状态快照，端点按设备名排序。
    pub fn status(&self) -> EmulationStatus {
        self.running
            .lock()
            .map(|running| {
                let mut endpoints: Vec<EmulatedEndpoint> = running
                    .iter()
                    .map(|(device_id, instance)| EmulatedEndpoint {
                        device_id: device_id.clone(),
                        device_name: instance.device_name.clone(),
                        protocol: instance.server.protocol().to_string(),
                        port: instance.server.port(),
                        endpoint: instance.server.endpoint().to_string(),
                        variable_count: instance.variable_count,
                    })
                    .collect();
                endpoints.sort_by(|a, b| a.device_name.cmp(&b.device_name));
                EmulationStatus {
                    active: endpoints.len(),
                    endpoints,
                }
            })
            .unwrap_or_default()
    }

    /// 订阅输出写请求，把值应用到目标端点的变量表。
    ///
    /// 目标端点未运行、或变量无法匹配时静默丢弃，任何一条写请求
    /// 都不会让监听任务退出。
    pub fn spawn_write_listener(self: Arc<Self>) -> JoinHandle<()> {
        let mut writes = self
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::WriteRequest]));
        tokio::spawn(async move {
            while let Some(event) = writes.recv().await {
                let GatewayEvent::WriteRequest(write) = event else {
                    continue;
                };
                self.apply_write(write).await;
            }
            debug!(target: "plcgw.emulate", "write_listener_stopped");
        })
    }

    async fn apply_write(&self, write: OutputWrite) {
        // 只在锁内克隆表句柄，写入放到锁外做。
        let table = self
            .running
            .lock()
            .ok()
            .and_then(|running| {
                running
                    .get(&write.target_device_id)
                    .map(|instance| instance.server.variables().clone())
            });
        let Some(table) = table else {
            debug!(
                target: "plcgw.emulate",
                device_id = %write.target_device_id,
                tag = %write.tag_name,
                "write_for_inactive_endpoint_dropped"
            );
            return;
        };

        let matched = table.write(&write.tag_name, write.value).await
            || table.write(&write.address, write.value).await;
        if matched {
            record_write_applied();
            debug!(
                target: "plcgw.emulate",
                device_id = %write.target_device_id,
                tag = %write.tag_name,
                value = write.value,
                "write_applied"
            );
        } else {
            debug!(
                target: "plcgw.emulate",
                device_id = %write.target_device_id,
                tag = %write.tag_name,
                address = %write.address,
                "write_unmatched_ignored"
            );
        }
    }

    async fn variable_specs(&self, device_id: &str) -> Result<Vec<VariableSpec>, EmulateError> {
        let mappings = self
            .mappings
            .list_mappings_for_target(device_id)
            .await
            .map_err(|err| EmulateError::Storage(err.to_string()))?;
        Ok(mappings
            .into_iter()
            .filter(|mapping| mapping.enabled)
            .map(|mapping| VariableSpec {
                name: mapping.output_tag_name,
                address: mapping.output_address,
            })
            .collect())
    }
}
