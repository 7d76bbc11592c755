//! 仿真监督器：管理每台源设备的采样任务生命周期。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use domain::{constants, DeviceStatus, LogEvent, LogLevel, StatusChange};
use plcgw_bus::{EventPublisher, GatewayEvent};
use plcgw_storage::{DeviceFilter, DeviceRecord, DeviceStore, TagStore};

use crate::generator::{GeneratorTask, TagWave};
use crate::SimulateError;

/// 一台运行中设备的运行态记录。
struct RunningSim {
    device_name: String,
    tag_count: usize,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 运行中设备的摘要。
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub device_id: String,
    pub name: String,
    pub tag_count: usize,
}

/// 仿真整体状态快照。
#[derive(Debug, Clone, Default)]
pub struct SimulationStatus {
    pub active: usize,
    pub devices: Vec<SimulatedDevice>,
}

/// 仿真监督器。
///
/// 运行表是唯一的共享可变状态：插入（start）与移除（stop）都在
/// 同一把锁内完成，两个并发 `start` 不会为同一设备建出两个任务。
pub struct SimulationSupervisor {
    devices: Arc<dyn DeviceStore>,
    tags: Arc<dyn TagStore>,
    bus: Arc<dyn EventPublisher>,
    tick: Duration,
    running: Mutex<HashMap<String, RunningSim>>,
}

impl SimulationSupervisor {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        tags: Arc<dyn TagStore>,
        bus: Arc<dyn EventPublisher>,
        tick: Duration,
    ) -> Self {
        Self {
            devices,
            tags,
            bus,
            tick,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// 启动一台源设备的采样。已在运行则记一条日志返回 `Ok(false)`。
    pub async fn start(&self, device: &DeviceRecord) -> Result<bool, SimulateError> {
        if self.is_running(&device.device_id) {
            info!(
                target: "plcgw.simulate",
                device_id = %device.device_id,
                "simulation_already_running"
            );
            return Ok(false);
        }

        let tag_records = self
            .tags
            .list_tags(&device.device_id)
            .await
            .map_err(|err| SimulateError::Storage(err.to_string()))?;
        self.devices
            .set_device_enabled(&device.device_id, true)
            .await
            .map_err(|err| SimulateError::Storage(err.to_string()))?;

        let waves: Vec<TagWave> = tag_records.iter().map(TagWave::from_record).collect();
        let tag_count = waves.len();
        {
            let mut running = self.running.lock().map_err(|_| SimulateError::Lock)?;
            // 拿锁期间可能有并发 start 抢先，复查后再占位。
            if running.contains_key(&device.device_id) {
                info!(
                    target: "plcgw.simulate",
                    device_id = %device.device_id,
                    "simulation_already_running"
                );
                return Ok(false);
            }
            let (shutdown, signal) = watch::channel(false);
            let task = GeneratorTask::new(
                device.device_id.clone(),
                waves,
                self.tags.clone(),
                self.bus.clone(),
                self.tick,
            );
            let handle = tokio::spawn(task.run(signal));
            running.insert(
                device.device_id.clone(),
                RunningSim {
                    device_name: device.name.clone(),
                    tag_count,
                    shutdown,
                    handle,
                },
            );
        }

        info!(
            target: "plcgw.simulate",
            device_id = %device.device_id,
            device_name = %device.name,
            tag_count = tag_count,
            "simulation_started"
        );
        self.bus
            .publish(GatewayEvent::Status(StatusChange::new(
                &device.device_id,
                &device.name,
                DeviceStatus::Running,
                Some("simulation started".to_string()),
            )))
            .await;
        self.bus
            .publish(GatewayEvent::Log(LogEvent::new(
                LogLevel::Info,
                "simulation",
                format!("device {} started with {} tags", device.name, tag_count),
            )))
            .await;
        Ok(true)
    }

    /// 停止一台设备的采样。返回后不再有该设备的 tick 发出。
    pub async fn stop(&self, device_id: &str) -> Result<bool, SimulateError> {
        let removed = {
            let mut running = self.running.lock().map_err(|_| SimulateError::Lock)?;
            running.remove(device_id)
        };
        let Some(instance) = removed else {
            info!(target: "plcgw.simulate", device_id = %device_id, "simulation_not_running");
            return Ok(false);
        };

        let _ = instance.shutdown.send(true);
        if let Err(err) = instance.handle.await {
            warn!(
                target: "plcgw.simulate",
                device_id = %device_id,
                error = %err,
                "generator_join_failed"
            );
        }
        self.devices
            .set_device_enabled(device_id, false)
            .await
            .map_err(|err| SimulateError::Storage(err.to_string()))?;

        info!(
            target: "plcgw.simulate",
            device_id = %device_id,
            device_name = %instance.device_name,
            "simulation_stopped"
        );
        self.bus
            .publish(GatewayEvent::Status(StatusChange::new(
                device_id,
                &instance.device_name,
                DeviceStatus::Stopped,
                Some("simulation stopped".to_string()),
            )))
            .await;
        self.bus
            .publish(GatewayEvent::Log(LogEvent::new(
                LogLevel::Info,
                "simulation",
                format!("device {} stopped", instance.device_name),
            )))
            .await;
        Ok(true)
    }

    /// 启动所有 `enabled = true` 的源设备。单台失败不拦住其余设备。
    pub async fn start_enabled(&self) -> Result<usize, SimulateError> {
        let devices = self
            .devices
            .list_devices(DeviceFilter {
                direction: Some(constants::DIRECTION_SOURCE.to_string()),
                enabled: Some(true),
            })
            .await
            .map_err(|err| SimulateError::Storage(err.to_string()))?;

        let mut started = 0;
        for device in devices {
            match self.start(&device).await {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        target: "plcgw.simulate",
                        device_id = %device.device_id,
                        error = %err,
                        "simulation_start_failed"
                    );
                }
            }
        }
        Ok(started)
    }

    /// 停止所有运行中的设备，个别失败不影响其余，返回成功停掉的数量。
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
                        target: "plcgw.simulate",
                        device_id = %device_id,
                        error = %err,
                        "simulation_stop_failed"
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

    /// 当前运行状态快照，设备按名称排序。
    pub fn status(&self) -> SimulationStatus {
        self.running
            .lock()
            .map(|running| {
                let mut devices: Vec<SimulatedDevice> = running
                    .iter()
                    .map(|(device_id, instance)| SimulatedDevice {
                        device_id: device_id.clone(),
                        name: instance.device_name.clone(),
                        tag_count: instance.tag_count,
                    })
                    .collect();
                devices.sort_by(|a, b| a.name.cmp(&b.name));
                SimulationStatus {
                    active: devices.len(),
                    devices,
                }
            })
            .unwrap_or_default()
    }
}
