//! # 归一化路由能力模块
//!
//! 订阅 TagUpdate 事件，把原始采样解析成带单位的归一化样本，再按
//! 启用的映射做线性变换并派发输出写请求：
//!
//! ```text
//! TagUpdate ──▶ RouteEngine
//!                  ├─ resolve_tag：点位 + 所属设备 + 启用的映射
//!                  ├─ 缓存最新归一化值（设备+点位 各一条）
//!                  ├─ 每条映射：value * scale + offset ──▶ WriteRequest
//!                  └─ 每条采样广播一条 INFO 日志
//! ```
//!
//! 单条事件的任何失败（点位已删除、存储故障）只丢弃这一条，引擎
//! 本身永不退出。缓存对外只读，`current_data` / `data_for_device`
//! 返回一致性快照供轮询接口使用。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use domain::{LogEvent, LogLevel, NormalizedSample, OutputWrite, TagSample};
use plcgw_bus::{EventFilter, EventPublisher, EventTopic, GatewayEvent, InMemoryEventBus};
use plcgw_storage::TagStore;
use plcgw_telemetry::record_write_routed;

/// 映射未配置 scale_factor 时的默认值。
const DEFAULT_SCALE: f64 = 1.0;
/// 映射未配置 offset 时的默认值。
const DEFAULT_OFFSET: f64 = 0.0;

/// 归一化路由引擎。
pub struct RouteEngine {
    tags: Arc<dyn TagStore>,
    bus: Arc<InMemoryEventBus>,
    cache: RwLock<HashMap<String, NormalizedSample>>,
}

impl RouteEngine {
    pub fn new(tags: Arc<dyn TagStore>, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            tags,
            bus,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 订阅 TagUpdate 并持续处理，事件中枢关闭后任务退出。
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let mut updates = self
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::TagUpdate]));
        tokio::spawn(async move {
            while let Some(event) = updates.recv().await {
                if let GatewayEvent::TagUpdate(sample) = event {
                    self.process(sample).await;
                }
            }
            debug!(target: "plcgw.route", "route_engine_exited");
        })
    }

    /// 处理一条采样：解析点位、更新缓存、按映射派发写请求。
    pub async fn process(&self, sample: TagSample) {
        let resolved = match self.tags.resolve_tag(&sample.tag_id).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                // 点位或设备可能在事件在途时被删掉，静默丢弃。
                debug!(
                    target: "plcgw.route",
                    tag_id = %sample.tag_id,
                    "tag_unresolved_dropped"
                );
                return;
            }
            Err(err) => {
                warn!(
                    target: "plcgw.route",
                    tag_id = %sample.tag_id,
                    error = %err,
                    "tag_resolve_failed"
                );
                return;
            }
        };

        let normalized = NormalizedSample {
            device_id: sample.device_id.clone(),
            tag_name: sample.tag_name.clone(),
            value: sample.value,
            unit: resolved.tag.unit.clone(),
            quality: sample.quality.clone(),
            ts_ms: sample.ts_ms,
        };
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(cache_key(&sample.device_id, &sample.tag_name), normalized);
        }

        for mapping in &resolved.enabled_mappings {
            let scale = mapping.scale_factor.unwrap_or(DEFAULT_SCALE);
            let offset = mapping.offset.unwrap_or(DEFAULT_OFFSET);
            let output = sample.value * scale + offset;
            record_write_routed();
            debug!(
                target: "plcgw.route",
                tag_id = %sample.tag_id,
                target_device_id = %mapping.output_device_id,
                output_tag = %mapping.output_tag_name,
                value = output,
                "write_routed"
            );
            self.bus
                .publish(GatewayEvent::WriteRequest(OutputWrite {
                    target_device_id: mapping.output_device_id.clone(),
                    tag_name: mapping.output_tag_name.clone(),
                    address: mapping.output_address.clone(),
                    value: output,
                    quality: sample.quality.clone(),
                }))
                .await;
        }

        self.bus
            .publish(GatewayEvent::Log(LogEvent::new(
                LogLevel::Info,
                "routing",
                format!(
                    "normalized {}/{} = {:.3} ({} mappings)",
                    resolved.device.name,
                    sample.tag_name,
                    sample.value,
                    resolved.enabled_mappings.len()
                ),
            )))
            .await;
    }

    /// 全量缓存快照，按 设备 ID、点位名 排序。
    pub fn current_data(&self) -> Vec<NormalizedSample> {
        self.cache
            .read()
            .map(|cache| {
                let mut items: Vec<NormalizedSample> = cache.values().cloned().collect();
                items.sort_by(|a, b| {
                    a.device_id
                        .cmp(&b.device_id)
                        .then_with(|| a.tag_name.cmp(&b.tag_name))
                });
                items
            })
            .unwrap_or_default()
    }

    /// 单台设备的缓存快照，按点位名排序。
    pub fn data_for_device(&self, device_id: &str) -> Vec<NormalizedSample> {
        self.cache
            .read()
            .map(|cache| {
                let mut items: Vec<NormalizedSample> = cache
                    .values()
                    .filter(|item| item.device_id == device_id)
                    .cloned()
                    .collect();
                items.sort_by(|a, b| a.tag_name.cmp(&b.tag_name));
                items
            })
            .unwrap_or_default()
    }
}

fn cache_key(device_id: &str, tag_name: &str) -> String {
    format!("{device_id}/{tag_name}")
}
