//! 每设备一个的采样任务。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use domain::{constants, now_epoch_ms, LogEvent, LogLevel, TagSample};
use plcgw_bus::{EventPublisher, GatewayEvent};
use plcgw_storage::{TagRecord, TagStore};
use plcgw_telemetry::{record_sample_generated, record_sample_persist_failure};

use crate::waveform;

/// 单个点位的波形运行态。相位只在这里推进。
pub(crate) struct TagWave {
    tag_id: String,
    tag_name: String,
    signal_type: String,
    frequency: f64,
    amplitude: f64,
    offset: f64,
    phase: f64,
}

impl TagWave {
    pub(crate) fn from_record(record: &TagRecord) -> Self {
        Self {
            tag_id: record.tag_id.clone(),
            tag_name: record.name.clone(),
            signal_type: record.signal_type.clone(),
            frequency: record.frequency.unwrap_or(waveform::DEFAULT_FREQUENCY),
            amplitude: record.amplitude.unwrap_or(waveform::DEFAULT_AMPLITUDE),
            offset: record.offset.unwrap_or(waveform::DEFAULT_OFFSET),
            phase: 0.0,
        }
    }
}

/// 设备采样任务：固定周期遍历点位，先落库后发布。
pub(crate) struct GeneratorTask {
    device_id: String,
    tags: Vec<TagWave>,
    store: Arc<dyn TagStore>,
    bus: Arc<dyn EventPublisher>,
    period: Duration,
}

impl GeneratorTask {
    pub(crate) fn new(
        device_id: String,
        tags: Vec<TagWave>,
        store: Arc<dyn TagStore>,
        bus: Arc<dyn EventPublisher>,
        period: Duration,
    ) -> Self {
        Self {
            device_id,
            tags,
            store,
            bus,
            period,
        }
    }

    /// 收到停机信号前循环采样。第一轮 tick 立即触发，设备一启动
    /// 就有数据可看。
    pub(crate) async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.tick_once().await,
            }
        }
        debug!(target: "plcgw.simulate", device_id = %self.device_id, "generator_exited");
    }

    async fn tick_once(&mut self) {
        for wave in &mut self.tags {
            let value =
                waveform::generate(&wave.signal_type, wave.amplitude, wave.offset, wave.phase);
            match self
                .store
                .update_tag_value(&wave.tag_id, value, constants::QUALITY_GOOD)
                .await
            {
                Ok(Some(_)) => {
                    record_sample_generated();
                    let sample = TagSample {
                        device_id: self.device_id.clone(),
                        tag_id: wave.tag_id.clone(),
                        tag_name: wave.tag_name.clone(),
                        value,
                        quality: constants::QUALITY_GOOD.to_string(),
                        ts_ms: now_epoch_ms(),
                    };
                    self.bus.publish(GatewayEvent::TagUpdate(sample)).await;
                }
                Ok(None) => {
                    // 点位已被删掉，本轮跳过，其余点位照常。
                    debug!(
                        target: "plcgw.simulate",
                        device_id = %self.device_id,
                        tag_id = %wave.tag_id,
                        "tag_vanished_skip_publish"
                    );
                }
                Err(err) => {
                    record_sample_persist_failure();
                    warn!(
                        target: "plcgw.simulate",
                        device_id = %self.device_id,
                        tag_id = %wave.tag_id,
                        error = %err,
                        "sample_persist_failed"
                    );
                    self.bus
                        .publish(GatewayEvent::Log(LogEvent::new(
                            LogLevel::Warn,
                            "simulation",
                            format!("persist failed for tag {}: {}", wave.tag_name, err),
                        )))
                        .await;
                }
            }
            wave.phase = waveform::advance_phase(wave.phase, wave.frequency);
        }
    }
}
