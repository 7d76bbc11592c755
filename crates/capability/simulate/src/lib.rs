//! # 信号仿真能力模块
//!
//! 为每台运行中的源设备维护一个周期采样任务，按波形参数合成
//! 点位数值：
//!
//! ```text
//! SimulationSupervisor ──start/stop──▶ GeneratorTask（每设备一个定时任务）
//!        │                                   │ 每个周期、每个点位
//!        │                                   ├─ 用推进前的相位计算波形值
//!        │                                   ├─ update_tag_value 落库
//!        │                                   ├─ 发布 TagUpdate 事件
//!        │                                   └─ 推进相位
//!        └──▶ Status / Log 事件
//! ```
//!
//! 单个点位落库失败只影响它自己：记一条日志、跳过本轮发布，同设备
//! 其余点位照常走完。监督器保证同一设备任何时刻至多一个采样任务，
//! `stop` 返回后不再有任何 tick 发出。

mod generator;
mod supervisor;
pub mod waveform;

pub use supervisor::{SimulatedDevice, SimulationStatus, SimulationSupervisor};

/// 仿真生命周期错误。
#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    /// 存储访问失败。
    #[error("storage error: {0}")]
    Storage(String),
    /// 运行表锁获取失败。
    #[error("lock failed")]
    Lock,
}
