//! # 存储层
//!
//! 设备、点位、映射三类实体的持久化抽象与内存实现。
//!
//! ## 模型
//!
//! - [`DeviceRecord`]：一台源设备（被模拟的 PLC）或目标设备（被仿真
//!   的 PLC 端点）。`direction` 取 `SOURCE` / `SINK`，创建后不可改。
//! - [`TagRecord`]：挂在源设备下的点位，带波形参数（信号类型、频率、
//!   幅值、偏移）与最近一次采样结果（`value` / `quality`）。
//! - [`MappingRecord`]：一条“源点位 -> 目标设备变量”的路由规则，带
//!   线性变换参数 `scale_factor` / `offset` 与启停开关。
//!
//! ## Store 契约
//!
//! [`DeviceStore`]、[`TagStore`]、[`MappingStore`] 是运行管线依赖的
//! 唯一存储接口。统一约定：
//!
//! - 查询未命中返回 `Ok(None)`，删除未命中返回 `Ok(false)`，由上层
//!   决定映射成 404 还是静默忽略；
//! - 入参不合法（空名称、非 SINK 的映射目标、非有限数值）返回
//!   [`StorageErrorKind::InvalidInput`]；
//! - 唯一性冲突（设备重名、同设备点位重名、重复映射）返回
//!   [`StorageErrorKind::Conflict`]；
//! - 其余内部故障归入 [`StorageErrorKind::Internal`]。
//!
//! ## 实现
//!
//! 当前提供内存实现（[`in_memory`]），三个 Store 共享一份状态，
//! 设备删除的级联在一次写锁内完成。通过 [`new_shared_stores`] 建出
//! 配套的一组：
//!
//! ```rust,ignore
//! use plcgw_storage::{new_shared_stores, DeviceFilter, DeviceStore};
//!
//! let (devices, tags, mappings) = new_shared_stores();
//! let all = devices.list_devices(DeviceFilter::default()).await?;
//! assert!(all.is_empty());
//! ```
//!
//! [`seed_demo`] 可选地写入一套演示数据（三台源设备、一台 OPC UA
//! 网关和两条映射），库里已有设备时整体跳过。

pub mod error;
pub mod in_memory;
pub mod models;
pub mod seed;
pub mod traits;
pub mod validation;

pub use error::{StorageError, StorageErrorKind};
pub use in_memory::{
    new_shared_stores, InMemoryDeviceStore, InMemoryMappingStore, InMemoryTagStore,
};
pub use models::{
    DeviceFilter, DeviceRecord, DeviceUpdate, MappingRecord, MappingUpdate, ResolvedTag,
    TagRecord, TagUpdate,
};
pub use seed::seed_demo;
pub use traits::{DeviceStore, MappingStore, TagStore};
