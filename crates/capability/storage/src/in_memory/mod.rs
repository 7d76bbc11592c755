//! 内存存储实现。
//!
//! 设备、点位、映射三张表放在同一个 [`InMemoryState`] 里，共用一把
//! 读写锁。这样设备删除时的级联（先删点位，再删相关映射）可以在
//! 一次写锁内完成，中途不会被其他写入者观察到半删状态。
//!
//! 三个 Store 各持有一份 `Arc`，通过 [`new_shared_stores`] 一次性
//! 建出来。测试里也可以单独 clone 状态做断言。

pub mod device;
pub mod mapping;
pub mod tag;

pub use device::InMemoryDeviceStore;
pub use mapping::InMemoryMappingStore;
pub use tag::InMemoryTagStore;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::{DeviceRecord, MappingRecord, TagRecord};

/// 三类实体共享的底层状态，键为各自的 ID。
#[derive(Default)]
pub struct InMemoryState {
    pub(crate) devices: HashMap<String, DeviceRecord>,
    pub(crate) tags: HashMap<String, TagRecord>,
    pub(crate) mappings: HashMap<String, MappingRecord>,
}

/// 共享状态句柄。
pub type SharedState = Arc<RwLock<InMemoryState>>;

/// 建一组共享同一状态的内存存储。
pub fn new_shared_stores() -> (InMemoryDeviceStore, InMemoryTagStore, InMemoryMappingStore) {
    let state: SharedState = Arc::new(RwLock::new(InMemoryState::default()));
    (
        InMemoryDeviceStore::new(state.clone()),
        InMemoryTagStore::new(state.clone()),
        InMemoryMappingStore::new(state),
    )
}
