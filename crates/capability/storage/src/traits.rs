//! 三类资源的异步存储接口
//!
//! - DeviceStore：设备
//! - TagStore：点位
//! - MappingStore：路由映射
//!
//! 约定：
//! - 查不到返回 Ok(None) / Ok(false)，错误保留给真正的失败
//! - 删除级联（设备 → 点位 → 映射）由实现保证
//! - 使用 async_trait 支持动态分发，组件持有 Arc<dyn Store>

use crate::error::StorageError;
use crate::models::{
    DeviceFilter, DeviceRecord, DeviceUpdate, MappingRecord, MappingUpdate, ResolvedTag,
    TagRecord, TagUpdate,
};
use async_trait::async_trait;

/// 设备存储接口
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// 按条件列出设备
    async fn list_devices(&self, filter: DeviceFilter) -> Result<Vec<DeviceRecord>, StorageError>;

    /// 查找指定设备
    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// 创建新设备
    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError>;

    /// 更新设备
    async fn update_device(
        &self,
        device_id: &str,
        update: DeviceUpdate,
    ) -> Result<Option<DeviceRecord>, StorageError>;

    /// 端点启动成功后回写端口与访问地址
    async fn update_device_endpoint(
        &self,
        device_id: &str,
        port: u16,
        endpoint: &str,
    ) -> Result<Option<DeviceRecord>, StorageError>;

    /// 回写启用标记（start/stop 操作调用）
    async fn set_device_enabled(
        &self,
        device_id: &str,
        enabled: bool,
    ) -> Result<Option<DeviceRecord>, StorageError>;

    /// 删除设备，级联删除其点位与相关映射
    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError>;
}

/// 点位存储接口
#[async_trait]
pub trait TagStore: Send + Sync {
    /// 列出指定设备的所有点位
    async fn list_tags(&self, device_id: &str) -> Result<Vec<TagRecord>, StorageError>;

    /// 查找指定点位
    async fn find_tag(&self, tag_id: &str) -> Result<Option<TagRecord>, StorageError>;

    /// 解析点位：返回点位 + 所属设备 + 启用的映射（路由引擎专用）
    async fn resolve_tag(&self, tag_id: &str) -> Result<Option<ResolvedTag>, StorageError>;

    /// 创建新点位（拒绝设备内重名与悬空设备引用）
    async fn create_tag(&self, record: TagRecord) -> Result<TagRecord, StorageError>;

    /// 更新点位配置
    async fn update_tag(
        &self,
        tag_id: &str,
        update: TagUpdate,
    ) -> Result<Option<TagRecord>, StorageError>;

    /// 回写最近采样值（信号发生器每 tick 调用）
    async fn update_tag_value(
        &self,
        tag_id: &str,
        value: f64,
        quality: &str,
    ) -> Result<Option<TagRecord>, StorageError>;

    /// 删除点位，级联删除以其为输入的映射
    async fn delete_tag(&self, tag_id: &str) -> Result<bool, StorageError>;
}

/// 路由映射存储接口
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// 列出全部映射
    async fn list_mappings(&self) -> Result<Vec<MappingRecord>, StorageError>;

    /// 查找指定映射
    async fn find_mapping(&self, mapping_id: &str) -> Result<Option<MappingRecord>, StorageError>;

    /// 列出指向某个 SINK 设备的映射（端点变量集由此构建）
    async fn list_mappings_for_target(
        &self,
        device_id: &str,
    ) -> Result<Vec<MappingRecord>, StorageError>;

    /// 列出以某个点位为输入且启用的映射
    async fn list_enabled_mappings_for_tag(
        &self,
        tag_id: &str,
    ) -> Result<Vec<MappingRecord>, StorageError>;

    /// 创建新映射（拒绝悬空引用、非 SINK 目标与组合重复）
    async fn create_mapping(&self, record: MappingRecord) -> Result<MappingRecord, StorageError>;

    /// 更新映射
    async fn update_mapping(
        &self,
        mapping_id: &str,
        update: MappingUpdate,
    ) -> Result<Option<MappingRecord>, StorageError>;

    /// 删除映射
    async fn delete_mapping(&self, mapping_id: &str) -> Result<bool, StorageError>;
}
