//! 设备存储的内存实现。

use async_trait::async_trait;
use domain::constants;

use crate::error::StorageError;
use crate::in_memory::SharedState;
use crate::models::{DeviceFilter, DeviceRecord, DeviceUpdate};
use crate::traits::DeviceStore;
use crate::validation::{ensure_name, ensure_name_opt};

/// 基于共享内存状态的设备存储。
pub struct InMemoryDeviceStore {
    state: SharedState,
}

impl InMemoryDeviceStore {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn list_devices(&self, filter: DeviceFilter) -> Result<Vec<DeviceRecord>, StorageError> {
        let mut items = self
            .state
            .read()
            .map(|state| {
                state
                    .devices
                    .values()
                    .filter(|item| match filter.direction.as_deref() {
                        Some(direction) => item.direction == direction,
                        None => true,
                    })
                    .filter(|item| match filter.enabled {
                        Some(enabled) => item.enabled == enabled,
                        None => true,
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        // HashMap 迭代顺序不稳定，按名称排一下方便列表展示。
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let found = self
            .state
            .read()
            .ok()
            .and_then(|state| state.devices.get(device_id).cloned());
        Ok(found)
    }

    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError> {
        ensure_name("name", &record.name)?;
        ensure_name("protocol", &record.protocol)?;
        if record.direction != constants::DIRECTION_SOURCE
            && record.direction != constants::DIRECTION_SINK
        {
            return Err(StorageError::invalid("direction must be SOURCE or SINK"));
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if state.devices.contains_key(&record.device_id) {
            return Err(StorageError::conflict("device already exists"));
        }
        if state.devices.values().any(|item| item.name == record.name) {
            return Err(StorageError::conflict("device name already exists"));
        }
        state
            .devices
            .insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_device(
        &self,
        device_id: &str,
        update: DeviceUpdate,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        ensure_name_opt("name", update.name.as_deref())?;
        ensure_name_opt("protocol", update.protocol.as_deref())?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if let Some(new_name) = update.name.as_deref() {
            let taken = state
                .devices
                .values()
                .any(|item| item.device_id != device_id && item.name == new_name);
            if taken {
                return Err(StorageError::conflict("device name already exists"));
            }
        }
        let Some(device) = state.devices.get_mut(device_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            device.name = name;
        }
        if let Some(brand) = update.brand {
            device.brand = Some(brand);
        }
        if let Some(protocol) = update.protocol {
            device.protocol = protocol;
        }
        if let Some(port) = update.port {
            device.port = Some(port);
        }
        if let Some(protocol_config) = update.protocol_config {
            device.protocol_config = Some(protocol_config);
        }
        Ok(Some(device.clone()))
    }

    async fn update_device_endpoint(
        &self,
        device_id: &str,
        port: u16,
        endpoint: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(device) = state.devices.get_mut(device_id) else {
            return Ok(None);
        };
        device.port = Some(port);
        device.endpoint = Some(endpoint.to_string());
        Ok(Some(device.clone()))
    }

    async fn set_device_enabled(
        &self,
        device_id: &str,
        enabled: bool,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(device) = state.devices.get_mut(device_id) else {
            return Ok(None);
        };
        device.enabled = enabled;
        Ok(Some(device.clone()))
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if state.devices.remove(device_id).is_none() {
            return Ok(false);
        }
        // 级联：先收点位，再按点位与目标设备两个维度清映射。
        let removed_tags: Vec<String> = state
            .tags
            .values()
            .filter(|tag| tag.device_id == device_id)
            .map(|tag| tag.tag_id.clone())
            .collect();
        state.tags.retain(|_, tag| tag.device_id != device_id);
        state.mappings.retain(|_, mapping| {
            mapping.output_device_id != device_id
                && !removed_tags.contains(&mapping.input_tag_id)
        });
        Ok(true)
    }
}
