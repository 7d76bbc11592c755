//! 点位存储的内存实现。

use async_trait::async_trait;

use crate::error::StorageError;
use crate::in_memory::SharedState;
use crate::models::{ResolvedTag, TagRecord, TagUpdate};
use crate::traits::TagStore;
use crate::validation::{ensure_finite, ensure_finite_opt, ensure_name, ensure_name_opt};

/// 基于共享内存状态的点位存储。
pub struct InMemoryTagStore {
    state: SharedState,
}

impl InMemoryTagStore {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl TagStore for InMemoryTagStore {
    async fn list_tags(&self, device_id: &str) -> Result<Vec<TagRecord>, StorageError> {
        let mut items = self
            .state
            .read()
            .map(|state| {
                state
                    .tags
                    .values()
                    .filter(|item| item.device_id == device_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_tag(&self, tag_id: &str) -> Result<Option<TagRecord>, StorageError> {
        let found = self
            .state
            .read()
            .ok()
            .and_then(|state| state.tags.get(tag_id).cloned());
        Ok(found)
    }

    async fn resolve_tag(&self, tag_id: &str) -> Result<Option<ResolvedTag>, StorageError> {
        let resolved = self.state.read().ok().and_then(|state| {
            let tag = state.tags.get(tag_id)?.clone();
            // 点位挂在不存在的设备上视为不可解析，上游按无事发生处理。
            let device = state.devices.get(&tag.device_id)?.clone();
            let enabled_mappings = state
                .mappings
                .values()
                .filter(|mapping| mapping.input_tag_id == tag_id && mapping.enabled)
                .cloned()
                .collect();
            Some(ResolvedTag {
                tag,
                device,
                enabled_mappings,
            })
        });
        Ok(resolved)
    }

    async fn create_tag(&self, record: TagRecord) -> Result<TagRecord, StorageError> {
        ensure_name("name", &record.name)?;
        ensure_name("address", &record.address)?;
        ensure_finite("value", record.value)?;
        ensure_finite_opt("frequency", record.frequency)?;
        ensure_finite_opt("amplitude", record.amplitude)?;
        ensure_finite_opt("offset", record.offset)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if !state.devices.contains_key(&record.device_id) {
            return Err(StorageError::invalid("device not found"));
        }
        if state.tags.contains_key(&record.tag_id) {
            return Err(StorageError::conflict("tag already exists"));
        }
        let taken = state
            .tags
            .values()
            .any(|item| item.device_id == record.device_id && item.name == record.name);
        if taken {
            return Err(StorageError::conflict("tag name already exists on device"));
        }
        state.tags.insert(record.tag_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_tag(
        &self,
        tag_id: &str,
        update: TagUpdate,
    ) -> Result<Option<TagRecord>, StorageError> {
        ensure_name_opt("name", update.name.as_deref())?;
        ensure_name_opt("address", update.address.as_deref())?;
        ensure_finite_opt("frequency", update.frequency)?;
        ensure_finite_opt("amplitude", update.amplitude)?;
        ensure_finite_opt("offset", update.offset)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if let Some(new_name) = update.name.as_deref() {
            let device_id = match state.tags.get(tag_id) {
                Some(tag) => tag.device_id.clone(),
                None => return Ok(None),
            };
            let taken = state.tags.values().any(|item| {
                item.tag_id != tag_id && item.device_id == device_id && item.name == new_name
            });
            if taken {
                return Err(StorageError::conflict("tag name already exists on device"));
            }
        }
        let Some(tag) = state.tags.get_mut(tag_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            tag.name = name;
        }
        if let Some(address) = update.address {
            tag.address = address;
        }
        if let Some(data_type) = update.data_type {
            tag.data_type = data_type;
        }
        if let Some(unit) = update.unit {
            tag.unit = Some(unit);
        }
        if let Some(signal_type) = update.signal_type {
            tag.signal_type = signal_type;
        }
        if let Some(frequency) = update.frequency {
            tag.frequency = Some(frequency);
        }
        if let Some(amplitude) = update.amplitude {
            tag.amplitude = Some(amplitude);
        }
        if let Some(offset) = update.offset {
            tag.offset = Some(offset);
        }
        Ok(Some(tag.clone()))
    }

    async fn update_tag_value(
        &self,
        tag_id: &str,
        value: f64,
        quality: &str,
    ) -> Result<Option<TagRecord>, StorageError> {
        ensure_finite("value", value)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(tag) = state.tags.get_mut(tag_id) else {
            return Ok(None);
        };
        tag.value = value;
        tag.quality = quality.to_string();
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, tag_id: &str) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if state.tags.remove(tag_id).is_none() {
            return Ok(false);
        }
        state
            .mappings
            .retain(|_, mapping| mapping.input_tag_id != tag_id);
        Ok(true)
    }
}
