//! 映射存储的内存实现。

use async_trait::async_trait;
use domain::constants;

use crate::error::StorageError;
use crate::in_memory::SharedState;
use crate::models::{MappingRecord, MappingUpdate};
use crate::traits::MappingStore;
use crate::validation::{ensure_finite_opt, ensure_name, ensure_name_opt};

/// 基于共享内存状态的映射存储。
pub struct InMemoryMappingStore {
    state: SharedState,
}

impl InMemoryMappingStore {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn list_mappings(&self) -> Result<Vec<MappingRecord>, StorageError> {
        let mut items = self
            .state
            .read()
            .map(|state| state.mappings.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        items.sort_by(|a, b| a.output_tag_name.cmp(&b.output_tag_name));
        Ok(items)
    }

    async fn find_mapping(&self, mapping_id: &str) -> Result<Option<MappingRecord>, StorageError> {
        let found = self
            .state
            .read()
            .ok()
            .and_then(|state| state.mappings.get(mapping_id).cloned());
        Ok(found)
    }

    async fn list_mappings_for_target(
        &self,
        device_id: &str,
    ) -> Result<Vec<MappingRecord>, StorageError> {
        let mut items = self
            .state
            .read()
            .map(|state| {
                state
                    .mappings
                    .values()
                    .filter(|item| item.output_device_id == device_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.output_tag_name.cmp(&b.output_tag_name));
        Ok(items)
    }

    async fn list_enabled_mappings_for_tag(
        &self,
        tag_id: &str,
    ) -> Result<Vec<MappingRecord>, StorageError> {
        let items = self
            .state
            .read()
            .map(|state| {
                state
                    .mappings
                    .values()
                    .filter(|item| item.input_tag_id == tag_id && item.enabled)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(items)
    }

    async fn create_mapping(&self, record: MappingRecord) -> Result<MappingRecord, StorageError> {
        ensure_name("output_tag_name", &record.output_tag_name)?;
        ensure_name("output_address", &record.output_address)?;
        ensure_finite_opt("scale_factor", record.scale_factor)?;
        ensure_finite_opt("offset", record.offset)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if !state.tags.contains_key(&record.input_tag_id) {
            return Err(StorageError::invalid("input tag not found"));
        }
        match state.devices.get(&record.output_device_id) {
            None => return Err(StorageError::invalid("output device not found")),
            Some(device) if device.direction != constants::DIRECTION_SINK => {
                return Err(StorageError::invalid("output device is not a sink"));
            }
            Some(_) => {}
        }
        if state.mappings.contains_key(&record.mapping_id) {
            return Err(StorageError::conflict("mapping already exists"));
        }
        let taken = state.mappings.values().any(|item| {
            item.input_tag_id == record.input_tag_id
                && item.output_device_id == record.output_device_id
                && item.output_tag_name == record.output_tag_name
        });
        if taken {
            return Err(StorageError::conflict("mapping already exists for tag and target"));
        }
        state
            .mappings
            .insert(record.mapping_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_mapping(
        &self,
        mapping_id: &str,
        update: MappingUpdate,
    ) -> Result<Option<MappingRecord>, StorageError> {
        ensure_name_opt("output_tag_name", update.output_tag_name.as_deref())?;
        ensure_name_opt("output_address", update.output_address.as_deref())?;
        ensure_finite_opt("scale_factor", update.scale_factor)?;
        ensure_finite_opt("offset", update.offset)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if let Some(new_name) = update.output_tag_name.as_deref() {
            let current = match state.mappings.get(mapping_id) {
                Some(mapping) => mapping.clone(),
                None => return Ok(None),
            };
            let taken = state.mappings.values().any(|item| {
                item.mapping_id != mapping_id
                    && item.input_tag_id == current.input_tag_id
                    && item.output_device_id == current.output_device_id
                    && item.output_tag_name == new_name
            });
            if taken {
                return Err(StorageError::conflict("mapping already exists for tag and target"));
            }
        }
        let Some(mapping) = state.mappings.get_mut(mapping_id) else {
            return Ok(None);
        };
        if let Some(output_tag_name) = update.output_tag_name {
            mapping.output_tag_name = output_tag_name;
        }
        if let Some(output_address) = update.output_address {
            mapping.output_address = output_address;
        }
        if let Some(scale_factor) = update.scale_factor {
            mapping.scale_factor = Some(scale_factor);
        }
        if let Some(offset) = update.offset {
            mapping.offset = Some(offset);
        }
        if let Some(enabled) = update.enabled {
            mapping.enabled = enabled;
        }
        Ok(Some(mapping.clone()))
    }

    async fn delete_mapping(&self, mapping_id: &str) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.mappings.remove(mapping_id).is_some())
    }
}
