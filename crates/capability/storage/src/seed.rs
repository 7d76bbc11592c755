//! 演示数据集。
//!
//! 三台模拟源设备（西门子、罗克韦尔、施耐德）、一台 OPC UA 仿真
//! 网关，以及两条把温度与压力转发到网关的映射。ID 用 UUID v5 从
//! 固定名字派生，重启后保持稳定，前端书签和脚本不会失效。

use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{DeviceFilter, DeviceRecord, MappingRecord, TagRecord};
use crate::traits::{DeviceStore, MappingStore, TagStore};
use domain::constants;

fn stable_id(kind: &str, name: &str) -> String {
    let seed = format!("plcgw/{kind}/{name}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
}

fn source_device(name: &str, brand: &str, protocol: &str) -> DeviceRecord {
    DeviceRecord {
        device_id: stable_id("device", name),
        name: name.to_string(),
        brand: Some(brand.to_string()),
        protocol: protocol.to_string(),
        direction: constants::DIRECTION_SOURCE.to_string(),
        enabled: true,
        port: None,
        endpoint: None,
        protocol_config: None,
    }
}

fn seed_tag(device_name: &str, name: &str, address: &str) -> TagRecord {
    TagRecord {
        tag_id: stable_id("tag", &format!("{device_name}/{name}")),
        device_id: stable_id("device", device_name),
        name: name.to_string(),
        address: address.to_string(),
        data_type: "FLOAT".to_string(),
        unit: None,
        value: 0.0,
        quality: constants::QUALITY_GOOD.to_string(),
        signal_type: constants::SIGNAL_SINE.to_string(),
        frequency: None,
        amplitude: None,
        offset: None,
    }
}

/// 写入演示设备、点位与映射。库里已有设备时整体跳过，返回是否
/// 实际写入过。
pub async fn seed_demo(
    devices: &dyn DeviceStore,
    tags: &dyn TagStore,
    mappings: &dyn MappingStore,
) -> Result<bool, StorageError> {
    if !devices.list_devices(DeviceFilter::default()).await?.is_empty() {
        return Ok(false);
    }

    let siemens = "Siemens S7-1500";
    let rockwell = "Allen-Bradley ControlLogix";
    let schneider = "Schneider Modicon M580";
    let gateway = "Generic OPC UA Gateway";

    devices
        .create_device(source_device(siemens, "SIEMENS", "S7COMM"))
        .await?;
    devices
        .create_device(source_device(rockwell, "ALLEN_BRADLEY", "ETHERNET_IP"))
        .await?;
    devices
        .create_device(source_device(schneider, "SCHNEIDER", "MODBUS_TCP"))
        .await?;
    devices
        .create_device(DeviceRecord {
            device_id: stable_id("device", gateway),
            name: gateway.to_string(),
            brand: Some("GENERIC".to_string()),
            protocol: constants::PROTOCOL_OPCUA.to_string(),
            direction: constants::DIRECTION_SINK.to_string(),
            enabled: false,
            port: Some(4840),
            endpoint: None,
            protocol_config: None,
        })
        .await?;

    let temperature = tags
        .create_tag(TagRecord {
            unit: Some("°C".to_string()),
            frequency: Some(0.5),
            amplitude: Some(25.0),
            offset: Some(75.0),
            ..seed_tag(siemens, "Temperature_Zone1", "DB1.DBD0")
        })
        .await?;
    let pressure = tags
        .create_tag(TagRecord {
            unit: Some("PSI".to_string()),
            frequency: Some(0.3),
            amplitude: Some(50.0),
            offset: Some(100.0),
            ..seed_tag(siemens, "Pressure_Tank1", "DB1.DBD4")
        })
        .await?;
    tags.create_tag(TagRecord {
        unit: Some("RPM".to_string()),
        signal_type: constants::SIGNAL_RAMP.to_string(),
        frequency: Some(0.2),
        amplitude: Some(1500.0),
        offset: Some(500.0),
        ..seed_tag(siemens, "Motor_Speed", "DB1.DBD8")
    })
    .await?;

    tags.create_tag(TagRecord {
        unit: Some("L/min".to_string()),
        frequency: Some(0.4),
        amplitude: Some(100.0),
        offset: Some(200.0),
        ..seed_tag(rockwell, "Flow_Rate", "N7:0")
    })
    .await?;
    tags.create_tag(TagRecord {
        unit: Some("%".to_string()),
        signal_type: constants::SIGNAL_RANDOM.to_string(),
        amplitude: Some(100.0),
        offset: Some(0.0),
        ..seed_tag(rockwell, "Valve_Position", "N7:1")
    })
    .await?;

    tags.create_tag(TagRecord {
        unit: Some("kW".to_string()),
        frequency: Some(0.6),
        amplitude: Some(500.0),
        offset: Some(1000.0),
        ..seed_tag(schneider, "Power_Consumption", "40001")
    })
    .await?;
    tags.create_tag(TagRecord {
        data_type: "BOOL".to_string(),
        signal_type: constants::SIGNAL_DIGITAL.to_string(),
        frequency: Some(0.1),
        ..seed_tag(schneider, "Emergency_Stop", "40002")
    })
    .await?;

    mappings
        .create_mapping(MappingRecord {
            mapping_id: stable_id("mapping", "Gateway_Temperature"),
            input_tag_id: temperature.tag_id.clone(),
            output_device_id: stable_id("device", gateway),
            output_tag_name: "Gateway_Temperature".to_string(),
            output_address: "ns=1;s=Temperature".to_string(),
            scale_factor: Some(1.0),
            offset: Some(0.0),
            enabled: true,
        })
        .await?;
    mappings
        .create_mapping(MappingRecord {
            mapping_id: stable_id("mapping", "Gateway_Pressure"),
            input_tag_id: pressure.tag_id.clone(),
            output_device_id: stable_id("device", gateway),
            output_tag_name: "Gateway_Pressure".to_string(),
            output_address: "ns=1;s=Pressure".to_string(),
            // PSI 到 bar 的量纲换算放在 scale_factor 里演示缩放。
            scale_factor: Some(0.068_947_6),
            offset: Some(0.0),
            enabled: true,
        })
        .await?;

    Ok(true)
}
