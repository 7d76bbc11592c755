//! 内存存储的集成测试：CRUD、唯一性约束、级联删除与演示数据。

use plcgw_storage::{
    new_shared_stores, seed_demo, DeviceFilter, DeviceRecord, DeviceStore, DeviceUpdate,
    MappingRecord, MappingStore, MappingUpdate, StorageErrorKind, TagRecord, TagStore, TagUpdate,
};

fn sample_device(name: &str, direction: &str) -> DeviceRecord {
    DeviceRecord {
        device_id: format!("dev-{name}"),
        name: name.to_string(),
        brand: Some("SIEMENS".to_string()),
        protocol: "S7COMM".to_string(),
        direction: direction.to_string(),
        enabled: true,
        port: None,
        endpoint: None,
        protocol_config: None,
    }
}

fn sample_tag(device_id: &str, name: &str) -> TagRecord {
    TagRecord {
        tag_id: format!("tag-{name}"),
        device_id: device_id.to_string(),
        name: name.to_string(),
        address: "DB1.DBD0".to_string(),
        data_type: "FLOAT".to_string(),
        unit: Some("°C".to_string()),
        value: 0.0,
        quality: "GOOD".to_string(),
        signal_type: "SINE".to_string(),
        frequency: Some(1.0),
        amplitude: Some(100.0),
        offset: Some(0.0),
    }
}

fn sample_mapping(tag_id: &str, device_id: &str, output_name: &str) -> MappingRecord {
    MappingRecord {
        mapping_id: format!("map-{output_name}"),
        input_tag_id: tag_id.to_string(),
        output_device_id: device_id.to_string(),
        output_tag_name: output_name.to_string(),
        output_address: "ns=1;s=Var".to_string(),
        scale_factor: Some(1.0),
        offset: Some(0.0),
        enabled: true,
    }
}

#[tokio::test]
async fn device_crud_roundtrip() {
    let (devices, _tags, _mappings) = new_shared_stores();

    let created = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create device");
    assert_eq!(created.name, "plc-a");

    let found = devices
        .find_device(&created.device_id)
        .await
        .expect("find device")
        .expect("device exists");
    assert_eq!(found.protocol, "S7COMM");

    let updated = devices
        .update_device(
            &created.device_id,
            DeviceUpdate {
                name: Some("plc-a2".to_string()),
                port: Some(1502),
                ..DeviceUpdate::default()
            },
        )
        .await
        .expect("update device")
        .expect("device exists");
    assert_eq!(updated.name, "plc-a2");
    assert_eq!(updated.port, Some(1502));

    assert!(devices
        .delete_device(&created.device_id)
        .await
        .expect("delete device"));
    assert!(!devices
        .delete_device(&created.device_id)
        .await
        .expect("second delete"));
    assert!(devices
        .find_device(&created.device_id)
        .await
        .expect("find after delete")
        .is_none());
}

#[tokio::test]
async fn device_create_validates_input() {
    let (devices, _tags, _mappings) = new_shared_stores();

    let err = devices
        .create_device(sample_device("plc-x", "SIDEWAYS"))
        .await
        .expect_err("bad direction rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);

    let mut nameless = sample_device("plc-y", "SOURCE");
    nameless.name = "   ".to_string();
    let err = devices
        .create_device(nameless)
        .await
        .expect_err("blank name rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);

    devices
        .create_device(sample_device("plc-z", "SOURCE"))
        .await
        .expect("first create");
    let mut dup = sample_device("plc-z", "SOURCE");
    dup.device_id = "dev-other".to_string();
    let err = devices
        .create_device(dup)
        .await
        .expect_err("duplicate name rejected");
    assert_eq!(err.kind(), StorageErrorKind::Conflict);
}

#[tokio::test]
async fn device_list_honors_filters() {
    let (devices, _tags, _mappings) = new_shared_stores();

    devices
        .create_device(sample_device("src-1", "SOURCE"))
        .await
        .expect("create src-1");
    devices
        .create_device(sample_device("src-2", "SOURCE"))
        .await
        .expect("create src-2");
    let mut sink = sample_device("sink-1", "SINK");
    sink.enabled = false;
    devices.create_device(sink).await.expect("create sink-1");

    let all = devices
        .list_devices(DeviceFilter::default())
        .await
        .expect("list all");
    assert_eq!(all.len(), 3);

    let sources = devices
        .list_devices(DeviceFilter {
            direction: Some("SOURCE".to_string()),
            ..DeviceFilter::default()
        })
        .await
        .expect("list sources");
    assert_eq!(sources.len(), 2);

    let enabled_sinks = devices
        .list_devices(DeviceFilter {
            direction: Some("SINK".to_string()),
            enabled: Some(true),
        })
        .await
        .expect("list enabled sinks");
    assert!(enabled_sinks.is_empty());
}

#[tokio::test]
async fn tag_requires_existing_device() {
    let (_devices, tags, _mappings) = new_shared_stores();

    let err = tags
        .create_tag(sample_tag("dev-missing", "Temperature"))
        .await
        .expect_err("orphan tag rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);
}

#[tokio::test]
async fn tag_name_unique_per_device() {
    let (devices, tags, _mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create device");
    tags.create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");

    let mut dup = sample_tag(&plc.device_id, "Temperature");
    dup.tag_id = "tag-other".to_string();
    let err = tags
        .create_tag(dup)
        .await
        .expect_err("duplicate tag name rejected");
    assert_eq!(err.kind(), StorageErrorKind::Conflict);

    // 换个名字可以建，换回重名的更新同样被拒。
    let second = tags
        .create_tag({
            let mut tag = sample_tag(&plc.device_id, "Pressure");
            tag.address = "DB1.DBD4".to_string();
            tag
        })
        .await
        .expect("create second tag");
    let err = tags
        .update_tag(
            &second.tag_id,
            TagUpdate {
                name: Some("Temperature".to_string()),
                ..TagUpdate::default()
            },
        )
        .await
        .expect_err("rename onto existing name rejected");
    assert_eq!(err.kind(), StorageErrorKind::Conflict);
}

#[tokio::test]
async fn tag_value_update_persists_sample() {
    let (devices, tags, _mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create device");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");

    let updated = tags
        .update_tag_value(&tag.tag_id, 42.5, "GOOD")
        .await
        .expect("update value")
        .expect("tag exists");
    assert_eq!(updated.value, 42.5);
    assert_eq!(updated.quality, "GOOD");

    let err = tags
        .update_tag_value(&tag.tag_id, f64::NAN, "GOOD")
        .await
        .expect_err("non-finite value rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);

    let missing = tags
        .update_tag_value("tag-missing", 1.0, "GOOD")
        .await
        .expect("update missing");
    assert!(missing.is_none());
}

#[tokio::test]
async fn resolve_tag_joins_device_and_enabled_mappings() {
    let (devices, tags, mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create source");
    let sink = devices
        .create_device(sample_device("gw-a", "SINK"))
        .await
        .expect("create sink");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");

    mappings
        .create_mapping(sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp"))
        .await
        .expect("create enabled mapping");
    let mut disabled = sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp_Off");
    disabled.enabled = false;
    mappings
        .create_mapping(disabled)
        .await
        .expect("create disabled mapping");

    let resolved = tags
        .resolve_tag(&tag.tag_id)
        .await
        .expect("resolve")
        .expect("tag resolvable");
    assert_eq!(resolved.device.device_id, plc.device_id);
    assert_eq!(resolved.enabled_mappings.len(), 1);
    assert_eq!(resolved.enabled_mappings[0].output_tag_name, "Gw_Temp");

    assert!(tags
        .resolve_tag("tag-missing")
        .await
        .expect("resolve missing")
        .is_none());
}

#[tokio::test]
async fn mapping_target_must_be_sink() {
    let (devices, tags, mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create source");
    let other_source = devices
        .create_device(sample_device("plc-b", "SOURCE"))
        .await
        .expect("create second source");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");

    let err = mappings
        .create_mapping(sample_mapping(&tag.tag_id, &other_source.device_id, "Gw_Temp"))
        .await
        .expect_err("source target rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);

    let err = mappings
        .create_mapping(sample_mapping(&tag.tag_id, "dev-missing", "Gw_Temp"))
        .await
        .expect_err("missing target rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);

    let err = mappings
        .create_mapping(sample_mapping("tag-missing", &other_source.device_id, "Gw_Temp"))
        .await
        .expect_err("missing input tag rejected");
    assert_eq!(err.kind(), StorageErrorKind::InvalidInput);
}

#[tokio::test]
async fn mapping_is_unique_per_tag_target_and_name() {
    let (devices, tags, mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create source");
    let sink = devices
        .create_device(sample_device("gw-a", "SINK"))
        .await
        .expect("create sink");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");

    mappings
        .create_mapping(sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp"))
        .await
        .expect("create mapping");
    let mut dup = sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp");
    dup.mapping_id = "map-other".to_string();
    let err = mappings
        .create_mapping(dup)
        .await
        .expect_err("duplicate mapping rejected");
    assert_eq!(err.kind(), StorageErrorKind::Conflict);

    // 改名和改系数走 update，禁用后仍算占用同一组合。
    let second = mappings
        .create_mapping(sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp2"))
        .await
        .expect("create second mapping");
    let updated = mappings
        .update_mapping(
            &second.mapping_id,
            MappingUpdate {
                scale_factor: Some(2.0),
                enabled: Some(false),
                ..MappingUpdate::default()
            },
        )
        .await
        .expect("update mapping")
        .expect("mapping exists");
    assert_eq!(updated.scale_factor, Some(2.0));
    assert!(!updated.enabled);

    let err = mappings
        .update_mapping(
            &second.mapping_id,
            MappingUpdate {
                output_tag_name: Some("Gw_Temp".to_string()),
                ..MappingUpdate::default()
            },
        )
        .await
        .expect_err("rename onto existing combination rejected");
    assert_eq!(err.kind(), StorageErrorKind::Conflict);
}

#[tokio::test]
async fn delete_device_cascades_tags_and_mappings() {
    let (devices, tags, mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create source");
    let sink = devices
        .create_device(sample_device("gw-a", "SINK"))
        .await
        .expect("create sink");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");
    mappings
        .create_mapping(sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp"))
        .await
        .expect("create mapping");

    // 删源设备：点位和以它为输入的映射一起消失。
    assert!(devices
        .delete_device(&plc.device_id)
        .await
        .expect("delete source"));
    assert!(tags
        .find_tag(&tag.tag_id)
        .await
        .expect("find tag")
        .is_none());
    assert!(mappings
        .list_mappings()
        .await
        .expect("list mappings")
        .is_empty());

    // 删目标设备：指向它的映射消失，其他设备的点位保留。
    let plc2 = devices
        .create_device(sample_device("plc-b", "SOURCE"))
        .await
        .expect("recreate source");
    let tag2 = tags
        .create_tag(sample_tag(&plc2.device_id, "Pressure"))
        .await
        .expect("create tag");
    mappings
        .create_mapping(sample_mapping(&tag2.tag_id, &sink.device_id, "Gw_Press"))
        .await
        .expect("create mapping");
    assert!(devices
        .delete_device(&sink.device_id)
        .await
        .expect("delete sink"));
    assert!(mappings
        .list_mappings()
        .await
        .expect("list mappings")
        .is_empty());
    assert!(tags
        .find_tag(&tag2.tag_id)
        .await
        .expect("find tag")
        .is_some());
}

#[tokio::test]
async fn delete_tag_removes_its_mappings() {
    let (devices, tags, mappings) = new_shared_stores();

    let plc = devices
        .create_device(sample_device("plc-a", "SOURCE"))
        .await
        .expect("create source");
    let sink = devices
        .create_device(sample_device("gw-a", "SINK"))
        .await
        .expect("create sink");
    let tag = tags
        .create_tag(sample_tag(&plc.device_id, "Temperature"))
        .await
        .expect("create tag");
    mappings
        .create_mapping(sample_mapping(&tag.tag_id, &sink.device_id, "Gw_Temp"))
        .await
        .expect("create mapping");

    assert!(tags.delete_tag(&tag.tag_id).await.expect("delete tag"));
    assert!(mappings
        .list_mappings_for_target(&sink.device_id)
        .await
        .expect("list for target")
        .is_empty());
    assert!(!tags.delete_tag(&tag.tag_id).await.expect("second delete"));
}

#[tokio::test]
async fn seed_demo_populates_once() {
    let (devices, tags, mappings) = new_shared_stores();

    let seeded = seed_demo(&devices, &tags, &mappings)
        .await
        .expect("first seed");
    assert!(seeded);

    let all = devices
        .list_devices(DeviceFilter::default())
        .await
        .expect("list devices");
    assert_eq!(all.len(), 4);
    let sinks = devices
        .list_devices(DeviceFilter {
            direction: Some("SINK".to_string()),
            ..DeviceFilter::default()
        })
        .await
        .expect("list sinks");
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].port, Some(4840));
    assert!(!sinks[0].enabled);

    let siemens = all
        .iter()
        .find(|device| device.name == "Siemens S7-1500")
        .expect("siemens seeded");
    let siemens_tags = tags
        .list_tags(&siemens.device_id)
        .await
        .expect("list siemens tags");
    assert_eq!(siemens_tags.len(), 3);

    assert_eq!(
        mappings.list_mappings().await.expect("list mappings").len(),
        2
    );

    // 重复播种整体跳过。
    let again = seed_demo(&devices, &tags, &mappings)
        .await
        .expect("second seed");
    assert!(!again);
    assert_eq!(
        devices
            .list_devices(DeviceFilter::default())
            .await
            .expect("list after reseed")
            .len(),
        4
    );
}

#[tokio::test]
async fn seed_demo_ids_are_stable_across_instances() {
    let (devices_a, tags_a, mappings_a) = new_shared_stores();
    let (devices_b, tags_b, mappings_b) = new_shared_stores();

    seed_demo(&devices_a, &tags_a, &mappings_a)
        .await
        .expect("seed a");
    seed_demo(&devices_b, &tags_b, &mappings_b)
        .await
        .expect("seed b");

    let ids = |list: Vec<DeviceRecord>| {
        let mut ids: Vec<String> = list.into_iter().map(|device| device.device_id).collect();
        ids.sort();
        ids
    };
    let a = ids(devices_a
        .list_devices(DeviceFilter::default())
        .await
        .expect("list a"));
    let b = ids(devices_b
        .list_devices(DeviceFilter::default())
        .await
        .expect("list b"));
    assert_eq!(a, b);
}
