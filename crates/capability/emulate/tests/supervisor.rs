//! 输出监督器的集成测试：端点生命周期、启动失败上抛、写请求应用。

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use domain::{constants, LogLevel, OutputWrite};
use plcgw_bus::{EventFilter, EventPublisher, EventTopic, GatewayEvent, InMemoryEventBus};
use plcgw_emulate::{EmulateError, EmulationSupervisor};
use plcgw_storage::{
    new_shared_stores, DeviceRecord, DeviceStore, InMemoryDeviceStore, InMemoryMappingStore,
    InMemoryTagStore, MappingRecord, MappingStore, TagRecord, TagStore,
};

fn source_device(name: &str) -> DeviceRecord {
    DeviceRecord {
        device_id: format!("dev-{name}"),
        name: name.to_string(),
        brand: None,
        protocol: "S7COMM".to_string(),
        direction: constants::DIRECTION_SOURCE.to_string(),
        enabled: true,
        port: None,
        endpoint: None,
        protocol_config: None,
    }
}

fn sink_device(name: &str, protocol: &str, enabled: bool) -> DeviceRecord {
    DeviceRecord {
        device_id: format!("dev-{name}"),
        name: name.to_string(),
        brand: None,
        protocol: protocol.to_string(),
        direction: constants::DIRECTION_SINK.to_string(),
        enabled,
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
        address: format!("DB1.{name}"),
        data_type: "FLOAT".to_string(),
        unit: None,
        value: 0.0,
        quality: "GOOD".to_string(),
        signal_type: "SINE".to_string(),
        frequency: Some(0.5),
        amplitude: Some(50.0),
        offset: Some(100.0),
    }
}

fn sample_mapping(
    input_tag_id: &str,
    output_device_id: &str,
    name: &str,
    address: &str,
    enabled: bool,
) -> MappingRecord {
    MappingRecord {
        mapping_id: format!("map-{name}"),
        input_tag_id: input_tag_id.to_string(),
        output_device_id: output_device_id.to_string(),
        output_tag_name: name.to_string(),
        output_address: address.to_string(),
        scale_factor: Some(1.0),
        offset: Some(0.0),
        enabled,
    }
}

struct Pipeline {
    bus: Arc<InMemoryEventBus>,
    devices: Arc<InMemoryDeviceStore>,
    tags: Arc<InMemoryTagStore>,
    mappings: Arc<InMemoryMappingStore>,
    supervisor: Arc<EmulationSupervisor>,
}

/// 端口基准给 0：首个自动分配的端点由系统挑空闲端口，测试之间互不冲突。
fn pipeline() -> Pipeline {
    let (devices, tags, mappings) = new_shared_stores();
    let bus = Arc::new(InMemoryEventBus::new());
    let devices = Arc::new(devices);
    let tags = Arc::new(tags);
    let mappings = Arc::new(mappings);
    let supervisor = Arc::new(EmulationSupervisor::new(
        devices.clone(),
        mappings.clone(),
        bus.clone(),
        0,
        0,
    ));
    Pipeline {
        bus,
        devices,
        tags,
        mappings,
        supervisor,
    }
}

/// 建一台带一个输入点位的源设备，返回 tag_id。映射创建要求输入点位存在。
async fn seed_source(p: &Pipeline) -> String {
    let source = p
        .devices
        .create_device(source_device("plc-src"))
        .await
        .expect("create source");
    let tag = p
        .tags
        .create_tag(sample_tag(&source.device_id, "Pressure_Tank1"))
        .await
        .expect("create tag");
    tag.tag_id
}

async fn send_command(port: u16, command: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("connect");
    stream
        .write_all(format!("{command}\n").as_bytes())
        .await
        .expect("send");
    stream.shutdown().await.expect("shutdown write");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response.trim_end().to_string()
}

/// 轮询端点直到变量到达期望值。写监听是异步任务，需要给它应用时间。
async fn wait_for_value(port: u16, name: &str, expected: f64) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let response = send_command(port, &format!("READ {name}")).await;
        let value = response
            .split_whitespace()
            .nth(2)
            .and_then(|raw| raw.parse::<f64>().ok());
        if let Some(value) = value {
            if (value - expected).abs() < 1e-9 {
                return;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "variable {name} never reached {expected}, last response: {response}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn start_serves_enabled_mappings_and_persists_endpoint() {
    let p = pipeline();
    let input_tag_id = seed_source(&p).await;
    let sink = p
        .devices
        .create_device(sink_device("opcua-gw", "OPCUA", false))
        .await
        .expect("create sink");
    p.mappings
        .create_mapping(sample_mapping(
            &input_tag_id,
            &sink.device_id,
            "Gateway_Pressure",
            "ns=1;s=Pressure",
            true,
        ))
        .await
        .expect("create mapping");
    p.mappings
        .create_mapping(sample_mapping(
            &input_tag_id,
            &sink.device_id,
            "Gateway_Hidden",
            "ns=1;s=Hidden",
            false,
        ))
        .await
        .expect("create disabled mapping");

    assert!(p.supervisor.start(&sink).await.expect("start"));
    assert!(!p.supervisor.start(&sink).await.expect("second start"));

    let status = p.supervisor.status();
    assert_eq!(status.active, 1);
    // 停用的映射不进变量表。
    assert_eq!(status.endpoints[0].variable_count, 1);
    let port = status.endpoints[0].port;

    let stored = p
        .devices
        .find_device(&sink.device_id)
        .await
        .expect("find sink")
        .expect("sink exists");
    assert_eq!(stored.port, Some(port));
    assert_eq!(
        stored.endpoint.as_deref(),
        Some(format!("opc.tcp://localhost:{port}").as_str())
    );
    assert!(stored.enabled);

    let listing = send_command(port, "LIST").await;
    assert!(listing.contains("VAR Gateway_Pressure ns=1;s=Pressure 0"));
    assert!(!listing.contains("Gateway_Hidden"));

    assert!(p.supervisor.stop(&sink.device_id).await.expect("stop"));
    assert!(!p.supervisor.stop(&sink.device_id).await.expect("second stop"));
    assert_eq!(p.supervisor.status().active, 0);
    let stored = p
        .devices
        .find_device(&sink.device_id)
        .await
        .expect("find sink")
        .expect("sink exists");
    assert!(!stored.enabled);
}

#[tokio::test]
async fn unsupported_protocol_fails_loud_without_instance() {
    let p = pipeline();
    let sink = p
        .devices
        .create_device(sink_device("profinet-gw", "PROFINET", false))
        .await
        .expect("create sink");
    let mut logs = p.bus.subscribe(EventFilter::topics(vec![EventTopic::Log]));

    let err = p.supervisor.start(&sink).await.expect_err("start must fail");
    assert!(matches!(err, EmulateError::Endpoint(_)));
    assert!(!p.supervisor.is_running(&sink.device_id));
    assert_eq!(p.supervisor.status().active, 0);

    let event = logs.recv().await.expect("error log event");
    match event {
        GatewayEvent::Log(log) => {
            assert_eq!(log.level, LogLevel::Error);
            assert_eq!(log.source, "emulation");
            assert!(log.message.contains("profinet-gw"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // 失败只对外暴露这一条事件。
    assert!(logs.try_recv().expect("try_recv").is_none());

    let stored = p
        .devices
        .find_device(&sink.device_id)
        .await
        .expect("find sink")
        .expect("sink exists");
    assert!(!stored.enabled);
    assert!(stored.endpoint.is_none());
}

#[tokio::test]
async fn bind_conflict_fails_loud_without_instance() {
    let p = pipeline();
    // 占住一个端口制造绑定冲突。
    let blocker = std::net::TcpListener::bind("0.0.0.0:0").expect("bind blocker");
    let taken = blocker.local_addr().expect("local addr").port();

    let mut sink = sink_device("modbus-gw", "MODBUS_TCP", false);
    sink.port = Some(taken);
    let sink = p.devices.create_device(sink).await.expect("create sink");

    let err = p.supervisor.start(&sink).await.expect_err("start must fail");
    assert!(matches!(err, EmulateError::Endpoint(_)));
    assert!(!p.supervisor.is_running(&sink.device_id));
}

#[tokio::test]
async fn stop_releases_port_for_restart() {
    let p = pipeline();
    let sink = p
        .devices
        .create_device(sink_device("opcua-gw", "OPCUA", false))
        .await
        .expect("create sink");

    assert!(p.supervisor.start(&sink).await.expect("first start"));
    let port = p.supervisor.status().endpoints[0].port;
    assert!(p.supervisor.stop(&sink.device_id).await.expect("stop"));

    // 端点启动时把实际端口回写了设备记录，重启会复用同一端口。
    let stored = p
        .devices
        .find_device(&sink.device_id)
        .await
        .expect("find sink")
        .expect("sink exists");
    assert_eq!(stored.port, Some(port));
    assert!(p.supervisor.start(&stored).await.expect("restart"));
    assert_eq!(p.supervisor.status().endpoints[0].port, port);
    p.supervisor.stop_all().await;
}

#[tokio::test]
async fn write_requests_reach_endpoint_variables() {
    let p = pipeline();
    let input_tag_id = seed_source(&p).await;
    let sink = p
        .devices
        .create_device(sink_device("opcua-gw", "OPCUA", false))
        .await
        .expect("create sink");
    p.mappings
        .create_mapping(sample_mapping(
            &input_tag_id,
            &sink.device_id,
            "Gateway_Pressure",
            "ns=1;s=Pressure",
            true,
        ))
        .await
        .expect("create mapping");
    p.mappings
        .create_mapping(sample_mapping(
            &input_tag_id,
            &sink.device_id,
            "Gateway_Temperature",
            "ns=1;s=Temperature",
            true,
        ))
        .await
        .expect("create second mapping");

    let listener = p.supervisor.clone().spawn_write_listener();
    assert!(p.supervisor.start(&sink).await.expect("start"));
    let port = p.supervisor.status().endpoints[0].port;

    // 名字直接命中。
    p.bus
        .publish(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: sink.device_id.clone(),
            tag_name: "Gateway_Pressure".to_string(),
            address: "ns=1;s=Pressure".to_string(),
            value: 6.89476,
            quality: "GOOD".to_string(),
        }))
        .await;
    wait_for_value(port, "Gateway_Pressure", 6.89476).await;

    // 名字没命中时按地址回退。
    p.bus
        .publish(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: sink.device_id.clone(),
            tag_name: "Renamed_Upstream".to_string(),
            address: "ns=1;s=Temperature".to_string(),
            value: 42.5,
            quality: "GOOD".to_string(),
        }))
        .await;
    wait_for_value(port, "Gateway_Temperature", 42.5).await;

    // 完全匹配不上与目标端点不在运行的写请求都静默丢弃。
    p.bus
        .publish(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: sink.device_id.clone(),
            tag_name: "No_Such_Variable".to_string(),
            address: "ns=9;s=Nowhere".to_string(),
            value: 1.0,
            quality: "GOOD".to_string(),
        }))
        .await;
    p.bus
        .publish(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: "dev-ghost".to_string(),
            tag_name: "Gateway_Pressure".to_string(),
            address: "ns=1;s=Pressure".to_string(),
            value: 999.0,
            quality: "GOOD".to_string(),
        }))
        .await;
    // 用一条能命中的哨兵写确认前两条已被消费而没有让监听任务挂掉。
    p.bus
        .publish(GatewayEvent::WriteRequest(OutputWrite {
            target_device_id: sink.device_id.clone(),
            tag_name: "Gateway_Pressure".to_string(),
            address: "ns=1;s=Pressure".to_string(),
            value: 7.5,
            quality: "GOOD".to_string(),
        }))
        .await;
    wait_for_value(port, "Gateway_Pressure", 7.5).await;

    let response = send_command(port, "READ Gateway_Temperature").await;
    assert!(response.starts_with("VALUE Gateway_Temperature 42.5"));

    p.supervisor.stop_all().await;
    listener.abort();
}

#[tokio::test]
async fn start_enabled_only_touches_enabled_sinks() {
    let p = pipeline();
    p.devices
        .create_device(source_device("plc-src"))
        .await
        .expect("create source");
    p.devices
        .create_device(sink_device("opcua-on", "OPCUA", true))
        .await
        .expect("create enabled opcua sink");
    p.devices
        .create_device(sink_device("modbus-on", "MODBUS_TCP", true))
        .await
        .expect("create enabled modbus sink");
    p.devices
        .create_device(sink_device("opcua-off", "OPCUA", false))
        .await
        .expect("create disabled sink");

    let started = p.supervisor.start_enabled().await.expect("start enabled");
    assert_eq!(started, 2);

    let status = p.supervisor.status();
    assert_eq!(status.active, 2);
    assert!(status
        .endpoints
        .iter()
        .all(|endpoint| endpoint.device_name != "opcua-off"));

    assert_eq!(p.supervisor.stop_all().await, 2);
    assert_eq!(p.supervisor.status().active, 0);
}
