//! 广播中继的集成测试：帧转发、订阅时点、多客户端与停机。

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::time::timeout;

use domain::{DeviceStatus, LogEvent, LogLevel, OutputWrite, StatusChange, TagSample};
use plcgw_bus::{EventPublisher, GatewayEvent, InMemoryEventBus};
use plcgw_relay::BroadcastRelay;

fn tag_update(tag_name: &str, value: f64) -> GatewayEvent {
    GatewayEvent::TagUpdate(TagSample {
        device_id: "dev-1".to_string(),
        tag_id: format!("tag-{tag_name}"),
        tag_name: tag_name.to_string(),
        value,
        quality: "GOOD".to_string(),
        ts_ms: 1_700_000_000_000,
    })
}

async fn connect(port: u16) -> Lines<BufReader<TcpStream>> {
    let stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("connect");
    BufReader::new(stream).lines()
}

/// 接受循环建立订阅后 receiver_count 才会涨，以此确认客户端就绪。
async fn wait_for_subscribers(bus: &InMemoryEventBus, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while bus.subscriber_count() < expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "subscriber count never reached {expected}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn next_frame(lines: &mut Lines<BufReader<TcpStream>>) -> serde_json::Value {
    let line = timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("frame timeout")
        .expect("read line")
        .expect("stream still open");
    serde_json::from_str(&line).expect("valid json frame")
}

#[tokio::test]
async fn forwards_pipeline_events_and_hides_write_requests() {
    let bus = Arc::new(InMemoryEventBus::new());
    let relay = BroadcastRelay::start("127.0.0.1:0", bus.clone())
        .await
        .expect("start relay");

    let mut client = connect(relay.port()).await;
    wait_for_subscribers(&bus, 1).await;

    bus.publish(tag_update("Pressure_Tank1", 112.5)).await;
    bus.publish(GatewayEvent::WriteRequest(OutputWrite {
        target_device_id: "dev-2".to_string(),
        tag_name: "Gateway_Pressure".to_string(),
        address: "ns=1;s=Pressure".to_string(),
        value: 7.75,
        quality: "GOOD".to_string(),
    }))
    .await;
    bus.publish(GatewayEvent::Status(StatusChange::new(
        "dev-1",
        "Siemens S7-1500",
        DeviceStatus::Running,
        Some("simulation started".to_string()),
    )))
    .await;
    bus.publish(GatewayEvent::Log(LogEvent::new(
        LogLevel::Info,
        "routing",
        "normalized Siemens S7-1500/Pressure_Tank1 = 112.500 (1 mappings)",
    )))
    .await;

    // 写请求是管道内部流量，客户端只看到其余三帧。
    let frame = next_frame(&mut client).await;
    assert_eq!(frame["event"], "tag:update");
    assert_eq!(frame["data"]["tagName"], "Pressure_Tank1");
    assert_eq!(frame["data"]["value"], 112.5);
    assert_eq!(frame["data"]["timestamp"], 1_700_000_000_000_i64);

    let frame = next_frame(&mut client).await;
    assert_eq!(frame["event"], "plc:status");
    assert_eq!(frame["data"]["deviceName"], "Siemens S7-1500");
    assert_eq!(frame["data"]["status"], "running");

    let frame = next_frame(&mut client).await;
    assert_eq!(frame["event"], "system:log");
    assert_eq!(frame["data"]["level"], "info");
    assert_eq!(frame["data"]["source"], "routing");

    relay.stop().await;
}

#[tokio::test]
async fn late_client_only_sees_later_events() {
    let bus = Arc::new(InMemoryEventBus::new());
    let relay = BroadcastRelay::start("127.0.0.1:0", bus.clone())
        .await
        .expect("start relay");

    // 无人连接时发布的事件直接丢弃，不会补发给后来者。
    bus.publish(tag_update("Before_Connect", 1.0)).await;

    let mut client = connect(relay.port()).await;
    wait_for_subscribers(&bus, 1).await;
    bus.publish(tag_update("After_Connect", 2.0)).await;

    let frame = next_frame(&mut client).await;
    assert_eq!(frame["data"]["tagName"], "After_Connect");

    relay.stop().await;
}

#[tokio::test]
async fn every_client_gets_its_own_copy() {
    let bus = Arc::new(InMemoryEventBus::new());
    let relay = BroadcastRelay::start("127.0.0.1:0", bus.clone())
        .await
        .expect("start relay");

    let mut first = connect(relay.port()).await;
    let mut second = connect(relay.port()).await;
    wait_for_subscribers(&bus, 2).await;

    let receivers = bus.publish(tag_update("Flow_Rate", 150.0)).await;
    assert_eq!(receivers, 2);

    let frame = next_frame(&mut first).await;
    assert_eq!(frame["data"]["tagName"], "Flow_Rate");
    let frame = next_frame(&mut second).await;
    assert_eq!(frame["data"]["tagName"], "Flow_Rate");

    relay.stop().await;
}

#[tokio::test]
async fn stop_disconnects_clients_and_releases_port() {
    let bus = Arc::new(InMemoryEventBus::new());
    let relay = BroadcastRelay::start("127.0.0.1:0", bus.clone())
        .await
        .expect("start relay");
    let port = relay.port();

    let mut client = connect(port).await;
    wait_for_subscribers(&bus, 1).await;
    relay.stop().await;

    // 停机信号让连接任务退出，客户端读到流结束。
    let eof = timeout(Duration::from_secs(2), client.next_line())
        .await
        .expect("eof timeout")
        .expect("read");
    assert!(eof.is_none());

    let relay = BroadcastRelay::start(&format!("127.0.0.1:{port}"), bus.clone())
        .await
        .expect("rebind after stop");
    relay.stop().await;
}
