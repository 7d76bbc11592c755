//! 广播中继服务器实现。

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use plcgw_bus::{EventFilter, EventTopic, InMemoryEventBus, RecvError, Subscription};
use plcgw_telemetry::record_relay_connection;

use crate::error::RelayError;
use crate::frames::RelayFrame;

/// 广播中继。
///
/// 每个接入的客户端拿到一份独立订阅，从接入时刻起接收事件，
/// 不回放历史。跟不上事件流的客户端直接断开，由其自行重连。
pub struct BroadcastRelay {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl BroadcastRelay {
    /// 绑定地址并启动接受循环。地址端口传 0 时由系统分配。
    pub async fn start(addr: &str, bus: Arc<InMemoryEventBus>) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| RelayError::Bind(format!("{addr}: {err}")))?;
        let local_addr = listener.local_addr()?;
        let (shutdown, signal) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(listener, bus, signal));

        info!(target: "plcgw.relay", addr = %local_addr, "relay_listening");
        Ok(Self {
            local_addr,
            shutdown,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// 优雅停机：接受循环退出，存量连接随停机信号断开。
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.accept_task.await {
            warn!(target: "plcgw.relay", error = %err, "accept_task_join_failed");
        }
        info!(target: "plcgw.relay", addr = %self.local_addr, "relay_stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    bus: Arc<InMemoryEventBus>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    record_relay_connection();
                    info!(target: "plcgw.relay", peer = %peer, "client_connected");
                    // 订阅在接受循环里同步建立，从此刻起的事件都会送达该客户端。
                    let subscription = bus.subscribe(EventFilter::topics(vec![
                        EventTopic::TagUpdate,
                        EventTopic::Status,
                        EventTopic::Log,
                    ]));
                    let signal = shutdown.clone();
                    tokio::spawn(async move {
                        let reason = serve_client(stream, subscription, signal).await;
                        info!(
                            target: "plcgw.relay",
                            peer = %peer,
                            reason = reason,
                            "client_disconnected"
                        );
                    });
                }
                Err(err) => {
                    warn!(target: "plcgw.relay", error = %err, "accept_failed");
                }
            }
        }
    }
}

/// 向单个客户端转发事件，返回断开原因。
async fn serve_client(
    mut stream: TcpStream,
    mut events: Subscription,
    mut shutdown: watch::Receiver<bool>,
) -> &'static str {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return "server_shutdown",
            received = events.recv_strict() => {
                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "plcgw.relay", skipped, "client_lagged_kicked");
                        return "lagged";
                    }
                    Err(RecvError::Closed) => return "hub_closed",
                };
                let Some(frame) = RelayFrame::from_event(event) else {
                    continue;
                };
                let mut line = match serde_json::to_string(&frame) {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(target: "plcgw.relay", error = %err, "frame_serialize_failed");
                        continue;
                    }
                };
                line.push('\n');
                if let Err(err) = stream.write_all(line.as_bytes()).await {
                    debug!(target: "plcgw.relay", error = %err, "client_write_failed");
                    return "write_failed";
                }
            }
        }
    }
}
