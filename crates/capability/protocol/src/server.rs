//! 端点服务器实现
//!
//! 监听 TCP 端口，用行协议把变量表暴露给下游客户端。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let server = EndpointServer::start(
//!     "OPCUA",
//!     4840,
//!     vec![VariableSpec { name: "Gateway_Temperature".into(), address: "ns=1;s=Temperature".into() }],
//! )
//! .await?;
//! server.variables().write("Gateway_Temperature", 25.5).await;
//! server.stop().await;
//! ```

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use domain::constants;

use crate::error::ProtocolError;
use crate::variables::{VariableSpec, VariableTable};

/// 一个运行中的协议端点。
///
/// `start` 绑定端口并拉起接受循环，`stop` 优雅停机（循环退出后
/// 监听套接字随之释放，端口可立即复用）。
#[derive(Debug)]
pub struct EndpointServer {
    protocol: String,
    port: u16,
    endpoint: String,
    variables: VariableTable,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl EndpointServer {
    /// 启动一个端点服务器。
    ///
    /// 端口传 0 时由系统分配，实际端口以 [`EndpointServer::port`]
    /// 为准。不认识的协议标识返回 [`ProtocolError::Unsupported`]，
    /// 端口被占用返回 [`ProtocolError::Bind`]。
    pub async fn start(
        protocol: &str,
        port: u16,
        specs: Vec<VariableSpec>,
    ) -> Result<Self, ProtocolError> {
        let scheme = scheme_for(protocol)?;
        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| ProtocolError::Bind(format!("{addr}: {err}")))?;
        let port = listener.local_addr()?.port();
        let endpoint = format!("{scheme}://localhost:{port}");
        let variables = VariableTable::new(specs);

        let (shutdown, mut signal) = watch::channel(false);
        let table = variables.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.changed() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            debug!(target: "plcgw.protocol", peer = %peer, "client_connected");
                            let table = table.clone();
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, table).await {
                                    debug!(
                                        target: "plcgw.protocol",
                                        peer = %peer,
                                        error = %err,
                                        "client_connection_closed"
                                    );
                                }
                            });
                        }
                        Err(err) => {
                            warn!(target: "plcgw.protocol", error = %err, "accept_failed");
                        }
                    }
                }
            }
        });

        info!(
            target: "plcgw.protocol",
            protocol = %protocol,
            port = port,
            endpoint = %endpoint,
            "endpoint_started"
        );
        Ok(Self {
            protocol: protocol.to_string(),
            port,
            endpoint,
            variables,
            shutdown,
            accept_task,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 端点的变量表。写入方和行协议客户端看到同一份数据。
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// 优雅停机：通知接受循环退出并等它汇合。
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.accept_task.await {
            warn!(
                target: "plcgw.protocol",
                protocol = %self.protocol,
                error = %err,
                "accept_task_join_failed"
            );
        }
        info!(
            target: "plcgw.protocol",
            protocol = %self.protocol,
            port = self.port,
            "endpoint_stopped"
        );
    }
}

fn scheme_for(protocol: &str) -> Result<&'static str, ProtocolError> {
    match protocol {
        constants::PROTOCOL_OPCUA => Ok("opc.tcp"),
        constants::PROTOCOL_MODBUS_TCP => Ok("modbus"),
        other => Err(ProtocolError::Unsupported(other.to_string())),
    }
}

/// 处理单个连接：逐行读命令、逐行回结果。
async fn handle_connection(stream: TcpStream, table: VariableTable) -> Result<(), ProtocolError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = execute_command(line, &table).await;
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// 行协议：
///
/// - `READ <name>` → `VALUE <name> <value> <ts>`
/// - `WRITE <name> <value>` → `OK`
/// - `LIST` → 每变量一行 `VAR <name> <address> <value> <ts>`，以 `END` 结尾
async fn execute_command(line: &str, table: &VariableTable) -> String {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("READ") => match parts.next() {
            Some(name) => match table.read(name).await {
                Some(var) => format!("VALUE {} {} {}", var.name, var.value, var.updated_at_ms),
                None => "ERROR unknown variable".to_string(),
            },
            None => "ERROR usage: READ <name>".to_string(),
        },
        Some("WRITE") => {
            let name = parts.next();
            let value = parts.next().and_then(|raw| raw.parse::<f64>().ok());
            match (name, value) {
                (Some(name), Some(value)) => {
                    if table.write(name, value).await {
                        "OK".to_string()
                    } else {
                        "ERROR unknown variable".to_string()
                    }
                }
                _ => "ERROR usage: WRITE <name> <value>".to_string(),
            }
        }
        Some("LIST") => {
            let vars = table.snapshot().await;
            let mut out = String::new();
            for var in &vars {
                out.push_str(&format!(
                    "VAR {} {} {} {}\n",
                    var.name, var.address, var.value, var.updated_at_ms
                ));
            }
            out.push_str("END");
            out
        }
        _ => "ERROR unknown command".to_string(),
    }
}
