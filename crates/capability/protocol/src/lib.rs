//! # plcgw-protocol
//!
//! 协议端点能力：把一张变量表绑定到 TCP 端口上，对外呈现为
//! OPC UA / Modbus TCP 风格的端点。网关用它来仿真下游 PLC。
//!
//! ## 架构
//!
//! ```text
//!   写入方 (路由输出)                  下游客户端
//!        │                                │
//!        ▼                                ▼
//!   VariableTable  ◄──────────────  EndpointServer
//!   (名称/地址 → 值)                 (行协议 READ/WRITE/LIST)
//! ```
//!
//! 变量表是共享状态：网关侧按名称（或地址回退）写入，客户端侧
//! 通过行协议读写同一份数据。端点只承载变量语义，不做字段级的
//! 总线报文编解码。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use plcgw_protocol::{EndpointServer, VariableSpec};
//!
//! let server = EndpointServer::start(
//!     "OPCUA",
//!     0, // 0 表示由系统分配端口
//!     vec![VariableSpec {
//!         name: "Gateway_Temperature".into(),
//!         address: "ns=1;s=Temperature".into(),
//!     }],
//! )
//! .await?;
//!
//! println!("endpoint ready at {}", server.endpoint());
//! server.variables().write("Gateway_Temperature", 25.5).await;
//! server.stop().await;
//! ```

mod error;
mod server;
mod variables;

pub use error::ProtocolError;
pub use server::EndpointServer;
pub use variables::{VariableSpec, VariableState, VariableTable};
