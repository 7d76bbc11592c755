//! # 输出仿真能力模块
//!
//! 把每台启用的输出设备呈现为一个协议端点，变量集取自指向该设备的
//! 启用映射：
//!
//! ```text
//! EmulationSupervisor ──start/stop──▶ EndpointServer（每设备一个端点）
//!        │                                  ▲
//!        │ 订阅 WriteRequest                │ 变量表写入
//!        └──▶ 写监听任务 ───────────────────┘
//!        └──▶ Status / Log 事件
//! ```
//!
//! 端点启动成功后把实际端口与访问地址回写设备记录。协议不支持或
//! 端口被占时发布一条 ERROR 日志事件并向调用方抛错，不留运行实例。
//! 写请求按输出点位名匹配变量，名字没命中再按地址回退，匹配不上
//! 就静默丢弃。

mod ports;
mod supervisor;

pub use ports::PortAllocator;
pub use supervisor::{EmulatedEndpoint, EmulationStatus, EmulationSupervisor};

/// 输出仿真生命周期错误。
#[derive(Debug, thiserror::Error)]
pub enum EmulateError {
    /// 存储访问失败。
    #[error("storage error: {0}")]
    Storage(String),
    /// 端点启动失败（协议不支持或端口不可用）。
    #[error("endpoint error: {0}")]
    Endpoint(#[from] plcgw_protocol::ProtocolError),
    /// 运行表锁获取失败。
    #[error("lock failed")]
    Lock,
}
