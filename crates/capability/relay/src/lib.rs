//! # 广播中继能力模块
//!
//! 把管道事件以 JSON 行的形式实时转发给外部 TCP 客户端：
//!
//! ```text
//! 事件中枢 ──TagUpdate/Status/Log──▶ BroadcastRelay
//!                                        │ 每连接一份订阅
//!                                        ├──▶ 客户端 A
//!                                        └──▶ 客户端 B
//! ```
//!
//! 中继不做任何缓冲：客户端只收到接入之后发布的事件，掉线期间的
//! 事件不补发。消费太慢被环形缓冲甩开的连接会被直接断开。
//!
//! ## 帧格式
//!
//! ```text
//! {"event":"tag:update","data":{"deviceId":"...","tagName":"...","value":112.5,...}}
//! {"event":"plc:status","data":{"deviceId":"...","status":"running",...}}
//! {"event":"system:log","data":{"level":"info","source":"simulation",...}}
//! ```

mod error;
mod frames;
mod server;

pub use error::RelayError;
pub use frames::{LogFrame, RelayFrame, StatusFrame, TagUpdateFrame};
pub use server::BroadcastRelay;
