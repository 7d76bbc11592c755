//! 进程内事件中枢。
//!
//! 管道各组件（信号发生器、路由引擎、输出监督器、广播中继）之间禁止直接调用，
//! 全部通过本中枢交换事件：
//!
//! ```text
//! 信号发生器 ──publish──▶ ┌──────────┐ ──subscribe──▶ 路由引擎
//! 路由引擎   ──publish──▶ │ 事件中枢 │ ──subscribe──▶ 输出监督器
//! 各组件日志 ──publish──▶ └──────────┘ ──subscribe──▶ 广播中继
//! ```
//!
//! 交付语义：仅投递给当前已注册的订阅者，不持久化、不重放；
//! 订阅端滞后时环形缓冲覆盖最旧事件并计入 telemetry。

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, GatewayEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{RecvError, Subscription};

/// 每个订阅者的环形缓冲默认容量。
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
