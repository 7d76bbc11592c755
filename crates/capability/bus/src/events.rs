//! 中枢事件定义。

use domain::{LogEvent, OutputWrite, StatusChange, TagSample};

/// 流经事件中枢的全部事件。
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// 某个 tag 产出了新值（来源：信号发生器）。
    TagUpdate(TagSample),
    /// 请求向某个输出设备写入变量（来源：路由引擎）。
    WriteRequest(OutputWrite),
    /// 设备运行状态变化（来源：两类监督器）。
    Status(StatusChange),
    /// 管道日志事件（各组件均可发出，供广播中继转发）。
    Log(LogEvent),
}

impl GatewayEvent {
    /// 事件所属主题，订阅过滤用。
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TagUpdate(_) => EventTopic::TagUpdate,
            Self::WriteRequest(_) => EventTopic::WriteRequest,
            Self::Status(_) => EventTopic::Status,
            Self::Log(_) => EventTopic::Log,
        }
    }
}

/// 订阅过滤主题。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    TagUpdate,
    WriteRequest,
    Status,
    Log,
}

/// 订阅过滤器。topics 为空表示接收全部事件。
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// 接收全部事件。
    pub fn all() -> Self {
        Self::default()
    }

    /// 只接收指定主题。
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// 判断事件是否匹配该过滤器。
    pub fn matches(&self, event: &GatewayEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
