//! 事件发布侧。

use crate::DEFAULT_CHANNEL_CAPACITY;
use crate::events::{EventFilter, GatewayEvent};
use crate::subscriber::Subscription;
use async_trait::async_trait;
use plcgw_telemetry::record_event_published;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// 事件发布接口，组件持有 `Arc<dyn EventPublisher>` 发布事件。
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 发布一条事件，返回收到该事件的订阅者数量。
    async fn publish(&self, event: GatewayEvent) -> usize;

    /// 累计发布的事件总数。
    fn events_published(&self) -> u64;
}

/// 基于 `tokio::sync::broadcast` 的进程内事件中枢实现。
pub struct InMemoryEventBus {
    sender: broadcast::Sender<GatewayEvent>,
    /// 按主题组合统计的活跃订阅数，仅用于排障日志。
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// 按过滤器建立订阅，句柄 drop 时自动注销。
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(topic_key.clone()).or_insert(0) += 1;
        }
        debug!(target: "plcgw.bus", topics = ?filter.topics, "subscription_created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// 当前活跃订阅者数量。
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: GatewayEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);
        record_event_published();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    target: "plcgw.bus",
                    topic = ?topic,
                    receivers = receiver_count,
                    "event_published"
                );
                receiver_count
            }
            Err(_) => {
                // 没有订阅者时事件直接丢弃，这是正常情况（例如中继无人连接）。
                debug!(target: "plcgw.bus", topic = ?topic, "event_dropped_no_receivers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
