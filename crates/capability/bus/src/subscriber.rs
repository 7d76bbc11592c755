//! 事件订阅侧。

use crate::events::{EventFilter, GatewayEvent};
use plcgw_telemetry::record_subscriber_lag_drops;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// 订阅接收错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecvError {
    /// 事件中枢已释放。
    #[error("event hub closed")]
    Closed,
    /// 订阅端滞后，环形缓冲覆盖了若干条事件。
    #[error("subscriber lagged, {0} events skipped")]
    Lagged(u64),
}

/// 订阅句柄。drop 时自动注销。
pub struct Subscription {
    receiver: broadcast::Receiver<GatewayEvent>,
    filter: EventFilter,
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    topic_key: String,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<GatewayEvent>,
        filter: EventFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        topic_key: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            subscriptions,
            topic_key,
        }
    }

    /// 接收下一条匹配过滤器的事件。
    ///
    /// 滞后被覆盖的事件计入 telemetry 后继续等待更新的事件；
    /// 中枢关闭时返回 `None`。适合只关心最新值的管道内消费者。
    pub async fn recv(&mut self) -> Option<GatewayEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    record_subscriber_lag_drops(skipped);
                    warn!(target: "plcgw.bus", skipped, "subscriber_lagged");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// 与 [`recv`](Self::recv) 相同，但滞后时立即返回 `Lagged`，
    /// 由调用方决定是否断开（广播中继以此踢掉跟不上的客户端）。
    pub async fn recv_strict(&mut self) -> Result<GatewayEvent, RecvError> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => return Err(RecvError::Closed),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    record_subscriber_lag_drops(skipped);
                    warn!(target: "plcgw.bus", skipped, "subscriber_lagged");
                    return Err(RecvError::Lagged(skipped));
                }
            };

            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// 非阻塞接收。无事件可取时返回 `Ok(None)`。
    pub fn try_recv(&mut self) -> Result<Option<GatewayEvent>, RecvError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(RecvError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    record_subscriber_lag_drops(skipped);
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        let Some(count) = subs.get_mut(&self.topic_key) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            subs.remove(&self.topic_key);
        }
        debug!(target: "plcgw.bus", topic = %self.topic_key, "subscription_dropped");
    }
}
