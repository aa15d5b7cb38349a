//! 事件总线（EventBus）
//!
//! 进程内（handler, predicate）对的登记表：
//! - `publish` 按订阅顺序同步调用谓词接受该批的全部处理器，
//!   每个处理器一次调用携带整批事件；
//! - `unsubscribe` 按 `Arc` 标识移除完全相同的（handler, predicate）对，
//!   未订阅时为无操作；
//! - 登记表以 `RwLock` 保护，不同聚合实例可在并发上下文中交错提交，
//!   投递在锁外进行，单次处理器调用内整批不可分割。
//!
use super::handler::{EventHandler, Predicate};
use crate::domain_event::EventRecord;
use crate::error::{DomainError, DomainResult};
use std::sync::{Arc, RwLock};
use tracing::debug;

struct Subscription {
    handler: Arc<dyn EventHandler>,
    predicate: Predicate,
}

/// 同步、进程内的发布/订阅分发器
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventBus {
    /// 空登记表的总线，由装配端持有并传递
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个（handler, predicate)对，投递顺序即订阅顺序
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>, predicate: Predicate) {
        if let Ok(mut subscriptions) = self.subscriptions.write() {
            subscriptions.push(Subscription { handler, predicate });
        }
    }

    /// 移除第一个完全相同的（handler, predicate)对；不存在则无操作
    pub fn unsubscribe(&self, handler: &Arc<dyn EventHandler>, predicate: &Predicate) {
        if let Ok(mut subscriptions) = self.subscriptions.write() {
            if let Some(pos) = subscriptions.iter().position(|s| {
                Arc::ptr_eq(&s.handler, handler) && Arc::ptr_eq(&s.predicate, predicate)
            }) {
                subscriptions.remove(pos);
            }
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// 将一批事件投递给所有谓词接受的处理器
    ///
    /// 空批不投递。处理器错误包装为 `EventHandler` 错误立即上抛，
    /// 已调用过的处理器不做补偿，重试策略属于外层。
    pub fn publish(&self, events: &[EventRecord]) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        // 锁内只做谓词匹配与快照，投递在锁外，处理器内可再订阅
        let matched: Vec<Arc<dyn EventHandler>> = {
            let subscriptions =
                self.subscriptions
                    .read()
                    .map_err(|_| DomainError::EventBus {
                        reason: "subscription registry lock poisoned".to_string(),
                    })?;
            subscriptions
                .iter()
                .filter(|s| (s.predicate)(events))
                .map(|s| s.handler.clone())
                .collect()
        };

        debug!(events = events.len(), handlers = matched.len(), "publishing batch");

        for handler in matched {
            handler
                .handle(events)
                .map_err(|e| DomainError::EventHandler {
                    handler: handler.handler_name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::{Attrs, EventRecord};
    use crate::eventing::{kind_is, match_all};
    use std::sync::Mutex;
    use uuid::Uuid;

    // 记录收到的每一批事件
    struct Recording {
        name: String,
        batches: Mutex<Vec<Vec<EventRecord>>>,
    }

    impl Recording {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                batches: Mutex::new(Vec::new()),
            })
        }

        fn batch_count(&self) -> usize {
            self.batches.lock().unwrap().len()
        }
    }

    impl EventHandler for Recording {
        fn handler_name(&self) -> &str {
            &self.name
        }

        fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()> {
            self.batches.lock().unwrap().push(events.to_vec());
            Ok(())
        }
    }

    fn record(kind: &str) -> EventRecord {
        EventRecord::builder()
            .kind(kind.to_string())
            .originator_id(Uuid::new_v4())
            .originator_version(0)
            .attrs(Attrs::new())
            .build()
    }

    #[test]
    fn batch_arrives_as_single_call() {
        let bus = EventBus::new();
        let handler = Recording::new("recording");
        bus.subscribe(handler.clone(), match_all());

        let batch = vec![record("Created"), record("AttributeChanged")];
        bus.publish(&batch).unwrap();

        let batches = handler.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    // 拒绝一切的谓词：零投递；退订后依旧零投递
    #[test]
    fn rejecting_predicate_and_unsubscribe_are_silent() {
        let bus = EventBus::new();
        let handler = Recording::new("recording");
        let none: Predicate = Arc::new(|_| false);

        bus.subscribe(handler.clone(), none.clone());
        bus.publish(&[record("Created")]).unwrap();
        assert_eq!(handler.batch_count(), 0);

        let dyn_handler: Arc<dyn EventHandler> = handler.clone();
        bus.unsubscribe(&dyn_handler, &none);
        bus.publish(&[record("Created")]).unwrap();
        assert_eq!(handler.batch_count(), 0);
        assert_eq!(bus.subscription_count(), 0);
    }

    // 退订未订阅的对是无操作
    #[test]
    fn unsubscribe_absent_pair_is_noop() {
        let bus = EventBus::new();
        let handler = Recording::new("recording");
        let all = match_all();
        bus.subscribe(handler.clone(), all.clone());

        // 同一处理器、不同谓词实例：不是同一对
        let other = match_all();
        let dyn_handler: Arc<dyn EventHandler> = handler.clone();
        bus.unsubscribe(&dyn_handler, &other);
        assert_eq!(bus.subscription_count(), 1);

        bus.unsubscribe(&dyn_handler, &all);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn kind_predicate_filters_batches() {
        let bus = EventBus::new();
        let handler = Recording::new("discard-watch");
        bus.subscribe(handler.clone(), kind_is("Discarded"));

        bus.publish(&[record("Created")]).unwrap();
        assert_eq!(handler.batch_count(), 0);

        bus.publish(&[record("AttributeChanged"), record("Discarded")])
            .unwrap();
        assert_eq!(handler.batch_count(), 1);
    }

    // 订阅顺序即投递顺序
    #[test]
    fn delivery_follows_subscription_order() {
        struct Ordered {
            name: String,
            log: Arc<Mutex<Vec<&'static str>>>,
            tag: &'static str,
        }
        impl EventHandler for Ordered {
            fn handler_name(&self) -> &str {
                &self.name
            }
            fn handle(&self, _events: &[EventRecord]) -> anyhow::Result<()> {
                self.log.lock().unwrap().push(self.tag);
                Ok(())
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        for tag in ["first", "second", "third"] {
            bus.subscribe(
                Arc::new(Ordered {
                    name: format!("ordered-{tag}"),
                    log: log.clone(),
                    tag,
                }),
                match_all(),
            );
        }

        bus.publish(&[record("Created")]).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    // 处理器错误被包装并上抛，不被吞掉
    #[test]
    fn handler_error_propagates() {
        struct Failing;
        impl EventHandler for Failing {
            fn handler_name(&self) -> &str {
                "failing"
            }
            fn handle(&self, _events: &[EventRecord]) -> anyhow::Result<()> {
                anyhow::bail!("boom")
            }
        }

        let bus = EventBus::new();
        bus.subscribe(Arc::new(Failing), match_all());

        let err = bus.publish(&[record("Created")]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::EventHandler { ref handler, .. } if handler == "failing"
        ));
    }
}
