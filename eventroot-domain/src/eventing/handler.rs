//! 事件处理器（EventHandler）与订阅谓词
//!
//! 处理器以一批事件为单位被调用：同一次提交产生的全部事件在一次
//! 调用内到达，保证“一条命令的事实一起到达”。
//!
use crate::domain_event::EventRecord;
use std::sync::Arc;

/// 订阅谓词：对整批事件判定是否投递
pub type Predicate = Arc<dyn Fn(&[EventRecord]) -> bool + Send + Sync>;

/// 事件处理器：消费一批事件
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于失败标记与审计）
    fn handler_name(&self) -> &str;

    /// 处理一批事件；错误会被包装为 `DomainError::EventHandler` 上抛
    fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()>;
}

/// 接受一切事件批的谓词
pub fn match_all() -> Predicate {
    Arc::new(|_| true)
}

/// 批内存在指定种类事件即接受
pub fn kind_is(kind: impl Into<String>) -> Predicate {
    let kind = kind.into();
    Arc::new(move |events| events.iter().any(|e| e.kind() == kind))
}
