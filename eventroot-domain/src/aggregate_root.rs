//! 聚合根（AggregateRoot）
//!
//! 在 `Entity` 命令协议之上缓冲事件：命令应用本地状态但不发布，
//! 事件按序进入 `pending`；`commit` 将整个缓冲作为一个批次交给
//! `EventBus`，订阅方永远不会观察到一条命令效果的部分前缀。
//!
//! `pending` 在发布前整体取出：即使某个处理器投递失败，缓冲也已清空，
//! 重试 `commit` 不会重复投递已提交的事件（错误上抛由调用方处置）。
//!
use crate::domain_event::{Attrs, EventRecord, kinds};
use crate::entity::{EntityState, next_timestamp};
use crate::error::{DomainError, DomainResult};
use crate::eventing::EventBus;
use crate::mutator::Mutator;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 批量提交模式的实体封装
pub struct AggregateRoot {
    id: Uuid,
    state: Option<EntityState>,
    pending: Vec<EventRecord>,
    mutator: Arc<Mutator>,
    bus: Arc<EventBus>,
}

impl AggregateRoot {
    /// 以 Created 事件创建聚合（版本 0）；事件进入缓冲，暂不发布
    pub fn create(
        id: Uuid,
        attrs: Attrs,
        mutator: Arc<Mutator>,
        bus: Arc<EventBus>,
    ) -> DomainResult<Self> {
        let record = EventRecord::created(id, attrs);
        let state = mutator.mutate(None, &record)?;
        Ok(Self {
            id,
            state,
            pending: vec![record],
            mutator,
            bus,
        })
    }

    /// 从既有事件序列重建聚合，缓冲为空
    pub fn replay<'a>(
        events: impl IntoIterator<Item = &'a EventRecord>,
        mutator: Arc<Mutator>,
        bus: Arc<EventBus>,
    ) -> DomainResult<Self> {
        let mut events = events.into_iter().peekable();
        let id = match events.peek() {
            Some(first) => first.originator_id(),
            None => {
                return Err(DomainError::InvalidState {
                    reason: "cannot replay an empty history".to_string(),
                });
            }
        };
        let state = mutator.replay(events)?;
        Ok(Self {
            id,
            state,
            pending: Vec::new(),
            mutator,
            bus,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> Option<&EntityState> {
        self.state.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        self.state.is_none()
    }

    /// 自上次提交以来缓冲的事件，版本连续、对订阅方不可见
    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }

    /// 修改命名属性，事件进入缓冲
    pub fn change_attribute(&mut self, name: &str, value: impl Into<Value>) -> DomainResult<()> {
        let state = self.live()?;
        let record = EventRecord::builder()
            .kind(kinds::ATTRIBUTE_CHANGED.to_string())
            .originator_id(state.id())
            .originator_version(state.version().next().value())
            .timestamp(next_timestamp(state))
            .attrs(Attrs::from_entries([
                ("name".to_string(), Value::String(name.to_string())),
                ("value".to_string(), value.into()),
            ]))
            .build();
        self.apply_then_buffer(record)
    }

    /// 触发一条自定义种类事件；种类需已在 `Mutator` 注册
    pub fn trigger(&mut self, kind: impl Into<String>, attrs: Attrs) -> DomainResult<()> {
        let state = self.live()?;
        let record = EventRecord::builder()
            .kind(kind.into())
            .originator_id(state.id())
            .originator_version(state.version().next().value())
            .timestamp(next_timestamp(state))
            .attrs(attrs)
            .build();
        self.apply_then_buffer(record)
    }

    /// 废弃聚合：Discarded 事件进入缓冲，状态立即转为终态
    pub fn discard(&mut self) -> DomainResult<()> {
        let state = self.live()?;
        let record = EventRecord::builder()
            .kind(kinds::DISCARDED.to_string())
            .originator_id(state.id())
            .originator_version(state.version().next().value())
            .timestamp(next_timestamp(state))
            .build();
        self.apply_then_buffer(record)
    }

    /// 提交缓冲：整批一次性交给总线，返回提交的批次
    ///
    /// 缓冲为空时为无操作（不调用总线）。缓冲在发布前整体清空，
    /// 处理器错误上抛后重试提交不会重复投递。
    pub fn commit(&mut self) -> DomainResult<Vec<EventRecord>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let batch = std::mem::take(&mut self.pending);
        debug!(aggregate = %self.id, events = batch.len(), "committing batch");
        self.bus.publish(&batch)?;
        Ok(batch)
    }

    fn live(&self) -> DomainResult<&EntityState> {
        self.state
            .as_ref()
            .ok_or(DomainError::EntityIsDiscarded { id: self.id })
    }

    // 应用失败的命令不进入缓冲，状态与缓冲均保持原样
    fn apply_then_buffer(&mut self, record: EventRecord) -> DomainResult<()> {
        let next = self.mutator.mutate(self.state.as_ref(), &record)?;
        self.state = next;
        self.pending.push(record);
        Ok(())
    }
}
