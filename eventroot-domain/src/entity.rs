//! 实体（Entity）
//!
//! - `EntityState`：带标识、版本与时间戳的状态容器，唯一合法的状态迁移
//!   入口是 `Mutator` 分发；
//! - `Entity`：状态机 absent → live → discarded(absent) 的命令封装，
//!   命令构造事件、经 `Mutator` 应用后立刻发布到 `EventBus`。
//!
//! 状态实例由持有者独占；`Mutator` 返回新状态而非就地修改共享状态，
//! 应用失败的命令不发布任何事件、不改变实体版本。
//!
use crate::domain_event::{Attrs, EventRecord, kinds};
use crate::error::{DomainError, DomainResult};
use crate::eventing::EventBus;
use crate::mutator::Mutator;
use crate::value_object::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// 实体状态：版本严格等于创建以来已应用的事件数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    id: Uuid,
    version: Version,
    created_on: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    attrs: BTreeMap<String, Value>,
}

impl EntityState {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn attrs(&self) -> &BTreeMap<String, Value> {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    // 以下入口供变更规则构造下一状态使用；实体封装自身只经
    // `Mutator` 分发改变状态

    /// 依据创建事件构造版本 0 的初始状态
    pub fn from_created(event: &EventRecord) -> Self {
        Self {
            id: event.originator_id(),
            version: Version::new(),
            created_on: event.timestamp(),
            last_modified: event.timestamp(),
            attrs: event.attrs().entries().clone(),
        }
    }

    /// 写入命名属性（供变更规则在克隆出的下一状态上使用）
    pub fn set_attr(&mut self, name: &str, value: Value) {
        self.attrs.insert(name.to_string(), value);
    }

    /// 将版本与修改时间推进到事件所在位置
    pub fn advance_to(&mut self, event: &EventRecord) {
        self.version = Version::from_value(event.originator_version());
        self.last_modified = event.timestamp();
    }
}

/// 立即发布模式的实体封装
///
/// 每条命令的三步对调用方原子可见：构造事件（版本为当前版本 + 1）、
/// 经 `Mutator` 应用、成功后单事件批发布。应用失败即命令失败，不发布。
pub struct Entity {
    id: Uuid,
    state: Option<EntityState>,
    mutator: Arc<Mutator>,
    bus: Arc<EventBus>,
}

impl Entity {
    /// 以 Created 事件创建实体（版本 0）并立刻发布该事件
    pub fn create(
        id: Uuid,
        attrs: Attrs,
        mutator: Arc<Mutator>,
        bus: Arc<EventBus>,
    ) -> DomainResult<Self> {
        let record = EventRecord::created(id, attrs);
        let state = mutator.mutate(None, &record)?;
        let entity = Self {
            id,
            state,
            mutator,
            bus,
        };
        entity.bus.publish(std::slice::from_ref(&record))?;
        Ok(entity)
    }

    /// 从既有事件序列重建实体，不产生任何发布
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
            mutator,
            bus,
        })
    }

    /// 实体标识，在创建时赋值且废弃后仍可读
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 当前状态；废弃后为 `None`
    pub fn state(&self) -> Option<&EntityState> {
        self.state.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        self.state.is_none()
    }

    /// 修改命名属性，发布一条 AttributeChanged 事件
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
        self.apply_then_publish(record)
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
        self.apply_then_publish(record)
    }

    /// 废弃实体：发布 Discarded 事件后进入终态
    pub fn discard(&mut self) -> DomainResult<()> {
        let state = self.live()?;
        let record = EventRecord::builder()
            .kind(kinds::DISCARDED.to_string())
            .originator_id(state.id())
            .originator_version(state.version().next().value())
            .timestamp(next_timestamp(state))
            .build();
        self.apply_then_publish(record)
    }

    fn live(&self) -> DomainResult<&EntityState> {
        self.state
            .as_ref()
            .ok_or(DomainError::EntityIsDiscarded { id: self.id })
    }

    // 应用失败时不发布；发布失败由调用方处置，已应用的状态不回滚
    fn apply_then_publish(&mut self, record: EventRecord) -> DomainResult<()> {
        let next = self.mutator.mutate(self.state.as_ref(), &record)?;
        self.state = next;
        self.bus.publish(std::slice::from_ref(&record))
    }
}

/// 同一实体内事件时间戳单调不减
pub(crate) fn next_timestamp(state: &EntityState) -> DateTime<Utc> {
    Utc::now().max(state.last_modified())
}
