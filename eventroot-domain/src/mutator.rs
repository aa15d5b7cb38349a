//! 变更分发（Mutator）
//!
//! 将（先前状态, 事件）映射为下一状态的显式分发表：
//! - 按事件种类多态分发，每个种类恰好对应一条变更规则；
//! - 新增种类只需注册新规则，无需改动既有规则（开放扩展）；
//! - 未注册种类以 `UnsupportedEventKind` 失败；
//! - 任何规则执行前，统一校验乐观并发前置条件：事件的
//!   `originator_version` 必须等于当前版本 + 1（对不存在的状态为 0），
//!   否则以 `VersionConflict` 失败——这是重放保持有序与确定性的契约。
//!
use crate::domain_event::{EventRecord, kinds};
use crate::entity::EntityState;
use crate::error::{DomainError, DomainResult};
use serde_json::Value;
use std::collections::HashMap;

/// 变更规则：由分发器保证版本与归属前置条件后调用
pub type MutatorRule =
    Box<dyn Fn(Option<&EntityState>, &EventRecord) -> DomainResult<Option<EntityState>> + Send + Sync>;

/// 事件种类到变更规则的分发表
pub struct Mutator {
    rules: HashMap<String, MutatorRule>,
}

impl Default for Mutator {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator {
    /// 空分发表，不含任何规则
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// 含内建规则（Created / AttributeChanged / Discarded）的分发表
    pub fn core() -> Self {
        let mut mutator = Self::new();
        mutator.register(kinds::CREATED, created);
        mutator.register(kinds::ATTRIBUTE_CHANGED, attribute_changed);
        mutator.register(kinds::DISCARDED, discarded);
        mutator
    }

    /// 注册（或覆盖）某一种类的变更规则
    pub fn register<F>(&mut self, kind: impl Into<String>, rule: F)
    where
        F: Fn(Option<&EntityState>, &EventRecord) -> DomainResult<Option<EntityState>>
            + Send
            + Sync
            + 'static,
    {
        self.rules.insert(kind.into(), Box::new(rule));
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }

    /// 分发一个事件：返回下一状态（`None` 表示实体已不存在）
    ///
    /// 前置校验顺序：种类已注册 → 事件归属于该实体 → 版本连续。
    /// 任一失败都不调用规则，调用方状态保持原样。
    pub fn mutate(
        &self,
        state: Option<&EntityState>,
        event: &EventRecord,
    ) -> DomainResult<Option<EntityState>> {
        let rule = self
            .rules
            .get(event.kind())
            .ok_or_else(|| DomainError::UnsupportedEventKind {
                kind: event.kind().to_string(),
            })?;

        if let Some(state) = state {
            if state.id() != event.originator_id() {
                return Err(DomainError::MismatchedOriginator {
                    expected: state.id(),
                    actual: event.originator_id(),
                });
            }
        }

        let expected = state.map(|s| s.version().next()).unwrap_or_default();
        if event.originator_version() != expected.value() {
            return Err(DomainError::VersionConflict {
                expected: expected.value(),
                actual: event.originator_version(),
            });
        }

        rule(state, event)
    }

    /// 按序重放事件，从不存在的状态折叠出当前状态
    pub fn replay<'a>(
        &self,
        events: impl IntoIterator<Item = &'a EventRecord>,
    ) -> DomainResult<Option<EntityState>> {
        let mut state: Option<EntityState> = None;
        let mut count = 0usize;
        for event in events {
            state = self.mutate(state.as_ref(), event)?;
            count += 1;
        }
        tracing::debug!(events = count, "replayed entity history");
        Ok(state)
    }
}

// ---- 内建规则 ----

// Created：版本前置已保证 originator_version == 0 且先前状态不存在
fn created(_state: Option<&EntityState>, event: &EventRecord) -> DomainResult<Option<EntityState>> {
    Ok(Some(EntityState::from_created(event)))
}

fn attribute_changed(
    state: Option<&EntityState>,
    event: &EventRecord,
) -> DomainResult<Option<EntityState>> {
    let state = require_live(state)?;
    let name = event
        .attr("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::InvalidValue {
            reason: "attribute change event carries no string `name`".to_string(),
        })?;
    let value = event
        .attr("value")
        .cloned()
        .ok_or_else(|| DomainError::InvalidValue {
            reason: "attribute change event carries no `value`".to_string(),
        })?;

    let mut next = state.clone();
    next.set_attr(name, value);
    next.advance_to(event);
    Ok(Some(next))
}

fn discarded(
    state: Option<&EntityState>,
    _event: &EventRecord,
) -> DomainResult<Option<EntityState>> {
    require_live(state)?;
    Ok(None)
}

// 非创建类规则要求存在先前状态（版本 0 的非创建事件会落到这里）
fn require_live(state: Option<&EntityState>) -> DomainResult<&EntityState> {
    state.ok_or_else(|| DomainError::InvalidState {
        reason: "no live state to mutate".to_string(),
    })
}
