/// 账户聚合示例
/// 展示自定义事件种类的注册、命令缓冲、按批提交到存储与历史重放
use anyhow::Result as AnyResult;
use eventroot_domain::aggregate_root::AggregateRoot;
use eventroot_domain::domain_event::{Attrs, EventRecord};
use eventroot_domain::entity::EntityState;
use eventroot_domain::error::{DomainError, DomainResult};
use eventroot_domain::eventing::{EventBus, EventHandler, match_all};
use eventroot_domain::mutator::Mutator;
use eventroot_domain::persist::{EventStore, InMemoryEventStore};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// 自定义变更规则：Deposited / Withdrawn
// ============================================================================

fn balance_of(state: &EntityState) -> i64 {
    state.attr("balance").and_then(Value::as_i64).unwrap_or(0)
}

fn amount_of(event: &EventRecord) -> DomainResult<i64> {
    event
        .attr("amount")
        .and_then(Value::as_i64)
        .ok_or_else(|| DomainError::InvalidValue {
            reason: "missing amount".to_string(),
        })
}

fn deposited(state: Option<&EntityState>, event: &EventRecord) -> DomainResult<Option<EntityState>> {
    let state = state.ok_or_else(|| DomainError::InvalidState {
        reason: "no live state to mutate".to_string(),
    })?;
    let mut next = state.clone();
    next.set_attr("balance", json!(balance_of(state) + amount_of(event)?));
    next.advance_to(event);
    Ok(Some(next))
}

fn withdrawn(state: Option<&EntityState>, event: &EventRecord) -> DomainResult<Option<EntityState>> {
    let state = state.ok_or_else(|| DomainError::InvalidState {
        reason: "no live state to mutate".to_string(),
    })?;
    let amount = amount_of(event)?;
    if balance_of(state) < amount {
        return Err(DomainError::InvalidState {
            reason: "insufficient funds".to_string(),
        });
    }
    let mut next = state.clone();
    next.set_attr("balance", json!(balance_of(state) - amount));
    next.advance_to(event);
    Ok(Some(next))
}

// ============================================================================
// 存储订阅者：提交批次即 append 载荷
// ============================================================================

struct StoreSubscriber {
    store: Arc<InMemoryEventStore>,
}

impl EventHandler for StoreSubscriber {
    fn handler_name(&self) -> &str {
        "store"
    }

    fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()> {
        let first = &events[0];
        self.store
            .append(first.originator_id(), first.originator_version(), events)?;
        Ok(())
    }
}

fn main() -> AnyResult<()> {
    let mut mutator = Mutator::core();
    mutator.register("Deposited", deposited);
    mutator.register("Withdrawn", withdrawn);
    let mutator = Arc::new(mutator);

    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(EventBus::new());
    bus.subscribe(
        Arc::new(StoreSubscriber {
            store: store.clone(),
        }),
        match_all(),
    );

    // 开户并执行一组命令，作为一个批次提交
    let id = Uuid::new_v4();
    let mut account = AggregateRoot::create(
        id,
        Attrs::new().with("owner", "alice")?.with("balance", 0)?,
        mutator.clone(),
        bus.clone(),
    )?;
    account.trigger("Deposited", Attrs::new().with("amount", 100)?)?;
    account.trigger("Deposited", Attrs::new().with("amount", 50)?)?;
    account.trigger("Withdrawn", Attrs::new().with("amount", 30)?)?;

    println!("pending before commit: {}", account.pending().len());
    let committed = account.commit()?;
    println!("committed {} events in one batch", committed.len());

    // 余额不足的命令失败，不进入缓冲
    let err = account
        .trigger("Withdrawn", Attrs::new().with("amount", 1000)?)
        .unwrap_err();
    println!("rejected command: {err}");
    assert!(account.pending().is_empty());

    // 从存储的历史重建出相同的状态
    let history = store.events(id)?;
    let replayed = AggregateRoot::replay(&history, mutator, bus)?;
    println!(
        "replayed balance: {} (version {})",
        replayed
            .state()
            .map(|s| balance_of(s))
            .unwrap_or_default(),
        replayed.state().map(|s| s.version().value()).unwrap_or(0),
    );

    Ok(())
}
