//! 端到端演示：命令 → 缓冲 → 按批提交 → 总线 → 存储 → 重放
use anyhow::Result as AnyResult;
use eventroot_domain::aggregate_root::AggregateRoot;
use eventroot_domain::domain_event::{Attrs, EventRecord, kinds};
use eventroot_domain::entity::Entity;
use eventroot_domain::eventing::{EventBus, EventHandler, kind_is, match_all};
use eventroot_domain::mutator::Mutator;
use eventroot_domain::persist::{EventStore, InMemoryEventStore};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// 提交批次原样成为存储的 append 载荷
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

struct AuditLog;

impl EventHandler for AuditLog {
    fn handler_name(&self) -> &str {
        "audit"
    }

    fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()> {
        info!(
            batch = events.len(),
            first_kind = events[0].kind(),
            "audit: batch received"
        );
        Ok(())
    }
}

fn main() -> AnyResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mutator = Arc::new(Mutator::core());
    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(EventBus::new());
    bus.subscribe(
        Arc::new(StoreSubscriber {
            store: store.clone(),
        }),
        match_all(),
    );
    bus.subscribe(Arc::new(AuditLog), match_all());
    bus.subscribe(Arc::new(AuditLog), kind_is(kinds::DISCARDED));

    // --- 聚合根：命令缓冲，提交时整批可见 ---
    let order_id = Uuid::new_v4();
    let mut order = AggregateRoot::create(
        order_id,
        Attrs::new().with("status", "draft")?.with("lines", json!([]))?,
        mutator.clone(),
        bus.clone(),
    )?;
    order.change_attribute("status", "placed")?;
    order.change_attribute("lines", json!(["espresso", "croissant"]))?;

    info!(pending = order.pending().len(), "before commit, bus is silent");
    let committed = order.commit()?;
    info!(committed = committed.len(), "one batch, one notification per handler");

    // --- 普通实体：每条命令即时发布 ---
    let mut user = Entity::create(
        Uuid::new_v4(),
        Attrs::new().with("full_name", "Mrs Boots")?,
        mutator.clone(),
        bus.clone(),
    )?;
    user.change_attribute("full_name", "Mr Boots")?;
    user.discard()?;

    // --- 从存储历史重建聚合 ---
    let history = store.events(order_id)?;
    let replayed = AggregateRoot::replay(&history, mutator, bus)?;
    info!(
        version = replayed.state().map(|s| s.version().value()).unwrap_or(0),
        status = %replayed
            .state()
            .and_then(|s| s.attr("status").cloned())
            .unwrap_or_default(),
        "replayed from store"
    );

    Ok(())
}
