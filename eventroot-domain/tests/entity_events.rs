use eventroot_domain::domain_event::{Attrs, EventRecord, kinds};
use eventroot_domain::entity::Entity;
use eventroot_domain::error::DomainError;
use eventroot_domain::eventing::{EventBus, EventHandler, match_all};
use eventroot_domain::mutator::Mutator;
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct Recording {
    batches: Mutex<Vec<Vec<EventRecord>>>,
}

impl Recording {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
        })
    }

    fn batches(&self) -> Vec<Vec<EventRecord>> {
        self.batches.lock().unwrap().clone()
    }
}

impl EventHandler for Recording {
    fn handler_name(&self) -> &str {
        "recording"
    }

    fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(events.to_vec());
        Ok(())
    }
}

fn fixture() -> (Arc<Mutator>, Arc<EventBus>, Arc<Recording>) {
    let bus = Arc::new(EventBus::new());
    let recording = Recording::new();
    bus.subscribe(recording.clone(), match_all());
    (Arc::new(Mutator::core()), bus, recording)
}

// 普通实体：创建 + 一次属性变更，共两次总线通知
#[test]
fn entity_publishes_each_command_immediately() {
    let (mutator, bus, recording) = fixture();

    let mut user = Entity::create(
        Uuid::new_v4(),
        Attrs::new().with("full_name", "Mrs Boots").unwrap(),
        mutator,
        bus,
    )
    .unwrap();
    assert_eq!(
        user.state().unwrap().attr("full_name"),
        Some(&json!("Mrs Boots"))
    );

    user.change_attribute("full_name", "Mr Boots").unwrap();
    assert_eq!(
        user.state().unwrap().attr("full_name"),
        Some(&json!("Mr Boots"))
    );
    assert_eq!(user.state().unwrap().version().value(), 1);

    let batches = recording.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].kind(), kinds::CREATED);
    assert_eq!(batches[1][0].kind(), kinds::ATTRIBUTE_CHANGED);
    assert_eq!(*batches[1][0].attr("value").unwrap(), "Mr Boots");
}

#[test]
fn discard_is_terminal() {
    let (mutator, bus, recording) = fixture();
    let id = Uuid::new_v4();

    let mut user = Entity::create(id, Attrs::new(), mutator, bus).unwrap();
    user.discard().unwrap();
    assert!(user.is_discarded());
    assert!(user.state().is_none());

    // 废弃后的一切命令都被拒绝，且不再产生通知
    let err = user.change_attribute("full_name", "x").unwrap_err();
    assert!(matches!(
        err,
        DomainError::EntityIsDiscarded { id: got } if got == id
    ));
    assert!(user.discard().is_err());
    assert_eq!(recording.batches().len(), 2);
}

// 应用失败的命令不得发布事件，实体保持原版本
#[test]
fn failed_apply_publishes_nothing() {
    let (mutator, bus, recording) = fixture();

    let mut user = Entity::create(Uuid::new_v4(), Attrs::new(), mutator, bus).unwrap();
    let err = user.trigger("Renamed", Attrs::new()).unwrap_err();
    assert!(matches!(err, DomainError::UnsupportedEventKind { .. }));

    assert_eq!(user.state().unwrap().version().value(), 0);
    assert_eq!(recording.batches().len(), 1);
}

// 同一实体的事件时间戳单调不减
#[test]
fn timestamps_never_regress() {
    let (mutator, bus, recording) = fixture();

    let mut user = Entity::create(Uuid::new_v4(), Attrs::new(), mutator, bus).unwrap();
    user.change_attribute("a", 1).unwrap();
    user.change_attribute("b", 2).unwrap();

    let batches = recording.batches();
    let stamps: Vec<_> = batches.iter().map(|b| b[0].timestamp()).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn replay_reconstructs_entity_without_publishing() {
    let (mutator, bus, recording) = fixture();
    let id = Uuid::new_v4();

    let history = vec![
        EventRecord::created(id, Attrs::new().with("full_name", "Mrs Boots").unwrap()),
        EventRecord::attribute_changed(id, 1, "full_name", "Mr Boots"),
    ];
    let user = Entity::replay(&history, mutator, bus).unwrap();

    assert_eq!(user.id(), id);
    assert_eq!(user.state().unwrap().version().value(), 1);
    assert_eq!(
        user.state().unwrap().attr("full_name"),
        Some(&json!("Mr Boots"))
    );
    assert!(recording.batches().is_empty());
}
