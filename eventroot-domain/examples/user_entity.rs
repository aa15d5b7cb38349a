/// 普通实体示例
/// 每条命令即时发布：创建、两次属性变更、废弃，共四次总线通知
use anyhow::Result as AnyResult;
use eventroot_domain::domain_event::{Attrs, EventRecord};
use eventroot_domain::entity::Entity;
use eventroot_domain::eventing::{EventBus, EventHandler, kind_is, match_all};
use eventroot_domain::mutator::Mutator;
use std::sync::Arc;
use uuid::Uuid;

struct Printer;

impl EventHandler for Printer {
    fn handler_name(&self) -> &str {
        "printer"
    }

    fn handle(&self, events: &[EventRecord]) -> anyhow::Result<()> {
        for event in events {
            println!(
                "  [{}] {} v{}",
                self.handler_name(),
                event.kind(),
                event.originator_version()
            );
        }
        Ok(())
    }
}

struct DiscardWatch;

impl EventHandler for DiscardWatch {
    fn handler_name(&self) -> &str {
        "discard-watch"
    }

    fn handle(&self, _events: &[EventRecord]) -> anyhow::Result<()> {
        println!("  [discard-watch] entity left the model");
        Ok(())
    }
}

fn main() -> AnyResult<()> {
    let bus = Arc::new(EventBus::new());
    bus.subscribe(Arc::new(Printer), match_all());
    bus.subscribe(Arc::new(DiscardWatch), kind_is("Discarded"));

    let mut user = Entity::create(
        Uuid::new_v4(),
        Attrs::new().with("full_name", "Mrs Boots")?,
        Arc::new(Mutator::core()),
        bus,
    )?;

    user.change_attribute("full_name", "Mr Boots")?;
    user.change_attribute("street", "Fish Lane")?;

    println!(
        "user is at version {}",
        user.state().map(|s| s.version().value()).unwrap_or(0)
    );

    user.discard()?;
    println!("discarded: {}", user.is_discarded());

    Ok(())
}
