//! 事件溯源聚合内核（eventroot-domain）
//!
//! 以不可变领域事件为唯一事实来源的实体建模构件：
//! - 事件载荷与不可变属性集合（`domain_event`）
//! - 事件种类到变更规则的显式分发（`mutator`）
//! - 版本化实体与命令协议（`entity`）
//! - 缓冲事件并按批原子提交的聚合根（`aggregate_root`）
//! - 进程内同步发布/订阅（`eventing`）
//! - 与外部事件存储协作的边界协议（`persist`）
//!
//! 本 crate 只定义单写者、单进程内的正确性不变式：版本单调、历史不可变、
//! 一条命令的多个事件全有或全无地对订阅方可见。持久化与跨进程传输由
//! 上层基础设施适配实现。
//!
//! 典型用法：
//! 1. 在装配端创建 `EventBus` 与 `Mutator::core()`，按需 `register` 自定义种类；
//! 2. 通过 `Entity`（即时发布）或 `AggregateRoot`（批量提交）执行命令；
//! 3. 订阅总线，将提交批次交给 `persist::EventStore` 或其他消费方；
//! 4. 以 `Mutator::replay` 或 `AggregateRoot::replay` 从历史重建状态。
//!
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod mutator;
pub mod persist;
pub mod value_object;
