//! 存储边界（persist）
//!
//! 只定义与外部事件存储协作的边界协议与一个内存实现：
//! - `EventStore::append(originator_id, expected_version, events)`，
//!   冲突以 `VersionConflict` 返回——聚合的 `pending` 批次与
//!   `originator_version` 序列正是这个调用期望的载荷；
//! - `InMemoryEventStore`：测试与示例用的进程内实现。
//!
//! 原子性与持久性由具体存储负责，本 crate 只负责产出版本连续、
//! 不可变、有序的批次。

mod event_store;

pub use event_store::{EventStore, InMemoryEventStore};
