//! 事件存储协议与内存实现
//!
use crate::domain_event::EventRecord;
use crate::error::{DomainError, DomainResult};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// 事件存储边界：按实体追加并读取有序历史
pub trait EventStore: Send + Sync {
    /// 追加一个批次。`expected_version` 为调用方认为的流内下一个版本
    /// 位点；与存储当前位点不一致时以 `VersionConflict` 失败。
    fn append(
        &self,
        originator_id: Uuid,
        expected_version: usize,
        events: &[EventRecord],
    ) -> DomainResult<()>;

    /// 读取某实体的全部事件，按版本升序
    fn events(&self, originator_id: Uuid) -> DomainResult<Vec<EventRecord>>;
}

/// 进程内事件存储（测试/示例用）
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<Uuid, Vec<EventRecord>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        originator_id: Uuid,
        expected_version: usize,
        events: &[EventRecord],
    ) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut streams = self.streams.lock().map_err(|_| DomainError::EventStore {
            reason: "store lock poisoned".to_string(),
        })?;
        let stream = streams.entry(originator_id).or_default();

        let next = stream.last().map(|e| e.originator_version() + 1).unwrap_or(0);
        if expected_version != next {
            return Err(DomainError::VersionConflict {
                expected: next,
                actual: expected_version,
            });
        }

        // 批内必须从位点起连续递增
        for (offset, event) in events.iter().enumerate() {
            if event.originator_version() != next + offset {
                return Err(DomainError::InvalidValue {
                    reason: format!(
                        "non-contiguous batch: event at offset {offset} has version {}",
                        event.originator_version()
                    ),
                });
            }
        }

        stream.extend_from_slice(events);
        Ok(())
    }

    fn events(&self, originator_id: Uuid) -> DomainResult<Vec<EventRecord>> {
        let streams = self.streams.lock().map_err(|_| DomainError::EventStore {
            reason: "store lock poisoned".to_string(),
        })?;
        Ok(streams.get(&originator_id).cloned().unwrap_or_default())
    }
}
