//! 领域层统一错误定义
//!
//! 聚焦事件不变式（不可变性、版本连续性）、变更分发、事件系统与存储边界
//! 的最小必要集合，便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;
use uuid::Uuid;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 事件不变式 ---
    #[error("immutability violation: field={field}")]
    ImmutabilityViolation { field: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: usize, actual: usize },
    #[error("unsupported event kind: {kind}")]
    UnsupportedEventKind { kind: String },
    #[error("entity is discarded: {id}")]
    EntityIsDiscarded { id: Uuid },
    #[error("mismatched originator: expected={expected}, actual={actual}")]
    MismatchedOriginator { expected: Uuid, actual: Uuid },

    // --- 事件系统 ---
    #[error("event bus error: {reason}")]
    EventBus { reason: String },
    #[error("event handler error: handler={handler}, reason={reason}")]
    EventHandler { handler: String, reason: String },

    // --- 存储边界 ---
    #[error("event store error: {reason}")]
    EventStore { reason: String },

    // --- 载荷取值/序列化 ---
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
