//! 事件载荷（EventRecord）
//!
//! 一条已发生事实的不可变值对象。保留头字段构成最小线上兼容模式：
//! `originator_id`、`originator_version`、`timestamp`、`event_id`；
//! 其余数据放在开放属性集合 `Attrs` 中，全部字段在构造时固定。
//! 相等性与哈希完全基于种类与字段值（值对象语义），可安全用作
//! 去重集合或映射键。
//!
use super::{Attrs, kinds};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 领域事件的标准形态
#[derive(Debug, Clone, PartialEq, Eq, Hash, Builder, Serialize, Deserialize)]
pub struct EventRecord {
    /// 事件唯一标识符，用于去重
    #[builder(default = Uuid::new_v4())]
    event_id: Uuid,
    /// 事件种类，用于变更分发
    kind: String,
    /// 事件所属实体的标识
    originator_id: Uuid,
    /// 事件在实体历史中的位置（从 0 开始、连续）
    originator_version: usize,
    /// 事件发生时间，同一实体内单调不减
    #[builder(default = Utc::now())]
    timestamp: DateTime<Utc>,
    /// 开放属性集合，构造后只读
    #[builder(default)]
    attrs: Attrs,
}

impl EventRecord {
    /// 创建事件：作用于不存在的实体，版本固定为 0
    pub fn created(originator_id: Uuid, attrs: Attrs) -> Self {
        Self::builder()
            .kind(kinds::CREATED.to_string())
            .originator_id(originator_id)
            .originator_version(0)
            .attrs(attrs)
            .build()
    }

    /// 属性变更事件，载荷为 `name` 与 `value`
    pub fn attribute_changed(
        originator_id: Uuid,
        originator_version: usize,
        name: &str,
        value: impl Into<Value>,
    ) -> Self {
        let attrs = Attrs::from_entries([
            ("name".to_string(), Value::String(name.to_string())),
            ("value".to_string(), value.into()),
        ]);
        Self::builder()
            .kind(kinds::ATTRIBUTE_CHANGED.to_string())
            .originator_id(originator_id)
            .originator_version(originator_version)
            .attrs(attrs)
            .build()
    }

    /// 废弃事件，载荷为空
    pub fn discarded(originator_id: Uuid, originator_version: usize) -> Self {
        Self::builder()
            .kind(kinds::DISCARDED.to_string())
            .originator_id(originator_id)
            .originator_version(originator_version)
            .build()
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn originator_id(&self) -> Uuid {
        self.originator_id
    }

    pub fn originator_version(&self) -> usize {
        self.originator_version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// 读取单个属性
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}
