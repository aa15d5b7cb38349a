//! 事件属性集合（Attrs）
//!
//! 事件载荷的开放字段部分：按名称索引、构造期一次写入、构造后只读。
//! 对已存在字段或保留头字段名的再次写入，以
//! `DomainError::ImmutabilityViolation` 失败且不改变集合内容。
//!
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 保留头字段名，属性集合内禁止出现
const RESERVED: [&str; 5] = [
    "event_id",
    "kind",
    "originator_id",
    "originator_version",
    "timestamp",
];

/// 事件属性集合，写入仅允许一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, Value>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个属性。字段已存在或与保留头字段同名时返回
    /// `ImmutabilityViolation`，集合保持原状。
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> DomainResult<()> {
        let name = name.into();
        if RESERVED.contains(&name.as_str()) || self.0.contains_key(&name) {
            return Err(DomainError::ImmutabilityViolation { field: name });
        }
        self.0.insert(name, value.into());
        Ok(())
    }

    /// 链式写入，便于一次性构造属性集合
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> DomainResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    // 内建构造器使用的内部入口，键由调用方保证合法
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get() {
        let mut attrs = Attrs::new();
        attrs.set("full_name", "Mrs Boots").unwrap();
        assert_eq!(attrs.get("full_name"), Some(&json!("Mrs Boots")));
        assert_eq!(attrs.len(), 1);
    }

    // 已存在字段的再次写入必须失败，且旧值保持不变
    #[test]
    fn rewrite_fails_with_immutability_violation() {
        let mut attrs = Attrs::new().with("full_name", "Mrs Boots").unwrap();

        let err = attrs.set("full_name", "Mr Boots").unwrap_err();
        assert!(matches!(
            err,
            DomainError::ImmutabilityViolation { ref field } if field == "full_name"
        ));
        assert_eq!(attrs.get("full_name"), Some(&json!("Mrs Boots")));
    }

    // 保留头字段名不允许进入属性集合
    #[test]
    fn reserved_names_rejected() {
        for name in [
            "event_id",
            "kind",
            "originator_id",
            "originator_version",
            "timestamp",
        ] {
            let err = Attrs::new().with(name, 1).unwrap_err();
            assert!(matches!(err, DomainError::ImmutabilityViolation { .. }));
        }
    }

    #[test]
    fn serde_transparent() {
        let attrs = Attrs::new()
            .with("a", 1)
            .unwrap()
            .with("b", "two")
            .unwrap();

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"a":1,"b":"two"}"#);

        let back: Attrs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }
}
