//! 内建事件种类常量
//!
//! 自定义种类可为任意非空字符串，需在 `Mutator` 上注册对应的变更规则。

/// 创建事件：作用于不存在的实体，版本固定为 0
pub const CREATED: &str = "Created";

/// 属性变更事件：载荷携带 `name` 与 `value`
pub const ATTRIBUTE_CHANGED: &str = "AttributeChanged";

/// 废弃事件：实体进入终态，此后拒绝一切命令
pub const DISCARDED: &str = "Discarded";
