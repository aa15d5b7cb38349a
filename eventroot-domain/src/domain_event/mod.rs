//! 领域事件（Domain Event）
//!
//! 定义事件的不可变载荷形态：
//! - `EventRecord`：带保留头字段（originator_id / originator_version /
//!   timestamp / event_id）与开放属性集合的事件值对象；
//! - `Attrs`：构造期一次性写入的属性集合，构造后只读；
//! - `kinds`：内建事件种类常量（Created / AttributeChanged / Discarded）。

mod attrs;
mod event_record;

pub mod kinds;

pub use attrs::Attrs;
pub use event_record::EventRecord;
