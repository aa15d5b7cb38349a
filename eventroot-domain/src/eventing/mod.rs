//! 事件子系统（eventing）
//!
//! 进程内同步发布/订阅：
//! - `EventBus`：显式持有的订阅登记表与批量投递；
//! - `EventHandler`：消费一批事件的处理逻辑与名称元信息；
//! - `Predicate` 与 `match_all` / `kind_is`：订阅过滤。
//!
//! 总线实例由装配端创建并以引用传递给发布/订阅方，不做进程级单例。
//! 投递为同步调用，无内部并行与协作式让出。

pub mod bus;
pub mod handler;

pub use bus::EventBus;
pub use handler::{EventHandler, Predicate, kind_is, match_all};
