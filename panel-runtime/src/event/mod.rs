//! # Event 模块
//!
//! 事件总线与参数包。所有组件之间只通过这里通信。

mod bus;
mod message;
mod value;

pub use bus::{Connection, ConnectionHolder, ConnectionId, EventBus};
pub use message::*;
pub use value::{Arguments, FromValue, Value};
