//! # Bus 模块
//!
//! 同步、进程内、按字符串事件名分发的发布/订阅通道。
//!
//! 分发时先对订阅者做快照，再在调用每个处理器之前重新检查其是否仍然存活：
//! - 分发过程中新增的订阅不会收到当前这次事件
//! - 分发过程中断开的订阅不会再被调用
//!
//! 调用处理器时不持有任何内部借用，处理器可以自由地再次发信号、订阅或断开。

use slotmap::{SlotMap, new_key_type};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;
use std::rc::{Rc, Weak};
use tracing::trace;

use super::message::Message;
use super::value::Arguments;
use crate::error::OrViolation;

new_key_type! {
    /// 订阅 ID
    pub struct ConnectionId;
}

type Handler = Rc<dyn Fn(&Connection, &Arguments)>;

struct Slot {
    event: String,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    slots: RefCell<SlotMap<ConnectionId, Slot>>,
    by_event: RefCell<HashMap<String, Vec<ConnectionId>>>,
    /// 正在分发的嵌套深度（诊断用）
    depth: Cell<u32>,
}

impl BusInner {
    fn remove(&self, id: ConnectionId) -> bool {
        let Some(slot) = self.slots.borrow_mut().remove(id) else {
            return false;
        };

        let mut by_event = self.by_event.borrow_mut();
        if let Some(ids) = by_event.get_mut(&slot.event) {
            ids.retain(|x| *x != id);
            if ids.is_empty() {
                by_event.remove(&slot.event);
            }
        }
        true
    }
}

/// 事件总线
///
/// 廉价克隆的句柄，由 Core 持有根生命周期，注入到每个 Task 和 Canvas。
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件
    pub fn connect<F>(&self, event: impl Into<String>, handler: F) -> Connection
    where
        F: Fn(&Connection, &Arguments) + 'static,
    {
        let event = event.into();
        let id = self.inner.slots.borrow_mut().insert(Slot {
            event: event.clone(),
            handler: Rc::new(handler),
        });
        self.inner
            .by_event
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(id);

        Connection {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// 订阅类型化消息
    ///
    /// 参数解码失败属于契约违反。
    pub fn subscribe<M, F>(&self, handler: F) -> Connection
    where
        M: Message,
        F: Fn(&Connection, M) + 'static,
    {
        self.connect(M::NAME, move |connection, args| {
            let message = M::from_arguments(args)
                .map_err(|e| e.in_event(M::NAME))
                .or_violation();
            handler(connection, message);
        })
    }

    /// 发送事件
    pub fn signal(&self, event: &str, args: &Arguments) {
        let snapshot = match self.inner.by_event.borrow().get(event) {
            Some(ids) => ids.clone(),
            None => return,
        };

        let depth = self.inner.depth.get() + 1;
        self.inner.depth.set(depth);
        trace!(event, depth, handlers = snapshot.len(), "signal");

        for id in snapshot {
            // 先前的处理器可能已经断开了这个订阅
            let handler = match self.inner.slots.borrow().get(id) {
                Some(slot) => Rc::clone(&slot.handler),
                None => continue,
            };

            let connection = Connection {
                bus: Rc::downgrade(&self.inner),
                id,
            };
            handler(&connection, args);
        }

        self.inner.depth.set(depth - 1);
    }

    /// 发送类型化消息
    pub fn emit<M: Message>(&self, message: &M) {
        self.signal(M::NAME, &message.to_arguments());
    }

    /// 发送无参数事件
    pub fn notify(&self, event: &str) {
        self.signal(event, &Arguments::new());
    }

    /// 当前订阅总数
    pub fn connection_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    /// 某个事件的订阅数
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner
            .by_event
            .borrow()
            .get(event)
            .map_or(0, |ids| ids.len())
    }
}

/// 一条订阅
///
/// 断开是幂等的；总线先于订阅被销毁时断开为空操作。
#[derive(Clone)]
pub struct Connection {
    bus: Weak<BusInner>,
    id: ConnectionId,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// 断开订阅
    pub fn disconnect(&self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }

    /// 是否仍在订阅中
    pub fn is_connected(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.slots.borrow().contains_key(self.id))
    }
}

/// 订阅集合
///
/// 析构时统一断开所持有的订阅。通过 `&self` 添加，处理器内部也能追加订阅。
#[derive(Default)]
pub struct ConnectionHolder {
    connections: RefCell<Vec<Connection>>,
}

impl fmt::Debug for ConnectionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHolder")
            .field("connections", &self.connections.borrow().len())
            .finish()
    }
}

impl ConnectionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 持有一条订阅
    pub fn add(&self, connection: Connection) {
        let mut connections = self.connections.borrow_mut();
        // 顺便清理已经自行断开的订阅
        connections.retain(Connection::is_connected);
        connections.push(connection);
    }

    /// 断开全部订阅
    pub fn disconnect_all(&self) {
        let connections = std::mem::take(&mut *self.connections.borrow_mut());
        for connection in connections {
            connection.disconnect();
        }
    }

    /// 仍然存活的订阅数
    pub fn len(&self) -> usize {
        self.connections
            .borrow()
            .iter()
            .filter(|c| c.is_connected())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AddAssign<Connection> for ConnectionHolder {
    fn add_assign(&mut self, connection: Connection) {
        self.add(connection);
    }
}

impl Drop for ConnectionHolder {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&Connection, &Arguments) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move |_: &Connection, _: &Arguments| c.set(c.get() + 1))
    }

    #[test]
    fn test_signal_reaches_subscribers_in_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let _a = bus.connect("ping", move |_, _| l.borrow_mut().push("a"));
        let l = Rc::clone(&log);
        let _b = bus.connect("ping", move |_, _| l.borrow_mut().push("b"));
        let l = Rc::clone(&log);
        let _c = bus.connect("pong", move |_, _| l.borrow_mut().push("c"));

        bus.notify("ping");
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_self_disconnect_during_dispatch() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        let _conn = bus.connect("tap", move |connection, _| {
            c.set(c.get() + 1);
            connection.disconnect();
        });

        bus.notify("tap");
        bus.notify("tap");
        assert_eq!(count.get(), 1);
        assert_eq!(bus.subscriber_count("tap"), 0);
    }

    #[test]
    fn test_disconnected_sibling_not_invoked_in_same_dispatch() {
        let bus = EventBus::new();
        let (count, handler) = counter();

        let victim: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));
        let v = Rc::clone(&victim);
        let _killer = bus.connect("tap", move |_, _| {
            if let Some(c) = v.borrow().as_ref() {
                c.disconnect();
            }
        });
        *victim.borrow_mut() = Some(bus.connect("tap", handler));

        bus.notify("tap");
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_connect_during_dispatch_waits_for_next_signal() {
        let bus = EventBus::new();
        let (count, handler) = counter();
        let handler = Rc::new(handler);
        let holder = Rc::new(ConnectionHolder::new());

        let b = bus.clone();
        let h = Rc::clone(&holder);
        let _outer = bus.connect("tap", move |connection, _| {
            let handler = Rc::clone(&handler);
            h.add(b.connect("tap", move |c, a| (*handler)(c, a)));
            connection.disconnect();
        });

        bus.notify("tap");
        assert_eq!(count.get(), 0);
        bus.notify("tap");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_holder_disconnects_on_drop() {
        let bus = EventBus::new();
        let (count, handler) = counter();

        {
            let mut holder = ConnectionHolder::new();
            holder += bus.connect("tap", handler);
            bus.notify("tap");
            assert_eq!(holder.len(), 1);
        }

        bus.notify("tap");
        assert_eq!(count.get(), 1);
        assert_eq!(bus.connection_count(), 0);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let bus = EventBus::new();
        let conn = bus.connect("tap", |_, _| {});
        conn.disconnect();
        conn.disconnect();
        assert!(!conn.is_connected());

        // 总线销毁后断开也安全
        let conn = bus.connect("tap", |_, _| {});
        drop(bus);
        conn.disconnect();
        assert!(!conn.is_connected());
    }
}
