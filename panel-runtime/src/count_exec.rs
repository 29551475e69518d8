//! # CountExec 模块
//!
//! 按累计经过时间触发的一次性回调队列。每个 Task 持有一个，由 Task 的每帧更新驱动。
//!
//! 触发规则：
//! - 每次 `update(dt)` 先把所有条目的剩余时间减去 `dt`
//! - 剩余时间 ≤ 0 的条目在本次调用内各触发一次，按「到期时刻」先后排序，同时到期的按添加顺序
//! - 触发过程中新添加的条目最早在下一次 `update` 才会触发
//!
//! 调用回调时不持有内部借用，回调里可以再 `add`，也可以再次调用 `update`。

use std::cell::{Cell, RefCell};
use std::fmt;

/// 条目 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecId(u64);

struct Entry {
    id: ExecId,
    remaining: f64,
    callback: Box<dyn FnOnce()>,
}

/// 定时回调队列
#[derive(Default)]
pub struct CountExec {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for CountExec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountExec")
            .field("pending", &self.len())
            .finish()
    }
}

impl CountExec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在 `delay` 秒后执行一次 `callback`
    pub fn add(&self, delay: f64, callback: impl FnOnce() + 'static) -> ExecId {
        let id = ExecId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.entries.borrow_mut().push(Entry {
            id,
            remaining: delay,
            callback: Box::new(callback),
        });
        id
    }

    /// 取消尚未触发的条目；已触发或不存在时什么也不做
    pub fn cancel(&self, id: ExecId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// 推进时间并触发到期的回调
    pub fn update(&self, delta_time: f64) {
        let mut fired = {
            let mut entries = self.entries.borrow_mut();
            let (fired, pending): (Vec<Entry>, Vec<Entry>) =
                std::mem::take(&mut *entries)
                    .into_iter()
                    .partition(|e| e.remaining <= delta_time);

            *entries = pending;
            for entry in entries.iter_mut() {
                entry.remaining -= delta_time;
            }
            fired
        };

        if fired.is_empty() {
            return;
        }

        // 稳定排序：同时到期的保持添加顺序
        fired.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));

        for entry in fired {
            (entry.callback)();
        }
    }

    /// 未触发的条目数
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// 丢弃全部未触发的条目
    pub fn clear(&self) {
        // 先取出再析构，回调闭包的析构可能访问本队列
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> impl FnOnce() + 'static {
        let log = Rc::clone(log);
        move || log.borrow_mut().push(name)
    }

    #[test]
    fn test_fires_after_delay() {
        let exec = CountExec::new();
        let log = recorder();
        exec.add(1.0, push(&log, "a"));

        exec.update(0.5);
        assert!(log.borrow().is_empty());
        exec.update(0.5);
        assert_eq!(*log.borrow(), vec!["a"]);

        // 只触发一次
        exec.update(1.0);
        assert_eq!(log.borrow().len(), 1);
        assert!(exec.is_empty());
    }

    #[test]
    fn test_order_by_elapsed_then_insertion() {
        let exec = CountExec::new();
        let log = recorder();
        exec.add(1.0, push(&log, "A"));
        exec.add(1.0, push(&log, "B"));
        exec.add(0.5, push(&log, "C"));

        exec.update(1.0);
        assert_eq!(*log.borrow(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_added_during_update_waits_for_next_pass() {
        let exec = Rc::new(CountExec::new());
        let log = recorder();

        let e = Rc::clone(&exec);
        let l = Rc::clone(&log);
        exec.add(0.1, move || {
            l.borrow_mut().push("outer");
            e.add(0.0, push(&l, "inner"));
        });

        exec.update(1.0);
        assert_eq!(*log.borrow(), vec!["outer"]);

        exec.update(0.0);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_reentrant_update_from_callback() {
        let exec = Rc::new(CountExec::new());
        let log = recorder();

        exec.add(5.0, push(&log, "late"));
        let e = Rc::clone(&exec);
        let l = Rc::clone(&log);
        exec.add(0.1, move || {
            l.borrow_mut().push("skip");
            // 快进
            e.update(10.0);
        });

        exec.update(0.1);
        assert_eq!(*log.borrow(), vec!["skip", "late"]);
    }

    #[test]
    fn test_cancel() {
        let exec = CountExec::new();
        let log = recorder();
        let id = exec.add(1.0, push(&log, "a"));

        assert!(exec.cancel(id));
        exec.update(2.0);
        assert!(log.borrow().is_empty());

        // 已经触发的条目取消为空操作
        let id = exec.add(0.0, push(&log, "b"));
        exec.update(0.0);
        assert!(!exec.cancel(id));
        assert_eq!(*log.borrow(), vec!["b"]);
    }
}
