//! # Task 模块
//!
//! 每帧更新的独立单元（一个画面或控制器）与按顺序持有它们的容器。
//!
//! Task 之间互不引用，只通过事件总线通信。

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use tracing::debug;

use crate::ui::Drawer;

/// 每帧更新的单元
pub trait Task: Any {
    /// 名称（日志与诊断用）
    fn name(&self) -> &'static str;

    /// 每帧更新，返回是否继续存活
    fn update(&mut self, current_time: f64, delta_time: f64) -> bool;

    /// 绘制（默认不绘制）
    fn draw(&self, _drawer: &mut dyn Drawer) {}

    fn as_any(&self) -> &dyn Any;
}

/// Task 容器
///
/// - 添加顺序即更新与绘制顺序，后添加的画在上层
/// - 更新过程中添加的 Task 进入等待队列，下一帧才参与更新
/// - 报告不再存活的 Task 在本次更新结束时移除
#[derive(Default)]
pub struct TaskContainer {
    tasks: RefCell<Vec<Box<dyn Task>>>,
    pending: RefCell<Vec<Box<dyn Task>>>,
}

impl fmt::Debug for TaskContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContainer")
            .field("tasks", &self.task_names())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl TaskContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 Task（从下一次更新开始参与）
    pub fn push_back(&self, task: Box<dyn Task>) {
        debug!(task = task.name(), "Task 入队");
        self.pending.borrow_mut().push(task);
    }

    /// 更新所有存活的 Task
    pub fn update(&self, current_time: f64, delta_time: f64) {
        // 帧外入队的 Task 从本帧开始更新
        self.flush_pending();

        // 取出后再更新，Task 内部触发的事件可以安全地访问本容器
        let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        tasks.retain_mut(|task| {
            let alive = task.update(current_time, delta_time);
            if !alive {
                debug!(task = task.name(), "Task 结束");
            }
            alive
        });

        {
            let mut current = self.tasks.borrow_mut();
            // 更新期间 current 一直为空，这里只是放回
            tasks.append(&mut *current);
            *current = tasks;
        }

        self.flush_pending();
    }

    fn flush_pending(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() {
            return;
        }
        self.tasks.borrow_mut().extend(pending);
    }

    /// 按顺序绘制
    pub fn draw(&self, drawer: &mut dyn Drawer) {
        for task in self.tasks.borrow().iter() {
            task.draw(drawer);
        }
    }

    /// 存活的 Task 数（不含等待队列）
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// 等待队列中的 Task 数
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// 存活 Task 的名称（按更新顺序）
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.borrow().iter().map(|t| t.name()).collect()
    }

    /// 是否存在某种 Task
    pub fn contains<T: Task>(&self) -> bool {
        self.tasks
            .borrow()
            .iter()
            .any(|t| t.as_any().is::<T>())
    }

    /// 检查第一个 `T` 类型的 Task
    pub fn inspect<T: Task, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let tasks = self.tasks.borrow();
        tasks
            .iter()
            .find_map(|t| t.as_any().downcast_ref::<T>())
            .map(f)
    }
}
