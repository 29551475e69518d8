//! # Panel Runtime
//!
//! 面板拼图游戏的画面流程核心库。
//!
//! ## 架构概述
//!
//! `panel-runtime` 不做渲染、音频与文件 IO，它们都在宿主层（Host）：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── "update" / 触摸 / 玩法事件 ──►│ EventBus
//!   │                                   │   ├─ Core（画面迁移、存档）
//!   │                                   │   └─ TaskContainer（各画面）
//!   │◄─── Drawer 调用 / "Audio:*" ──────│
//! ```
//!
//! 画面之间不互相引用：一个画面结束时发出 `"X:Finished"` 之类的事件，
//! [`Core`] 收到后把下一个画面放进 [`TaskContainer`]。
//!
//! ## 核心类型
//!
//! - [`EventBus`]：单线程事件总线，所有组件之间唯一的通信方式
//! - [`CountExec`]：按帧推进的延时回调
//! - [`Canvas`]：声明式 Widget 树与 Tween
//! - [`Task`] / [`TaskContainer`]：每帧更新的画面与控制器
//! - [`Archive`]：游戏记录
//! - [`Core`]：根对象
//!
//! ## 使用示例
//!
//! ```ignore
//! use panel_runtime::{Core, EventBus, GameParams, MemoryStore};
//!
//! let params = Rc::new(GameParams::builtin()?);
//! let bus = EventBus::new();
//! let core = Core::new(params, &bus, Box::new(MemoryStore::new()));
//!
//! loop {
//!     core.update(current_time, delta_time);
//!     core.draw(&mut drawer);
//! }
//! ```

pub mod archive;
pub mod core;
pub mod count_exec;
pub mod error;
pub mod event;
pub mod params;
pub mod screens;
pub mod task;
pub mod ui;

// 重导出核心类型
pub use archive::{
    Archive, ArchiveData, ArchiveStore, ArchiveView, GameRecord, MemoryStore, RANKING_SIZE, Record,
    Score,
};
pub use crate::core::Core;
pub use count_exec::{CountExec, ExecId};
pub use error::{
    ArchiveError, EventError, OrViolation, ParamsError, RuntimeError, RuntimeResult, UiError,
    contract_violation,
};
pub use event::{Arguments, Connection, ConnectionHolder, EventBus, Message, Value};
pub use params::GameParams;
pub use task::{Task, TaskContainer};
pub use ui::{Canvas, Color, Drawer, RecordingDrawer, Rect, Vec2, Vec3};
