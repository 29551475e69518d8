//! # Screens 模块
//!
//! 各个画面与后台控制器的 Task 实现。
//!
//! ## 结构
//!
//! 每个画面是 `Rc<XxxInner>` 的薄包装：
//! - 内部状态放在 `Inner` 里，用 `Cell`/`RefCell` 修改
//! - 事件处理器与定时回调只捕获 `Weak<XxxInner>`，画面结束后自然失效
//! - 画面之间不互相引用，只通过事件总线通信
//!
//! 公共的部分（总线、订阅、定时回调、Canvas、存活标志）放在 [`Stage`] 中。

mod credits;
mod debug;
mod game_main;
mod intro;
mod main_part;
mod ranking;
mod records;
mod result;
mod settings;
mod sound;
mod title;
mod tutorial;

pub use credits::Credits;
pub use debug::DebugTask;
pub use game_main::GameMain;
pub use intro::Intro;
pub use main_part::MainPart;
pub use ranking::{Ranking, RankingArgs};
pub use records::{Records, RecordsDetail};
pub use result::ResultScreen;
pub use settings::{Settings, SettingsDetail};
pub use sound::Sound;
pub use title::Title;
pub use tutorial::Tutorial;

use std::cell::Cell;
use std::rc::Rc;

use crate::count_exec::{CountExec, ExecId};
use crate::error::OrViolation;
use crate::event::{Connection, ConnectionHolder, EventBus, Message, UiSound};
use crate::params::{GameParams, TimedSound, WipeParams};
use crate::ui::{Canvas, CanvasDesc, Drawer, TweenCommon};

/// 创建画面所需的共享环境
#[derive(Debug, Clone)]
pub struct ScreenContext {
    pub bus: EventBus,
    pub params: Rc<GameParams>,
    pub tween_common: Rc<TweenCommon>,
}

impl ScreenContext {
    pub fn new(bus: &EventBus, params: Rc<GameParams>) -> Self {
        let tween_common = Rc::new(params.tween_common.clone());
        Self {
            bus: bus.clone(),
            params,
            tween_common,
        }
    }

    /// 按描述创建 Canvas（描述有误属于契约违反）
    pub fn canvas(&self, desc: &CanvasDesc) -> Canvas {
        Canvas::new(
            &self.bus,
            desc,
            Rc::clone(&self.tween_common),
            self.params.ui.camera.size,
            self.params.platform.safe_area,
        )
        .or_violation()
    }
}

/// 画面的公共部分
#[derive(Debug)]
pub(crate) struct Stage {
    pub bus: EventBus,
    pub holder: ConnectionHolder,
    pub exec: CountExec,
    pub canvas: Canvas,
    pub wipe: WipeParams,
    alive: Cell<bool>,
}

impl Stage {
    pub fn new(ctx: &ScreenContext, desc: &CanvasDesc) -> Self {
        Self {
            bus: ctx.bus.clone(),
            holder: ConnectionHolder::new(),
            exec: CountExec::new(),
            canvas: ctx.canvas(desc),
            wipe: ctx.params.ui.wipe,
            alive: Cell::new(true),
        }
    }

    /// 本帧结束后移除
    pub fn finish(&self) {
        self.alive.set(false);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// 推进定时回调与 Tween，返回是否存活
    pub fn step(&self, delta_time: f64) -> bool {
        self.exec.update(delta_time);
        self.canvas.update(delta_time);
        self.is_alive()
    }

    pub fn draw(&self, drawer: &mut dyn Drawer) {
        self.canvas.draw(drawer);
    }

    /// 发出音效请求
    pub fn sound(&self, name: &str) {
        self.bus.emit(&UiSound {
            name: name.to_string(),
        });
    }
}

/// 持有 [`Stage`] 的画面
pub(crate) trait HasStage: 'static {
    fn stage(&self) -> &Stage;
}

/// 订阅事件
///
/// 处理器只捕获 `Weak`，画面被丢弃后不再调用。`finish` 之后、从容器移除之前的同一帧里仍会调用。
pub(crate) fn on<T: HasStage>(this: &Rc<T>, event: &str, f: impl Fn(&Rc<T>) + 'static) {
    let weak = Rc::downgrade(this);
    let connection = this.stage().bus.connect(event, move |_, _| {
        if let Some(this) = weak.upgrade() {
            f(&this);
        }
    });
    this.stage().holder.add(connection);
}

/// 订阅类型化消息，调用时机同 [`on`]
pub(crate) fn on_message<T: HasStage, M: Message + 'static>(
    this: &Rc<T>,
    f: impl Fn(&Rc<T>, &Connection, M) + 'static,
) {
    let weak = Rc::downgrade(this);
    let connection = this.stage().bus.subscribe::<M, _>(move |connection, message| {
        if let Some(this) = weak.upgrade() {
            f(&this, connection, message);
        }
    });
    this.stage().holder.add(connection);
}

/// `delay` 秒后执行
pub(crate) fn after<T: HasStage>(this: &Rc<T>, delay: f64, f: impl FnOnce(&Rc<T>) + 'static) -> ExecId {
    let weak = Rc::downgrade(this);
    this.stage().exec.add(delay, move || {
        if let Some(this) = weak.upgrade() {
            f(&this);
        }
    })
}

/// 以 "out-to-right" 退场
///
/// 立即停止交互；`ui.wipe.delay` 后执行 `then`（通常是发出迁移事件），
/// `ui.wipe.duration` 后画面结束。
pub(crate) fn wipe_out<T: HasStage>(this: &Rc<T>, id: &str, then: impl FnOnce(&Rc<T>) + 'static) {
    let stage = this.stage();
    stage.canvas.active(false);
    stage.canvas.start_common_tween(id, "out-to-right");

    let wipe = stage.wipe;
    after(this, wipe.delay, then);
    after(this, wipe.duration, |this| this.stage().finish());
}

/// 按钮的触摸反馈
pub(crate) fn setup_common_tweens<T: HasStage>(this: &Rc<T>, id: &str) {
    const REACTIONS: [(&str, &str); 5] = [
        ("touch_began", "touch-in"),
        ("moved_out", "touch-out"),
        ("moved_in", "touch-in"),
        ("touch_ended", "touch-ended"),
        ("canceled", "touch-out"),
    ];

    for (suffix, tween) in REACTIONS {
        let id = id.to_string();
        on(this, &format!("{id}:{suffix}"), move |this| {
            this.stage().canvas.start_common_tween(&id, tween);
        });
    }
}

/// 按钮依次出现
pub(crate) fn start_button_tween<T: HasStage>(this: &Rc<T>, delay: f64, interval: f64, ids: &[&str]) {
    for (i, id) in ids.iter().enumerate() {
        let id = id.to_string();
        after(this, delay + interval * i as f64, move |this| {
            this.stage().canvas.start_common_tween(&id, "button-appear");
        });
    }
}

/// 按时间表播放音效
pub(crate) fn start_timeline_sound<T: HasStage>(this: &Rc<T>, sounds: &[TimedSound]) {
    for TimedSound(delay, name) in sounds {
        let name = name.clone();
        after(this, *delay, move |this| this.stage().sound(&name));
    }
}
