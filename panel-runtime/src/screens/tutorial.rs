//! # Tutorial
//!
//! 与 GameMain 同时运行的教程层。
//!
//! ## 阶段
//!
//! 教程是一张条件表，按顺序推进：
//!
//! 1. 显示当前阶段的说明文字，把需要指示的目标种类告诉玩法层
//! 2. 0.2 秒后订阅该阶段的触发事件
//! 3. 触发达到规定次数后断开订阅，执行推进动作，进入下一阶段
//!
//! 玩法层每帧收到 `Tutorial:kinds` 后以 `Tutorial:positions` 回复指示位置
//! （第一个是光标位置，其余是箭头位置）。
//!
//! 本局结束时发出 `Tutorial:Complete` 并显示建议面板，确认后发出 `Tutorial:Finished`。

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

use super::{
    HasStage, ScreenContext, Stage, after, on, on_message, setup_common_tweens, start_button_tween,
    wipe_out,
};
use crate::event::{TutorialKinds, TutorialPositions};
use crate::params::GameParams;
use crate::task::Task;
use crate::ui::{Drawer, ParamValue, Vec2, Vec3};

/// 箭头 Widget 的个数（`arrow1` - `arrow8`）
const ARROWS: usize = 8;

/// 阶段推进时的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// 在光标位置显示「いいね」
    Done,
    /// 等待位置更新后再显示「いいね」
    DoneDelayed,
    /// 通知玩法层
    Signal(&'static str),
    /// 第一个箭头使用特殊偏移（指向手持面板）
    UseSpecial(bool),
}

/// 一个阶段
#[derive(Debug)]
struct Condition {
    /// 需要指示的目标种类（位掩码）
    kinds: u32,
    /// 触发事件
    event: &'static str,
    /// 说明文字的键
    text: &'static str,
    /// 推进所需的触发次数
    times: u32,
    actions: &'static [Action],
}

static CONDITIONS: [Condition; 11] = [
    // 移动
    Condition {
        kinds: 0b10,
        event: "Game:PanelMove",
        text: "Tutorial02",
        times: 1,
        actions: &[Action::DoneDelayed, Action::Signal("Game:enable-rotation")],
    },
    // 旋转
    Condition {
        kinds: 0b1,
        event: "Game:PanelRotate",
        text: "Tutorial03",
        times: 1,
        actions: &[Action::Done],
    },
    // 放置之前再移动一次
    Condition {
        kinds: 0,
        event: "Game:PanelMove",
        text: "Tutorial04",
        times: 1,
        actions: &[Action::UseSpecial(true), Action::Signal("Game:enable-panelput")],
    },
    // 放置
    Condition {
        kinds: 0b1,
        event: "Game:PutPanel",
        text: "Tutorial05",
        times: 1,
        actions: &[Action::Done, Action::UseSpecial(false)],
    },
    // 可以放置的条件
    Condition {
        kinds: 0,
        event: "Game:PutPanel",
        text: "Tutorial06",
        times: 2,
        actions: &[Action::Done],
    },
    Condition {
        kinds: 0,
        event: "Game:PutPanel",
        text: "Tutorial07",
        times: 1,
        actions: &[Action::UseSpecial(true)],
    },
    // 道
    Condition {
        kinds: 0b101,
        event: "Game:PutPanel",
        text: "Tutorial08",
        times: 2,
        actions: &[Action::UseSpecial(false)],
    },
    // 森林
    Condition {
        kinds: 0b101000,
        event: "Game:PutPanel",
        text: "Tutorial09",
        times: 3,
        actions: &[],
    },
    // 教会登场
    Condition {
        kinds: 0b1,
        event: "Game:PutPanel",
        text: "Tutorial10",
        times: 1,
        actions: &[],
    },
    // 教会
    Condition {
        kinds: 0b10000,
        event: "Game:PutPanel",
        text: "Tutorial11",
        times: 2,
        actions: &[],
    },
    // 最后一段，不会推进
    Condition {
        kinds: 0,
        event: "Game:PutPanel",
        text: "Tutorial12",
        times: u32::MAX,
        actions: &[],
    },
];

#[derive(Debug)]
struct TutorialInner {
    stage: Stage,
    params: Rc<GameParams>,
    offset_special: Vec2,
    offset_common: Vec2,

    level: Cell<usize>,
    remaining: Cell<u32>,
    kinds: Cell<u32>,
    use_special: Cell<bool>,
    paused: Cell<bool>,
    positions: RefCell<Vec<Vec3>>,
}

impl HasStage for TutorialInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl TutorialInner {
    /// 指示位置
    fn update_indication(&self) {
        let positions = self.positions.borrow();
        if positions.is_empty() {
            return;
        }

        let canvas = &self.stage.canvas;
        let mut use_special = self.use_special.get();
        let arrows = positions.iter().skip(1).take(ARROWS);
        let shown = arrows.len();
        for (i, pos) in arrows.enumerate() {
            let id = format!("arrow{}", i + 1);
            let offset = if use_special {
                self.offset_special
            } else {
                self.offset_common
            };
            canvas.enable_widget(&id, true);
            canvas.set_widget_param(&id, "offset", canvas.ndc_to_pos(Vec2::new(pos.x, pos.y)) + offset);
            use_special = false;
        }
        for i in shown..ARROWS {
            canvas.enable_widget(&format!("arrow{}", i + 1), false);
        }
    }

    /// 操作完成，在光标位置显示「いいね」
    fn done_operation(&self) {
        let Some(cursor) = self.positions.borrow().first().copied() else {
            warn!("没有光标位置");
            return;
        };
        let canvas = &self.stage.canvas;
        canvas.set_widget_param("like", "offset", canvas.ndc_to_pos(Vec2::new(cursor.x, cursor.y)));
        canvas.start_tween("like");
        self.stage.sound("like");
    }

    /// 根据语言调整建议面板的位置（`Tutorial00` 为横向偏移）
    fn setup_advice(&self) {
        let text = self.params.text("Tutorial00");
        let offset_x = match text.trim().parse::<f32>() {
            Ok(x) => x,
            Err(_) => {
                warn!(text = %text, "Tutorial00 不是数值");
                0.0
            }
        };
        self.stage.canvas.modify_widget_param("advice", "rect", |value| {
            if let ParamValue::Rect(rect) = value {
                rect.x1 += offset_x;
                rect.x2 += offset_x;
            }
        });
    }
}

fn start_stage(this: &Rc<TutorialInner>) {
    let Some(condition) = CONDITIONS.get(this.level.get()) else {
        return;
    };
    debug!(level = this.level.get(), text = condition.text, "教程阶段");

    this.kinds.set(condition.kinds);
    this.remaining.set(condition.times);
    this.stage.canvas.set_widget_text("text", this.params.text(condition.text));

    after(this, 0.2, move |this| {
        let weak = Rc::downgrade(this);
        let connection = this.stage.bus.connect(condition.event, move |connection, _| {
            let Some(this) = weak.upgrade() else {
                return;
            };
            let remaining = this.remaining.get().saturating_sub(1);
            this.remaining.set(remaining);
            if remaining > 0 {
                return;
            }

            connection.disconnect();
            this.level.set(this.level.get() + 1);
            for action in condition.actions {
                run_action(&this, *action);
            }
            start_stage(&this);
        });
        this.stage.holder.add(connection);
    });
}

fn run_action(this: &Rc<TutorialInner>, action: Action) {
    match action {
        Action::Done => this.done_operation(),
        // 位置的更新晚一帧
        Action::DoneDelayed => {
            after(this, 0.05, |this| this.done_operation());
        }
        Action::Signal(event) => this.stage.bus.notify(event),
        Action::UseSpecial(special) => this.use_special.set(special),
    }
}

/// 本局结束后显示建议
fn show_advice(this: &Rc<TutorialInner>) {
    let canvas = &this.stage.canvas;
    canvas.enable_widget("advice", true);
    canvas.start_tween("check");
    canvas.start_tween("advice");

    for i in 0..3 {
        after(this, 2.0 + f64::from(i) * 0.3, |this| this.stage.sound("advice"));
    }

    canvas.enable_widget("agree", true);
    start_button_tween(this, 4.0, 0.2, &["agree"]);
}

/// 教程
#[derive(Debug)]
pub struct Tutorial {
    inner: Rc<TutorialInner>,
}

impl Tutorial {
    pub fn new(ctx: &ScreenContext) -> Self {
        let params = &ctx.params.tutorial;
        let inner = Rc::new(TutorialInner {
            stage: Stage::new(ctx, &params.canvas),
            params: Rc::clone(&ctx.params),
            offset_special: params.offset_special,
            offset_common: params.offset_common,
            level: Cell::new(0),
            remaining: Cell::new(0),
            kinds: Cell::new(0),
            use_special: Cell::new(false),
            paused: Cell::new(false),
            positions: RefCell::new(Vec::new()),
        });

        inner.setup_advice();
        start_stage(&inner);

        on(&inner, "GameMain:pause", |this| {
            this.paused.set(true);
            this.stage.canvas.start_tween("pause");
        });
        on(&inner, "GameMain:resume", |this| {
            this.paused.set(false);
            this.stage.canvas.start_tween("resume");
        });

        on_message::<_, TutorialPositions>(&inner, |this, _, message| {
            *this.positions.borrow_mut() = message.positions;
        });

        on(&inner, "Game:Finish", |this| {
            this.paused.set(true);
            this.stage.canvas.start_tween("pause");
            this.stage.bus.notify("Tutorial:Complete");
            show_advice(this);
        });

        on(&inner, "agree:touch_ended", |this| {
            debug!("教程确认");
            wipe_out(this, "root", |this| this.stage.bus.notify("Tutorial:Finished"));
        });
        on(&inner, "Game:Aborted", |this| this.stage.finish());

        inner.stage.canvas.start_tween("start");
        setup_common_tweens(&inner, "agree");

        Self { inner }
    }

    /// 当前阶段（0 起）
    pub fn level(&self) -> usize {
        self.inner.level.get()
    }
}

impl Task for Tutorial {
    fn name(&self) -> &'static str {
        "Tutorial"
    }

    fn update(&mut self, _current_time: f64, delta_time: f64) -> bool {
        let inner = &self.inner;
        let alive = inner.stage.step(delta_time);
        if inner.paused.get() {
            return alive;
        }

        // 玩法层同步回复 Tutorial:positions
        inner.stage.bus.emit(&TutorialKinds {
            kinds: inner.kinds.get(),
        });
        inner.update_indication();
        alive
    }

    fn draw(&self, drawer: &mut dyn Drawer) {
        self.inner.stage.draw(drawer);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Connection, EventBus};

    const DT: f64 = 1.0 / 60.0;

    fn tutorial(bus: &EventBus) -> Tutorial {
        let ctx = ScreenContext::new(bus, Rc::new(GameParams::builtin().unwrap()));
        Tutorial::new(&ctx)
    }

    /// 跑满订阅延迟
    fn wait(tutorial: &mut Tutorial, frames: u32) {
        for i in 0..frames {
            assert!(tutorial.update(f64::from(i) * DT, DT));
        }
    }

    fn count(bus: &EventBus, event: &str) -> (Rc<Cell<u32>>, Connection) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let connection = bus.connect(event, move |_, _| c.set(c.get() + 1));
        (count, connection)
    }

    /// 等过订阅延迟后触发一次
    fn trigger(tutorial: &mut Tutorial, bus: &EventBus, event: &str) {
        wait(tutorial, 15);
        bus.notify(event);
    }

    #[test]
    fn test_trigger_before_subscribe_delay_is_ignored() {
        let bus = EventBus::new();
        let mut tutorial = tutorial(&bus);
        wait(&mut tutorial, 6);
        assert_eq!(bus.subscriber_count("Game:PanelMove"), 0);

        bus.notify("Game:PanelMove");
        assert_eq!(tutorial.level(), 0);

        wait(&mut tutorial, 15);
        assert_eq!(bus.subscriber_count("Game:PanelMove"), 1);
        assert_eq!(tutorial.level(), 0);
    }

    #[test]
    fn test_first_move_advances_and_enables_rotation() {
        let bus = EventBus::new();
        let (rotation, _rotation) = count(&bus, "Game:enable-rotation");
        let mut tutorial = tutorial(&bus);

        trigger(&mut tutorial, &bus, "Game:PanelMove");
        assert_eq!(tutorial.level(), 1);
        assert_eq!(rotation.get(), 1);
        assert_eq!(bus.subscriber_count("Game:PanelMove"), 0);

        // 下一阶段只听旋转
        wait(&mut tutorial, 15);
        assert_eq!(bus.subscriber_count("Game:PanelMove"), 0);
        assert_eq!(bus.subscriber_count("Game:PanelRotate"), 1);
        bus.notify("Game:PanelMove");
        assert_eq!(tutorial.level(), 1);
        assert_eq!(rotation.get(), 1);
    }

    #[test]
    fn test_stage_with_two_times_needs_two_triggers() {
        let bus = EventBus::new();
        let (panelput, _panelput) = count(&bus, "Game:enable-panelput");
        let mut tutorial = tutorial(&bus);

        trigger(&mut tutorial, &bus, "Game:PanelMove");
        trigger(&mut tutorial, &bus, "Game:PanelRotate");
        trigger(&mut tutorial, &bus, "Game:PanelMove");
        assert_eq!(panelput.get(), 1);
        trigger(&mut tutorial, &bus, "Game:PutPanel");
        assert_eq!(tutorial.level(), 4);
        assert_eq!(CONDITIONS[4].times, 2);

        trigger(&mut tutorial, &bus, "Game:PutPanel");
        assert_eq!(tutorial.level(), 4);
        assert_eq!(bus.subscriber_count("Game:PutPanel"), 1);

        bus.notify("Game:PutPanel");
        assert_eq!(tutorial.level(), 5);
        assert_eq!(bus.subscriber_count("Game:PutPanel"), 0);
    }

    #[test]
    fn test_conditions_reach_final_stage() {
        let last = CONDITIONS.len() - 1;
        assert_eq!(CONDITIONS[last].times, u32::MAX);
        assert!(CONDITIONS[..last].iter().all(|c| c.times > 0 && c.times < 10));
        assert!(CONDITIONS.iter().all(|c| c.text.starts_with("Tutorial")));
    }
}
