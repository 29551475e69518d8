//! 标题画面
//!
//! 五个按钮分别迁移到本编、制作人员、设置、记录、排行。
//! 按下后以 "out-to-right" 退场，`ui.wipe.delay` 后发出迁移事件。

use std::any::Any;
use std::rc::Rc;
use tracing::debug;

use super::{HasStage, ScreenContext, Stage, on, setup_common_tweens, start_button_tween, wipe_out};
use crate::event::BgmPlay;
use crate::task::Task;
use crate::ui::Drawer;

/// 按钮与按下后发出的事件
const BUTTONS: [(&str, &str); 5] = [
    ("game", "Title:finished"),
    ("credits", "Credits:begin"),
    ("settings", "Settings:begin"),
    ("records", "Records:begin"),
    ("ranking", "Ranking:begin"),
];

#[derive(Debug)]
struct TitleInner {
    stage: Stage,
}

impl HasStage for TitleInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

/// 标题画面
#[derive(Debug)]
pub struct Title {
    inner: Rc<TitleInner>,
    first_boot: bool,
}

impl Title {
    /// `first_boot`: 从标志画面进入；`saved`: 存档没有未写入的修改
    pub fn new(ctx: &ScreenContext, first_boot: bool, saved: bool) -> Self {
        let params = &ctx.params.title;
        let inner = Rc::new(TitleInner {
            stage: Stage::new(ctx, &params.canvas),
        });
        let canvas = &inner.stage.canvas;

        canvas.set_widget_text("version", ctx.params.app.version.clone());
        canvas.enable_widget("saving", !saved);

        for (id, event) in BUTTONS {
            on(&inner, &format!("{id}:touch_ended"), move |this| {
                debug!(button = id, "Title");
                wipe_out(this, "root", move |this| this.stage.bus.notify(event));
            });
            setup_common_tweens(&inner, id);
        }

        if first_boot {
            canvas.start_tween("start");
        } else {
            canvas.start_common_tween("root", "in-from-left");
        }
        let ids = BUTTONS.map(|(id, _)| id);
        start_button_tween(&inner, params.button_delay, params.button_interval, &ids);

        if let Some(bgm) = &params.bgm {
            inner.stage.bus.emit(&BgmPlay { name: bgm.clone() });
        }

        Self { inner, first_boot }
    }

    pub fn is_first_boot(&self) -> bool {
        self.first_boot
    }
}

impl Task for Title {
    fn name(&self) -> &'static str {
        "Title"
    }

    fn update(&mut self, _current_time: f64, delta_time: f64) -> bool {
        self.inner.stage.step(delta_time)
    }

    fn draw(&self, drawer: &mut dyn Drawer) {
        self.inner.stage.draw(drawer);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
