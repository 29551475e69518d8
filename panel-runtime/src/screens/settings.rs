//! 设置画面
//!
//! BGM / SE 的开关。切换时立即广播 `Settings:Changed`，
//! 返回时发出 `Settings:Finished` 交给 Core 持久化。

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use super::{HasStage, ScreenContext, Stage, on, setup_common_tweens, start_button_tween, wipe_out};
use crate::event::{SettingsChanged, SettingsFinished};
use crate::task::Task;
use crate::ui::Drawer;

/// 进入设置画面时的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsDetail {
    pub bgm_enable: bool,
    pub se_enable: bool,
}

#[derive(Debug)]
struct SettingsInner {
    stage: Stage,
    bgm_enable: Cell<bool>,
    se_enable: Cell<bool>,
}

impl HasStage for SettingsInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl SettingsInner {
    fn refresh(&self) {
        let label = |enable: bool| if enable { "ON" } else { "OFF" };
        let canvas = &self.stage.canvas;
        canvas.set_widget_text("bgm:icon", format!("BGM: {}", label(self.bgm_enable.get())));
        canvas.set_widget_text("se:icon", format!("SE: {}", label(self.se_enable.get())));
    }

    fn toggle(&self, flag: &Cell<bool>) {
        flag.set(!flag.get());
        self.refresh();
        self.stage.bus.emit(&SettingsChanged {
            bgm_enable: self.bgm_enable.get(),
            se_enable: self.se_enable.get(),
        });
    }
}

/// 设置画面
#[derive(Debug)]
pub struct Settings {
    inner: Rc<SettingsInner>,
}

impl Settings {
    pub fn new(ctx: &ScreenContext, detail: SettingsDetail) -> Self {
        let inner = Rc::new(SettingsInner {
            stage: Stage::new(ctx, &ctx.params.settings.canvas),
            bgm_enable: Cell::new(detail.bgm_enable),
            se_enable: Cell::new(detail.se_enable),
        });
        inner.refresh();

        on(&inner, "bgm:touch_ended", |this| this.toggle(&this.bgm_enable));
        on(&inner, "se:touch_ended", |this| this.toggle(&this.se_enable));
        on(&inner, "agree:touch_ended", |this| {
            wipe_out(this, "root", |this| {
                this.stage.bus.emit(&SettingsFinished {
                    bgm_enable: this.bgm_enable.get(),
                    se_enable: this.se_enable.get(),
                });
            });
        });
        for id in ["bgm", "se", "agree"] {
            setup_common_tweens(&inner, id);
        }

        inner.stage.canvas.start_common_tween("root", "in-from-left");
        start_button_tween(&inner, ctx.params.ui.wipe.delay, 0.1, &["bgm", "se", "agree"]);

        Self { inner }
    }

    /// 当前状态
    pub fn detail(&self) -> SettingsDetail {
        SettingsDetail {
            bgm_enable: self.inner.bgm_enable.get(),
            se_enable: self.inner.se_enable.get(),
        }
    }
}

impl Task for Settings {
    fn name(&self) -> &'static str {
        "Settings"
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
