//! 起动时的标志画面
//!
//! 播放 "start" Tween，`intro.duration` 后发出 `Intro:finished`。点击画面可以提前结束（只生效一次）。

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

use super::{HasStage, ScreenContext, Stage, after, on, start_timeline_sound};
use crate::count_exec::ExecId;
use crate::task::Task;
use crate::ui::Drawer;

#[derive(Debug)]
struct IntroInner {
    stage: Stage,
    finish_exec: Cell<Option<ExecId>>,
}

impl HasStage for IntroInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl IntroInner {
    fn finish(&self) {
        // 定时结束与点击只取先到的一方
        let Some(id) = self.finish_exec.take() else {
            return;
        };
        self.stage.exec.cancel(id);
        debug!("Intro 结束");
        self.stage.bus.notify("Intro:finished");
        self.stage.finish();
    }
}

/// 标志画面
#[derive(Debug)]
pub struct Intro {
    inner: Rc<IntroInner>,
}

impl Intro {
    pub fn new(ctx: &ScreenContext) -> Self {
        let params = &ctx.params.intro;
        let inner = Rc::new(IntroInner {
            stage: Stage::new(ctx, &params.canvas),
            finish_exec: Cell::new(None),
        });

        start_timeline_sound(&inner, &params.se);
        let id = after(&inner, params.duration, |this| this.finish());
        inner.finish_exec.set(Some(id));

        on(&inner, "touch_ended", |this| this.finish());

        inner.stage.canvas.start_tween("start");
        Self { inner }
    }
}

impl Task for Intro {
    fn name(&self) -> &'static str {
        "Intro"
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
