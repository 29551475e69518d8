//! 制作人员画面

use std::any::Any;
use std::rc::Rc;

use super::{HasStage, ScreenContext, Stage, on, setup_common_tweens, start_button_tween, wipe_out};
use crate::task::Task;
use crate::ui::Drawer;

#[derive(Debug)]
struct CreditsInner {
    stage: Stage,
}

impl HasStage for CreditsInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

#[derive(Debug)]
pub struct Credits {
    inner: Rc<CreditsInner>,
}

impl Credits {
    pub fn new(ctx: &ScreenContext) -> Self {
        let inner = Rc::new(CreditsInner {
            stage: Stage::new(ctx, &ctx.params.credits.canvas),
        });

        on(&inner, "agree:touch_ended", |this| {
            wipe_out(this, "root", |this| this.stage.bus.notify("Credits:Finished"));
        });
        setup_common_tweens(&inner, "agree");

        inner.stage.canvas.start_common_tween("root", "in-from-left");
        start_button_tween(&inner, ctx.params.ui.wipe.delay, 0.0, &["agree"]);

        Self { inner }
    }
}

impl Task for Credits {
    fn name(&self) -> &'static str {
        "Credits"
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
