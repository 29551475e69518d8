//! 记录画面
//!
//! 显示存档中的计数与平均值。返回按钮在 `records.touch_delay` 后出现。

use std::any::Any;
use std::rc::Rc;

use super::{HasStage, ScreenContext, Stage, after, on, setup_common_tweens};
use crate::archive::Archive;
use crate::task::Task;
use crate::ui::Drawer;

/// 记录画面显示的内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsDetail {
    pub play_times: u32,
    pub total_panels: u32,
    pub panel_turned_times: u32,
    pub panel_moved_times: u32,
    pub share_times: u32,
    pub startup_times: u32,
    pub abort_times: u32,

    pub average_score: f64,
    pub average_put_panels: f64,
    pub average_moved_times: f64,
    pub average_turn_times: f64,
    pub average_put_time: f64,
}

impl RecordsDetail {
    /// 从存档读取
    pub fn from_archive(archive: &Archive) -> Self {
        Self {
            play_times: archive.record("play-times"),
            total_panels: archive.record("total-panels"),
            panel_turned_times: archive.record("panel-turned-times"),
            panel_moved_times: archive.record("panel-moved-times"),
            share_times: archive.record("share-times"),
            startup_times: archive.record("startup-times"),
            abort_times: archive.record("abort-times"),

            average_score: archive.record("average-score"),
            average_put_panels: archive.record("average-put-panels"),
            average_moved_times: archive.record("average-moved-times"),
            average_turn_times: archive.record("average-turn-times"),
            average_put_time: archive.record("average-put-time"),
        }
    }

    /// (记录名, 显示文字)
    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("play-times", self.play_times.to_string()),
            ("total-panels", self.total_panels.to_string()),
            ("panel-turned-times", self.panel_turned_times.to_string()),
            ("panel-moved-times", self.panel_moved_times.to_string()),
            ("share-times", self.share_times.to_string()),
            ("startup-times", self.startup_times.to_string()),
            ("abort-times", self.abort_times.to_string()),
            ("average-score", format!("{:.1}", self.average_score)),
            ("average-put-panels", format!("{:.1}", self.average_put_panels)),
            ("average-moved-times", format!("{:.1}", self.average_moved_times)),
            ("average-turn-times", format!("{:.1}", self.average_turn_times)),
            ("average-put-time", format!("{:.1}", self.average_put_time)),
        ]
    }
}

#[derive(Debug)]
struct RecordsInner {
    stage: Stage,
}

impl HasStage for RecordsInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

/// 记录画面
#[derive(Debug)]
pub struct Records {
    inner: Rc<RecordsInner>,
}

impl Records {
    pub fn new(ctx: &ScreenContext, detail: &RecordsDetail) -> Self {
        let params = &ctx.params.records;
        let inner = Rc::new(RecordsInner {
            stage: Stage::new(ctx, &params.canvas),
        });

        for (key, text) in detail.entries() {
            inner.stage.canvas.set_widget_text(&format!("record:{key}"), text);
        }

        after(&inner, params.touch_delay, |this| {
            this.stage.canvas.enable_widget("agree", true);
        });

        let finish_delay = params.finish_delay;
        on(&inner, "agree:touch_ended", move |this| {
            this.stage.canvas.active(false);
            after(this, finish_delay, |this| {
                this.stage.bus.notify("Records:Finished");
                this.stage.finish();
            });
        });
        setup_common_tweens(&inner, "agree");

        Self { inner }
    }
}

impl Task for Records {
    fn name(&self) -> &'static str {
        "Records"
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
