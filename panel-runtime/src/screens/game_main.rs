//! # GameMain
//!
//! 本编的 UI 层：剩余时间、得分、长按放置的计时器、「いいね」演出以及暂停菜单。
//!
//! 玩法本身在外部，这里只消费它发出的事件：
//!
//! | 事件 | 处理 |
//! |------|------|
//! | `Game:UI` | 剩余时间文字与颜色 |
//! | `Game:NoTimeLimit` | 不限时 |
//! | `Game:UpdateScores` / `Game:PutPanel` | 得分 |
//! | `Game:PutBegin` / `Game:PutHold` / `Game:PutEnd` | 放置计时器 |
//! | `Game:completed` | 在完成位置显示「いいね」 |
//! | `Game:Finish` | 结束演出后退场 |
//!
//! 发出的事件：`Game:Start`、`GameMain:pause`、`GameMain:resume`、`Game:Aborted`。

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

use super::{
    HasStage, ScreenContext, Stage, after, on, on_message, setup_common_tweens, start_button_tween,
    start_timeline_sound,
};
use crate::event::{Completed, GameFinish, GameUi, PutBegin, PutHold, PutPanel, UpdateScores};
use crate::task::Task;
use crate::ui::{Color, Drawer, EasingFunction, Vec2, Vec3};

/// 「いいね」Widget 的个数（循环使用）
const LIKE_WIDGETS: u32 = 8;

/// 得分 Widget 对应的得分种类：森林、道、街、教会
const SCORE_SOURCES: [usize; 4] = [2, 0, 5, 6];

/// 放置面板数显示在第五个得分 Widget
const PANELS_SLOT: usize = 4;

/// 剩余时间的显示文字
///
/// 不足 10 秒时显示到百分之一秒。
pub fn format_remaining_time(remaining_time: f64) -> String {
    if remaining_time < 10.0 {
        format!("0'{:05.2}", remaining_time.max(0.0))
    } else {
        let time = remaining_time.floor() as u32;
        format!("{}'{:02}", time / 60, time % 60)
    }
}

fn ndc(pos: Vec3) -> Vec2 {
    Vec2::new(pos.x, pos.y)
}

#[derive(Debug)]
struct GameMainInner {
    stage: Stage,
    scores: RefCell<[u32; 5]>,
    like_index: Cell<u32>,
}

impl HasStage for GameMainInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl GameMainInner {
    fn update_score_widget(&self, slot: usize, score: u32) {
        let id = format!("score:{}", slot + 1);
        let canvas = &self.stage.canvas;
        canvas.set_widget_text(&id, score.to_string());
        canvas.set_tween_target(&id, "score", 0);
        canvas.start_tween("score");
    }

    fn update_scores(&self, scores: &[u32]) {
        for (slot, source) in SCORE_SOURCES.into_iter().enumerate() {
            let Some(&score) = scores.get(source) else {
                continue;
            };
            let changed = {
                let mut current = self.scores.borrow_mut();
                let changed = current[slot] != score;
                current[slot] = score;
                changed
            };
            if changed {
                self.update_score_widget(slot, score);
            }
        }
    }

    fn update_time(&self, remaining_time: f64) {
        let canvas = &self.stage.canvas;
        canvas.set_widget_text("time_remain", format_remaining_time(remaining_time));

        // 不足 11 秒变红
        let color = if remaining_time < 11.0 {
            Color::RED
        } else {
            Color::WHITE
        };
        canvas.set_widget_param("time_remain", "color", color);
        canvas.set_widget_param("time_remain_icon", "color", color);
    }

    fn show_like(&self, pos: Vec3) {
        let index = self.like_index.get();
        self.like_index.set((index + 1) % LIKE_WIDGETS);

        let id = format!("like{index}");
        let canvas = &self.stage.canvas;
        canvas.set_tween_target(&id, "like", 0);
        canvas.set_widget_param(&id, "offset", canvas.ndc_to_pos(ndc(pos)));
        canvas.start_tween("like");
    }
}

fn start_pause_tweens(this: &Rc<GameMainInner>) {
    start_button_tween(this, 0.53, 0.2, &["abort", "resume"]);
}

fn start_pause_button_tween(this: &Rc<GameMainInner>, delay: f64) {
    start_button_tween(this, delay, 0.0, &["pause"]);
}

/// 本编画面
#[derive(Debug)]
pub struct GameMain {
    inner: Rc<GameMainInner>,
}

impl GameMain {
    pub fn new(ctx: &ScreenContext) -> Self {
        let params = &ctx.params.gamemain;
        let inner = Rc::new(GameMainInner {
            stage: Stage::new(ctx, &params.canvas),
            scores: RefCell::new([0; 5]),
            like_index: Cell::new(0),
        });
        start_timeline_sound(&inner, &params.se);

        after(&inner, params.start_delay, |this| {
            this.stage.bus.notify("Game:Start");
            this.stage.canvas.active(true);
        });

        Self::setup_pause_menu(&inner);
        Self::setup_game_events(&inner, params.end_delay);

        for id in ["pause", "resume", "abort"] {
            setup_common_tweens(&inner, id);
        }

        inner.stage.canvas.active(false);
        inner.stage.canvas.start_tween("start");
        start_pause_button_tween(&inner, 2.5);

        Self { inner }
    }

    fn setup_pause_menu(inner: &Rc<GameMainInner>) {
        on(inner, "pause:touch_ended", |this| {
            let stage = &this.stage;
            stage.canvas.active(false);
            stage.bus.notify("GameMain:pause");
            stage.canvas.start_common_tween("main", "out-to-right");

            after(this, stage.wipe.delay, |this| {
                this.stage.canvas.start_common_tween("pause_menu", "in-from-left");
                start_pause_tweens(this);
            });
            after(this, stage.wipe.duration, |this| this.stage.canvas.active(true));
        });

        on(inner, "resume:touch_ended", |this| {
            let stage = &this.stage;
            stage.canvas.active(false);
            stage.canvas.start_common_tween("pause_menu", "out-to-left");

            after(this, stage.wipe.delay, |this| {
                this.stage.canvas.start_common_tween("main", "in-from-right");
                start_pause_button_tween(this, 0.6);
            });
            after(this, stage.wipe.duration, |this| {
                this.stage.canvas.active(true);
                this.stage.bus.notify("GameMain:resume");
            });
        });

        on(inner, "abort:touch_ended", |this| {
            let stage = &this.stage;
            stage.canvas.active(false);
            stage.canvas.start_common_tween("pause_menu", "out-to-right");

            after(this, stage.wipe.delay, |this| this.stage.bus.notify("Game:Aborted"));
            after(this, stage.wipe.duration, |this| this.stage.finish());
            debug!("GameMain 中断");
        });
    }

    fn setup_game_events(inner: &Rc<GameMainInner>, end_delay: f64) {
        on_message::<_, GameUi>(inner, |this, _, message| {
            this.update_time(message.remaining_time);
        });

        on(inner, "Game:NoTimeLimit", |this| {
            this.stage.canvas.set_widget_text("time_remain", "0'00");
        });

        on_message::<_, UpdateScores>(inner, |this, _, message| {
            this.update_scores(&message.scores);
        });

        on_message::<_, PutPanel>(inner, |this, _, message| {
            this.scores.borrow_mut()[PANELS_SLOT] = message.total_panels;
            this.update_score_widget(PANELS_SLOT, message.total_panels);
        });

        on_message::<_, PutBegin>(inner, |this, _, message| {
            let canvas = &this.stage.canvas;
            canvas.set_widget_param("put_timer", "offset", canvas.ndc_to_pos(ndc(message.pos)));
            canvas.enable_widget("put_timer", true);
            canvas.set_widget_param("put_timer:body", "scale", Vec2::zero());
        });

        on(inner, "Game:PutEnd", |this| {
            this.stage.canvas.enable_widget("put_timer", false);
        });

        on_message::<_, PutHold>(inner, |this, _, message| {
            let canvas = &this.stage.canvas;
            canvas.set_widget_param("put_timer", "offset", canvas.ndc_to_pos(ndc(message.pos)));

            let scale = message.scale as f32;
            let alpha = EasingFunction::EaseOutExpo.apply(scale);
            canvas.set_widget_param("put_timer:fringe", "alpha", alpha);
            canvas.set_widget_param("put_timer:body", "scale", Vec2::splat(scale));
            canvas.set_widget_param("put_timer:body", "alpha", alpha);
        });

        on_message::<_, Completed>(inner, |this, _, message| {
            debug!(count = message.positions.len(), "Game:completed");
            let mut delay = 0.2;
            for pos in message.positions {
                after(this, delay, move |this| this.show_like(pos));
                delay += 0.1;
            }
        });

        on_message::<_, GameFinish>(inner, move |this, _, message| {
            this.stage.canvas.active(false);

            if message.tutorial {
                this.stage.canvas.start_tween("tutorial-end");
                after(this, end_delay, |this| {
                    debug!("GameMain 结束（教程）");
                    this.stage.finish();
                });
                return;
            }

            // 手持面板用尽时等玩法层的演出结束
            let delay = if message.no_panels { 2.0 } else { 0.0 };
            after(this, delay, move |this| {
                this.stage.canvas.start_tween("end");
                after(this, end_delay, |this| {
                    debug!("GameMain 结束");
                    this.stage.finish();
                });
            });
        });
    }

    /// 当前显示的得分（森林、道、街、教会、面板数）
    pub fn scores(&self) -> [u32; 5] {
        *self.inner.scores.borrow()
    }
}

impl Task for GameMain {
    fn name(&self) -> &'static str {
        "GameMain"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining_time() {
        assert_eq!(format_remaining_time(125.7), "2'05");
        assert_eq!(format_remaining_time(60.0), "1'00");
        assert_eq!(format_remaining_time(10.0), "0'10");
        assert_eq!(format_remaining_time(9.5), "0'09.50");
        assert_eq!(format_remaining_time(0.0), "0'00.00");
    }
}
