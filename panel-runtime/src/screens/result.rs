//! # Result
//!
//! 结果画面。得分依次出现的演出全部排进 CountExec：
//!
//! 1. 森林、道路的每一项得分，教会得分，放置面板数（每项 `result.score_interval`）
//! 2. 总分从 0 计数到最终值（`result.disp_duration`，计数时每 4 帧一次鼓声）
//! 3. 评价星星逐个出现
//! 4. 排行入榜 / 最高分 / 完美的徽章，徽章出现后开始色相循环
//!
//! `result.skip_delay` 之后点击画面，未结束的演出会一次快进完。

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

use super::{
    HasStage, ScreenContext, Stage, after, on, on_message, setup_common_tweens, start_button_tween,
    start_timeline_sound, wipe_out,
};
use crate::archive::Score;
use crate::event::{ResultBegin, ResultFinished, ShareResult, SharePost, TouchEnded};
use crate::params::ResultParams;
use crate::task::Task;
use crate::ui::{Animation, Color, Drawer, ParamValue, Vec2, Vec3};

/// 每类得分最多显示的项数
const MAX_PANEL_SCORES: usize = 15;

/// 星星 Widget 的个数
const STARS: u32 = 5;

/// 演出开始前的等待
const START_DELAY: f64 = 0.8;

/// 快进时推进的时间
const SKIP_TIME: f64 = 10.0;

/// 总分的计数
#[derive(Debug)]
struct Countup {
    id: &'static str,
    animation: Animation,
    frames: u32,
}

#[derive(Debug)]
struct ResultInner {
    stage: Stage,
    begin: ResultBegin,
    effect_speed: Vec3,
    score_interval: f64,
    share_text: String,

    effect: Cell<bool>,
    active_input: Cell<bool>,
    drum_index: Cell<u32>,
    countup: RefCell<Option<Countup>>,
}

impl HasStage for ResultInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl ResultInner {
    fn score(&self) -> &Score {
        &self.begin.score
    }

    /// 鼓声（逐次升高，最高 16）
    fn score_se(&self) {
        let index = self.drum_index.get();
        self.stage.sound(&format!("drum-roll-{index}"));
        self.drum_index.set((index + 1).min(16));
    }

    /// 显示一项得分
    fn reveal(&self, id: &str) {
        let canvas = &self.stage.canvas;
        canvas.set_tween_target(id, "score", 0);
        canvas.start_tween("score");
        canvas.enable_widget(id, true);
        self.score_se();
    }

    fn step_countup(&self, delta_time: f64) {
        let drum = {
            let mut countup = self.countup.borrow_mut();
            let Some(countup) = countup.as_mut() else {
                return;
            };
            if countup.animation.is_finished() {
                return;
            }
            countup.animation.update(delta_time as f32);
            let value = countup.animation.current_value().round() as u32;
            self.stage.canvas.set_widget_text(countup.id, value.to_string());
            countup.frames += 1;
            countup.frames % 4 == 0
        };
        if drum {
            self.score_se();
        }
    }

    /// 色相循环
    fn update_effect(&self, current_time: f64, delta_time: f64) {
        let hue = |time: f64| {
            let h = (time * f64::from(self.effect_speed.x)).rem_euclid(1.0);
            Color::from_hsv(h as f32, 0.75, 1.0)
        };
        let phase = f64::from(self.effect_speed.y) * delta_time;
        let canvas = &self.stage.canvas;

        if self.begin.high_score || self.begin.rank_in {
            let mut time = current_time;
            canvas.set_widget_param("score:20", "color", hue(time));
            time += phase;

            if self.score().total_ranking > 0 {
                for i in 0..STARS {
                    canvas.set_widget_param(&format!("score:21-{i}"), "color", hue(time));
                }
            }
            time += phase;

            canvas.set_widget_param("score:high-score", "color", hue(time));
            canvas.set_widget_param("score:rank-in", "color", hue(time));
        }
        if self.score().perfect {
            canvas.set_widget_param("score:perfect", "color", hue(current_time));
        }
    }
}

/// 森林/道路的每一项得分，返回下一项的开始时间
fn panel_scores(this: &Rc<ResultInner>, scores: &[u32], prefix: &str, mut delay: f64) -> f64 {
    if scores.is_empty() {
        let id = format!("{prefix}0");
        this.stage.canvas.set_widget_text(&id, "0");
        after(this, delay, move |this| this.reveal(&id));
        return delay + this.score_interval;
    }

    let mut offset = 0.0;
    for (i, score) in scores.iter().take(MAX_PANEL_SCORES).enumerate() {
        let id = format!("{prefix}{i}");
        let text = score.to_string();
        let canvas = &this.stage.canvas;
        canvas.set_widget_param(&id, "offset", Vec2::new(offset, 0.0));
        canvas.set_widget_text(&id, text.clone());
        after(this, delay, move |this| this.reveal(&id));

        delay += 0.15;
        offset += 6.0 + 5.0 * text.len() as f32;
    }
    delay
}

/// 各项得分，返回下一段的开始时间
fn apply_score(this: &Rc<ResultInner>, mut delay: f64) -> f64 {
    let score = this.score().clone();
    delay = panel_scores(this, &score.forest, "score:forest", delay);
    delay = panel_scores(this, &score.path, "score:path", delay);

    let church = score.scores.get(6).copied().unwrap_or(0);
    for (id, value) in [("score:2", church), ("score:3", score.total_panels)] {
        this.stage.canvas.set_widget_text(id, value.to_string());
        after(this, delay, move |this| this.reveal(id));
        delay += this.score_interval;
    }
    delay
}

/// 总分与星星，返回演出结束的时间
fn tween_total_score(this: &Rc<ResultInner>, params: &ResultParams, delay: f64) -> f64 {
    let total = this.score().total_score;
    if total > 0 {
        let animation = Animation::new(0.0, total as f32, params.disp_duration as f32)
            .with_easing(params.disp_ease);
        after(this, delay, move |this| {
            *this.countup.borrow_mut() = Some(Countup {
                id: "score:20",
                animation,
                frames: 0,
            });
        });
    } else {
        this.stage.canvas.set_widget_text("score:20", "0");
    }

    // 评价以半星为单位
    let rank = this.score().total_ranking.min(STARS * 2);
    let mut delay = params.disp_duration + delay + 0.1;
    let full = rank / 2;
    let half = rank % 2 == 1;
    for i in 0..full + u32::from(half) {
        let icon = if i < full {
            params.rank_icon[0].clone()
        } else {
            params.rank_icon[1].clone()
        };
        delay += 0.1;
        after(this, delay, move |this| {
            let id = format!("score:21-{i}");
            let canvas = &this.stage.canvas;
            canvas.set_widget_text(&id, icon);
            canvas.set_tween_target(&id, "rank", 0);
            canvas.start_tween("rank");
            this.stage.sound(&format!("rank-{}", i + 1));
        });
    }

    delay + 0.3
}

/// 结果画面
#[derive(Debug)]
pub struct ResultScreen {
    inner: Rc<ResultInner>,
}

impl ResultScreen {
    pub fn new(ctx: &ScreenContext, begin: ResultBegin) -> Self {
        let params = &ctx.params.result;
        let share_text = ctx
            .params
            .text(&params.share)
            .replace("%1", &begin.score.total_score.to_string());
        debug!(
            score = begin.score.total_score,
            rank_in = begin.rank_in,
            high_score = begin.high_score,
            "结果画面"
        );

        let inner = Rc::new(ResultInner {
            stage: Stage::new(ctx, &params.canvas),
            begin,
            effect_speed: params.effect_speed,
            score_interval: params.score_interval,
            share_text,
            effect: Cell::new(false),
            active_input: Cell::new(false),
            drum_index: Cell::new(1),
            countup: RefCell::new(None),
        });
        start_timeline_sound(&inner, &params.se);

        Self::setup_buttons(&inner, ctx.params.platform.share);
        Self::setup_skip(&inner, params.skip_delay);

        let delay = apply_score(&inner, START_DELAY);
        let duration = tween_total_score(&inner, params, delay);

        let badge_delay = duration + params.disp_delay_2;
        let begin = &inner.begin;
        if begin.high_score || begin.rank_in {
            after(&inner, badge_delay, |this| {
                this.effect.set(true);
                let id = if this.begin.high_score {
                    "score:high-score"
                } else {
                    "score:rank-in"
                };
                this.stage.canvas.enable_widget(id, true);
                this.stage.sound("rank-in");
            });
        }
        if begin.score.perfect && !begin.tutorial {
            after(&inner, badge_delay, |this| {
                this.effect.set(true);
                this.stage.canvas.enable_widget("score:perfect", true);
            });
        }

        inner.stage.canvas.start_common_tween("root", "in-from-left");
        start_button_tween(&inner, badge_delay + 0.25, 0.2, &["agree", "share"]);
        after(&inner, badge_delay, |this| this.active_input.set(true));

        Self { inner }
    }

    fn setup_buttons(inner: &Rc<ResultInner>, share: bool) {
        on(inner, "agree:touch_ended", |this| {
            debug!("结果确认");
            wipe_out(this, "root", |this| {
                this.stage.bus.emit(&ResultFinished {
                    rank_in: this.begin.rank_in,
                    ranking: this.begin.ranking,
                });
            });
        });

        if share {
            let canvas = &inner.stage.canvas;
            canvas.enable_widget("share", true);

            // 分享按钮与确认按钮左右对称
            if let ParamValue::Vec2(offset) = canvas.get_widget_param("share", "offset") {
                canvas.set_widget_param("agree", "offset", Vec2::new(-offset.x, offset.y));
            }

            on(inner, "share:touch_ended", |this| {
                this.stage.canvas.active(false);
                after(this, this.stage.wipe.delay, |this| {
                    this.stage.bus.emit(&SharePost {
                        text: this.share_text.clone(),
                    });
                });
            });
            on_message::<_, ShareResult>(inner, |this, _, message| {
                if message.completed {
                    debug!("分享完成");
                    this.stage.bus.notify("Share:completed");
                }
                this.stage.canvas.active(true);
            });
        }

        setup_common_tweens(inner, "agree");
        setup_common_tweens(inner, "share");
    }

    /// 点击画面快进（只生效一次）
    fn setup_skip(inner: &Rc<ResultInner>, skip_delay: f64) {
        after(inner, skip_delay, |this| {
            on_message::<_, TouchEnded>(this, |this, connection, _| {
                if !this.active_input.get() {
                    debug!("快进结果演出");
                    this.stage.exec.update(SKIP_TIME);
                    this.stage.canvas.update(SKIP_TIME);
                    this.step_countup(SKIP_TIME);
                }
                connection.disconnect();
            });
        });
    }

    /// 计数中的总分
    pub fn displayed_total(&self) -> Option<u32> {
        self.inner
            .countup
            .borrow()
            .as_ref()
            .map(|c| c.animation.current_value().round() as u32)
    }
}

impl Task for ResultScreen {
    fn name(&self) -> &'static str {
        "Result"
    }

    fn update(&mut self, current_time: f64, delta_time: f64) -> bool {
        let inner = &self.inner;
        let alive = inner.stage.step(delta_time);
        inner.step_countup(delta_time);
        if inner.effect.get() {
            inner.update_effect(current_time, delta_time);
        }
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
    use crate::event::EventBus;
    use crate::params::GameParams;

    const DT: f64 = 1.0 / 60.0;

    fn screen(bus: &EventBus) -> ResultScreen {
        let ctx = ScreenContext::new(bus, Rc::new(GameParams::builtin().unwrap()));
        let score = Score {
            total_score: 80,
            total_ranking: 6,
            scores: vec![0, 3, 4, 0, 0, 0, 2],
            forest: vec![3, 4],
            path: vec![5],
            total_panels: 12,
            ..Default::default()
        };
        ResultScreen::new(
            &ctx,
            ResultBegin {
                rank_in: true,
                ranking: 2,
                high_score: false,
                score,
                tutorial: false,
            },
        )
    }

    /// 出现演出结束：完全不透明，缩放回到 1
    fn assert_settled(canvas: &crate::ui::Canvas, id: &str) {
        let ParamValue::Float(alpha) = canvas.get_widget_param(id, "alpha") else {
            panic!("{id}: alpha 不是 Float");
        };
        let ParamValue::Vec2(scale) = canvas.get_widget_param(id, "scale") else {
            panic!("{id}: scale 不是 Vec2");
        };
        assert!((alpha - 1.0).abs() < 1e-4, "{id}: alpha = {alpha}");
        assert!((scale.x - 1.0).abs() < 1e-4 && (scale.y - 1.0).abs() < 1e-4, "{id}: scale = {scale:?}");
    }

    fn run(screen: &mut ResultScreen, frames: u32) {
        for i in 0..frames {
            assert!(screen.update(f64::from(i) * DT, DT));
        }
    }

    #[test]
    fn test_tap_skips_whole_reveal() {
        let bus = EventBus::new();
        let mut screen = screen(&bus);
        run(&mut screen, 36);
        assert_eq!(screen.displayed_total(), None);

        bus.emit(&TouchEnded {
            pos: Vec2::new(10.0, 10.0),
        });
        let inner = &screen.inner;
        assert_eq!(screen.displayed_total(), Some(80));
        assert!(inner.stage.exec.is_empty());
        assert!(!inner.stage.canvas.has_running_tween());
        assert!(inner.stage.canvas.is_widget_enable("score:rank-in"));
        for id in ["score:forest0", "score:forest1", "score:path0", "score:2", "score:3"] {
            assert_settled(&inner.stage.canvas, id);
        }
    }

    #[test]
    fn test_tap_before_skip_delay_is_ignored() {
        let bus = EventBus::new();
        let mut screen = screen(&bus);
        run(&mut screen, 10);

        bus.emit(&TouchEnded {
            pos: Vec2::new(10.0, 10.0),
        });
        assert!(!screen.inner.stage.exec.is_empty());
        assert_eq!(screen.displayed_total(), None);
    }

    #[test]
    fn test_reveal_runs_to_the_end() {
        let bus = EventBus::new();
        let mut screen = screen(&bus);
        run(&mut screen, 60 * 10);

        assert_eq!(screen.displayed_total(), Some(80));
        assert!(!screen.inner.stage.canvas.has_running_tween());
        // 间隔很短的几项得分共用同一个 Tween，每一项都要播放完
        for id in ["score:forest0", "score:forest1", "score:path0", "score:2", "score:3"] {
            assert_settled(&screen.inner.stage.canvas, id);
        }
        for i in 0..3 {
            assert_settled(&screen.inner.stage.canvas, &format!("score:21-{i}"));
        }
    }
}
