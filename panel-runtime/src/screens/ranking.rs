//! 排行画面
//!
//! 从标题进入时只是浏览；本局进入前十时由结果画面进入，并高亮新的名次。

use std::any::Any;
use std::rc::Rc;
use tracing::debug;

use super::{HasStage, ScreenContext, Stage, on, setup_common_tweens, start_button_tween, wipe_out};
use crate::archive::{GameRecord, RANKING_SIZE};
use crate::task::Task;
use crate::ui::Drawer;

/// 排行画面的参数
#[derive(Debug, Clone, PartialEq)]
pub struct RankingArgs {
    /// 历史成绩（得分降序）
    pub games: Vec<GameRecord>,
    pub rank_in: bool,
    /// 本局的名次（0 起）
    pub ranking: Option<u32>,
}

impl RankingArgs {
    /// 从标题浏览
    pub fn view(games: Vec<GameRecord>) -> Self {
        Self {
            games,
            rank_in: false,
            ranking: None,
        }
    }

    /// 本局进入排行
    pub fn rank_in(games: Vec<GameRecord>, ranking: u32) -> Self {
        Self {
            games,
            rank_in: true,
            ranking: Some(ranking),
        }
    }

    /// 已有成绩
    pub fn has_records(&self) -> bool {
        !self.games.is_empty()
    }
}

#[derive(Debug)]
struct RankingInner {
    stage: Stage,
}

impl HasStage for RankingInner {
    fn stage(&self) -> &Stage {
        &self.stage
    }
}

/// 排行画面
#[derive(Debug)]
pub struct Ranking {
    inner: Rc<RankingInner>,
    args: RankingArgs,
}

impl Ranking {
    pub fn new(ctx: &ScreenContext, args: RankingArgs) -> Self {
        let params = &ctx.params.ranking;
        let inner = Rc::new(RankingInner {
            stage: Stage::new(ctx, &params.canvas),
        });
        let canvas = &inner.stage.canvas;

        let rows = args.games.len().min(RANKING_SIZE);
        for (i, game) in args.games.iter().take(rows).enumerate() {
            let label = params
                .ranking
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("{}", i + 1));
            let perfect = if game.perfect { " !" } else { "" };
            canvas.set_widget_text(&format!("rank{i}"), format!("{label}  {}{perfect}", game.score));
        }
        canvas.enable_widget("no-records", !args.has_records());

        if let Some(ranking) = args.ranking.filter(|_| args.rank_in) {
            if (ranking as usize) < rows {
                debug!(ranking, "新的排行");
                canvas.set_tween_target(&format!("rank{ranking}"), "rank-in", 0);
                canvas.start_tween("rank-in");
                inner.stage.sound("rank-in");
            }
        }

        on(&inner, "agree:touch_ended", |this| {
            wipe_out(this, "root", |this| this.stage.bus.notify("Ranking:Finished"));
        });
        setup_common_tweens(&inner, "agree");

        canvas.start_common_tween("root", "in-from-left");
        start_button_tween(&inner, ctx.params.ui.wipe.delay, 0.0, &["agree"]);

        Self { inner, args }
    }

    pub fn args(&self) -> &RankingArgs {
        &self.args
    }
}

impl Task for Ranking {
    fn name(&self) -> &'static str {
        "Ranking"
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
