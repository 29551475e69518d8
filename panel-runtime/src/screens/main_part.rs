//! 后台的本局流程控制
//!
//! 收到 `Game:Finish` 后从存档计算名次，请求 Core 记录成绩（`Game:Record`），
//! `main.result_delay` 秒后进入结果画面（`Result:begin`）。
//! 教程局不计成绩。

use std::any::Any;
use std::rc::Rc;
use tracing::{debug, info};

use crate::archive::{ArchiveView, RANKING_SIZE, ranking_position};
use crate::count_exec::CountExec;
use crate::event::{ConnectionHolder, EventBus, GameFinish, RecordScore, ResultBegin};
use crate::task::Task;

#[derive(Debug)]
struct MainPartInner {
    bus: EventBus,
    holder: ConnectionHolder,
    exec: CountExec,
    archive: ArchiveView,
    result_delay: f64,
}

impl MainPartInner {
    fn finish_game(self: &Rc<Self>, message: GameFinish) {
        if message.tutorial {
            debug!("教程局，不记录成绩");
            return;
        }

        let score = message.score;
        let (position, high_score) = {
            let archive = self.archive.borrow();
            let games = archive.games();
            let high_score = games.first().is_none_or(|top| score.total_score > top.score);
            (ranking_position(games, score.total_score), high_score)
        };
        let rank_in = position < RANKING_SIZE;
        info!(
            score = score.total_score,
            position, rank_in, high_score, "本局结束"
        );

        self.bus.emit(&RecordScore {
            score: score.clone(),
        });

        let begin = ResultBegin {
            rank_in,
            ranking: position as u32,
            high_score,
            score,
            tutorial: false,
        };
        let weak = Rc::downgrade(self);
        self.exec.add(self.result_delay, move || {
            if let Some(this) = weak.upgrade() {
                this.bus.emit(&begin);
            }
        });
    }
}

/// 后台 Task（一直存活）
#[derive(Debug)]
pub struct MainPart {
    inner: Rc<MainPartInner>,
}

impl MainPart {
    pub fn new(bus: &EventBus, archive: ArchiveView, result_delay: f64) -> Self {
        let inner = Rc::new(MainPartInner {
            bus: bus.clone(),
            holder: ConnectionHolder::new(),
            exec: CountExec::new(),
            archive,
            result_delay,
        });

        let weak = Rc::downgrade(&inner);
        inner.holder.add(bus.subscribe::<GameFinish, _>(move |_, message| {
            if let Some(this) = weak.upgrade() {
                this.finish_game(message);
            }
        }));

        Self { inner }
    }
}

impl Task for MainPart {
    fn name(&self) -> &'static str {
        "MainPart"
    }

    fn update(&mut self, _current_time: f64, delta_time: f64) -> bool {
        self.inner.exec.update(delta_time);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{Archive, GameRecord, MemoryStore, Score};
    use std::cell::RefCell;

    fn archive_with(scores: &[u32]) -> Rc<RefCell<Archive>> {
        let mut archive = Archive::load(Box::new(MemoryStore::new()), "1.0.0");
        for &score in scores {
            archive.insert_game(GameRecord {
                score,
                ..Default::default()
            });
        }
        Rc::new(RefCell::new(archive))
    }

    fn finish(bus: &EventBus, total_score: u32, tutorial: bool) {
        bus.emit(&GameFinish {
            score: Score {
                total_score,
                ..Default::default()
            },
            no_panels: false,
            tutorial,
        });
    }

    #[test]
    fn test_result_begin_after_delay() {
        let bus = EventBus::new();
        let archive = archive_with(&[300, 200, 100]);
        let mut task = MainPart::new(&bus, ArchiveView::new(archive), 2.0);

        let recorded = Rc::new(RefCell::new(Vec::new()));
        let begins = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&recorded);
        let _c1 = bus.subscribe::<RecordScore, _>(move |_, m| r.borrow_mut().push(m.score.total_score));
        let b = Rc::clone(&begins);
        let _c2 = bus.subscribe::<ResultBegin, _>(move |_, m| b.borrow_mut().push(m));

        finish(&bus, 250, false);
        assert_eq!(*recorded.borrow(), vec![250]);
        assert!(begins.borrow().is_empty());

        task.update(0.0, 1.0);
        assert!(begins.borrow().is_empty());
        assert!(task.update(1.0, 1.0));

        let begins = begins.borrow();
        assert_eq!(begins.len(), 1);
        assert!(begins[0].rank_in);
        assert_eq!(begins[0].ranking, 1);
        assert!(!begins[0].high_score);
    }

    #[test]
    fn test_high_score_on_empty_history() {
        let bus = EventBus::new();
        let mut task = MainPart::new(&bus, ArchiveView::new(archive_with(&[])), 0.0);

        let begins = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::clone(&begins);
        let _c = bus.subscribe::<ResultBegin, _>(move |_, m| b.borrow_mut().push(m));

        finish(&bus, 0, false);
        task.update(0.0, 0.0);

        let begins = begins.borrow();
        assert!(begins[0].high_score);
        assert!(begins[0].rank_in);
        assert_eq!(begins[0].ranking, 0);
    }

    #[test]
    fn test_out_of_ranking() {
        let bus = EventBus::new();
        let scores: Vec<u32> = (1..=10).map(|i| i * 100).collect();
        let mut task = MainPart::new(&bus, ArchiveView::new(archive_with(&scores)), 0.0);

        let begins = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::clone(&begins);
        let _c = bus.subscribe::<ResultBegin, _>(move |_, m| b.borrow_mut().push(m));

        finish(&bus, 50, false);
        task.update(0.0, 0.0);
        assert!(!begins.borrow()[0].rank_in);
    }

    #[test]
    fn test_tutorial_game_is_ignored() {
        let bus = EventBus::new();
        let mut task = MainPart::new(&bus, ArchiveView::new(archive_with(&[])), 0.0);

        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _c = bus.subscribe::<RecordScore, _>(move |_, _| *c.borrow_mut() += 1);

        finish(&bus, 500, true);
        task.update(0.0, 1.0);
        assert_eq!(*count.borrow(), 0);
    }
}
