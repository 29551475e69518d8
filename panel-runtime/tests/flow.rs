//! 画面迁移的端到端测试
//!
//! 只通过事件总线驱动 Core，用内存存档检查持久化结果。

use std::cell::RefCell;
use std::rc::Rc;

use panel_runtime::event::{GameFinish, ResultFinished, SettingsFinished, TouchBegan, TouchEnded};
use panel_runtime::screens::{Ranking, ResultScreen, Title, Tutorial};
use panel_runtime::{Archive, Core, EventBus, GameParams, GameRecord, MemoryStore, RecordingDrawer, Score, Vec2};

const DT: f64 = 1.0 / 60.0;

struct Harness {
    core: Core,
    store: MemoryStore,
    time: f64,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    fn with_store(store: MemoryStore) -> Self {
        let params = Rc::new(GameParams::builtin().unwrap());
        let bus = EventBus::new();
        let core = Core::new(params, &bus, Box::new(store.clone()));
        Self {
            core,
            store,
            time: 0.0,
        }
    }

    fn frame(&mut self) {
        self.core.update(self.time, DT);
        self.time += DT;
    }

    fn run(&mut self, seconds: f64) {
        let frames = (seconds / DT).ceil() as u32;
        for _ in 0..frames {
            self.frame();
        }
    }

    fn names(&self) -> Vec<&'static str> {
        self.core.tasks().task_names()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }

    fn tap(&self, pos: Vec2) {
        // 点击判定使用上一次绘制的矩形
        self.core.draw(&mut RecordingDrawer::new());
        let bus = self.core.bus();
        bus.emit(&TouchBegan { pos });
        bus.emit(&TouchEnded { pos });
    }
}

fn score(total_score: u32) -> Score {
    Score {
        total_score,
        total_ranking: 5,
        scores: vec![0, 3, 4, 0, 0, 0, 2],
        forest: vec![3, 4],
        path: vec![5],
        total_panels: 12,
        panel_turned_times: 8,
        panel_moved_times: 20,
        put_time: 1.5,
        ..Default::default()
    }
}

fn finish_game(harness: &Harness, total_score: u32) {
    harness.core.bus().emit(&GameFinish {
        score: score(total_score),
        no_panels: false,
        tutorial: false,
    });
}

#[test]
fn test_startup_tasks_and_counter() {
    // Debug 只在 debug 构建中启动
    let mut expected = vec!["Sound", "MainPart", "Intro"];
    if cfg!(debug_assertions) {
        expected.push("Debug");
    }

    let mut harness = Harness::new();
    assert!(harness.names().is_empty());
    assert_eq!(harness.core.tasks().pending_len(), expected.len());

    harness.frame();
    assert_eq!(harness.names(), expected);
    assert_eq!(harness.core.archive().record::<u32>("startup-times"), 1);
    assert!(harness.store.save_count() >= 1);

    // 第二次启动读取同一份存档
    let second = Harness::with_store(harness.store.clone());
    assert_eq!(second.core.archive().record::<u32>("startup-times"), 2);
}

#[test]
fn test_intro_finished_pushes_title_next_frame() {
    let mut harness = Harness::new();
    harness.frame();

    harness.core.bus().notify("Intro:finished");
    assert!(harness.position("Title").is_none());

    harness.frame();
    assert!(harness.position("Title").is_some());
    let first_boot = harness
        .core
        .tasks()
        .inspect::<Title, _>(|title| title.is_first_boot());
    assert_eq!(first_boot, Some(true));
}

#[test]
fn test_intro_times_out_into_title() {
    let mut harness = Harness::new();
    let finished = Rc::new(RefCell::new(0));
    let f = Rc::clone(&finished);
    harness
        .core
        .bus()
        .connect("Intro:finished", move |_, _| *f.borrow_mut() += 1);

    harness.run(3.0);
    assert_eq!(*finished.borrow(), 1);
    assert!(harness.position("Intro").is_none());
    assert!(harness.position("Title").is_some());
}

#[test]
fn test_title_pushes_game_main_then_tutorial() {
    let mut harness = Harness::new();
    harness.frame();
    assert!(!harness.core.archive().record::<bool>("tutorial-finish"));

    harness.core.bus().notify("Title:finished");
    assert!(harness.position("GameMain").is_none());

    harness.frame();
    let game_main = harness.position("GameMain").unwrap();
    let tutorial = harness.position("Tutorial").unwrap();
    assert!(game_main < tutorial);
}

#[test]
fn test_tutorial_skipped_once_finished() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Tutorial:Complete");
    assert!(harness.core.archive().record::<bool>("tutorial-finish"));

    harness.core.bus().notify("Title:finished");
    harness.frame();
    assert!(harness.position("GameMain").is_some());
    assert!(!harness.core.tasks().contains::<Tutorial>());
}

#[test]
fn test_tap_title_game_button() {
    let mut harness = Harness::new();
    // 等标题的按钮演出结束
    harness.run(5.0);
    assert!(harness.position("Title").is_some());

    // "game" 按钮：底边锚点向上 460
    harness.tap(Vec2::new(320.0, 500.0));
    harness.run(0.5);
    assert!(harness.position("GameMain").is_some());

    harness.run(1.0);
    assert!(harness.position("Title").is_none());
}

#[test]
fn test_settings_persisted_before_title() {
    let mut harness = Harness::new();
    harness.frame();
    let saves = harness.store.save_count();

    let store = harness.store.clone();
    let saves_seen = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&saves_seen);
    // 在 Core 之后订阅：此时存档应已写入
    harness
        .core
        .bus()
        .connect("Settings:Finished", move |_, _| *seen.borrow_mut() = Some(store.save_count()));

    harness.core.bus().emit(&SettingsFinished {
        bgm_enable: false,
        se_enable: true,
    });
    assert_eq!(*saves_seen.borrow(), Some(saves + 1));
    assert_eq!(harness.core.tasks().pending_len(), 1);

    {
        let archive = harness.core.archive();
        assert!(!archive.record::<bool>("bgm-enable"));
        assert!(archive.record::<bool>("se-enable"));
        assert!(archive.is_saved());
    }

    harness.frame();
    assert!(harness.position("Title").is_some());

    let reloaded = Archive::load(Box::new(harness.store.clone()), "1.0.0");
    assert!(!reloaded.record::<bool>("bgm-enable"));
}

#[test]
fn test_result_finished_rank_in_pushes_ranking() {
    let store = MemoryStore::new();
    {
        let mut archive = Archive::load(Box::new(store.clone()), "1.0.0");
        for score in [500, 400, 300, 200, 100] {
            archive.insert_game(GameRecord {
                score,
                ..Default::default()
            });
        }
        archive.save().unwrap();
    }

    let mut harness = Harness::with_store(store);
    harness.frame();
    harness.core.bus().emit(&ResultFinished {
        rank_in: true,
        ranking: 3,
    });
    harness.frame();

    let args = harness
        .core
        .tasks()
        .inspect::<Ranking, _>(|ranking| ranking.args().clone())
        .unwrap();
    assert!(args.rank_in);
    assert_eq!(args.ranking, Some(3));
    let scores: Vec<u32> = args.games.iter().map(|g| g.score).collect();
    assert_eq!(scores, vec![500, 400, 300, 200, 100]);
}

#[test]
fn test_result_finished_without_rank_in_pushes_title() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().emit(&ResultFinished {
        rank_in: false,
        ranking: 12,
    });
    harness.frame();
    assert!(harness.position("Title").is_some());
    assert!(harness.position("Ranking").is_none());
}

#[test]
fn test_game_finish_records_and_shows_result() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Tutorial:Complete");
    harness.core.bus().notify("Title:finished");
    harness.run(2.5);

    finish_game(&harness, 120);
    {
        let archive = harness.core.archive();
        assert_eq!(archive.record::<u32>("play-times"), 1);
        assert_eq!(archive.record::<u32>("total-panels"), 12);
        assert_eq!(archive.games().len(), 1);
        assert_eq!(archive.games()[0].score, 120);
        assert!((archive.record::<f64>("average-score") - 120.0).abs() < 1e-9);
    }

    harness.run(1.0);
    assert!(!harness.core.tasks().contains::<ResultScreen>());
    harness.run(1.2);
    assert!(harness.core.tasks().contains::<ResultScreen>());
    assert!(harness.position("GameMain").is_none());

    harness.run(10.0);
    let total = harness
        .core
        .tasks()
        .inspect::<ResultScreen, _>(|result| result.displayed_total());
    assert_eq!(total, Some(Some(120)));
}

#[test]
fn test_result_tap_skips_reveal() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Tutorial:Complete");
    finish_game(&harness, 80);
    harness.run(2.1);
    assert!(harness.core.tasks().contains::<ResultScreen>());

    let displayed = |harness: &Harness| {
        harness
            .core
            .tasks()
            .inspect::<ResultScreen, _>(|result| result.displayed_total())
            .flatten()
    };
    assert_eq!(displayed(&harness), None);

    harness.run(0.6);
    harness.core.bus().emit(&TouchEnded {
        pos: Vec2::new(10.0, 10.0),
    });
    assert_eq!(displayed(&harness), Some(80));
}

#[test]
fn test_abort_counts_and_returns_to_title() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Game:Aborted");
    assert_eq!(harness.core.archive().record::<u32>("abort-times"), 1);

    harness.frame();
    assert!(harness.position("Title").is_some());
}

#[test]
fn test_share_completed_counter() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Share:completed");
    harness.core.bus().notify("Share:completed");
    assert_eq!(harness.core.archive().record::<u32>("share-times"), 2);
    assert!(harness.core.archive().is_saved());
}

#[test]
fn test_tutorial_game_is_not_recorded() {
    let mut harness = Harness::new();
    harness.frame();
    harness.core.bus().notify("Title:finished");
    harness.run(2.5);

    harness.core.bus().emit(&GameFinish {
        score: score(60),
        no_panels: false,
        tutorial: true,
    });
    assert_eq!(harness.core.archive().record::<u32>("play-times"), 0);
    assert!(harness.core.archive().record::<bool>("tutorial-finish"));

    harness.run(3.0);
    assert!(!harness.core.tasks().contains::<ResultScreen>());
    assert!(harness.core.tasks().contains::<Tutorial>());

    harness.core.bus().notify("Tutorial:Finished");
    harness.frame();
    assert!(harness.position("Title").is_some());
}
