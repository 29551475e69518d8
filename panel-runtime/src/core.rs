//! # Core
//!
//! 根对象。持有事件总线的根生命周期、Task 容器与存档，
//! 并以「事件名 → 处理器」的形式实现画面迁移：
//!
//! ```text
//! Intro ─► Title ─┬─► GameMain (+ Tutorial) ─┬─► Result ─┬─► Ranking ─► Title
//!                 │                          │           └─► Title
//!                 │                          └─(中断)─► Title
//!                 ├─► Credits  ─► Title
//!                 ├─► Settings ─► Title
//!                 ├─► Records  ─► Title
//!                 └─► Ranking  ─► Title
//! ```
//!
//! 每个处理器只做三件事：读取事件参数，必要时修改并保存存档，把下一个画面放进容器。
//! 只有 Core 写存档。

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::archive::{Archive, ArchiveStore, ArchiveView, GameRecord};
use crate::error::ArchiveError;
use crate::event::{
    Arguments, Connection, ConnectionHolder, EventBus, FrameUpdate, Message, RecordScore,
    ResultBegin, ResultFinished, SettingsChanged, SettingsFinished,
};
use crate::params::GameParams;
use crate::screens::{
    Credits, DebugTask, GameMain, Intro, MainPart, Ranking, RankingArgs, Records, RecordsDetail,
    ResultScreen, ScreenContext, Settings, SettingsDetail, Sound, Title, Tutorial,
};
use crate::task::{Task, TaskContainer};
use crate::ui::Drawer;

#[derive(Debug)]
struct CoreInner {
    ctx: ScreenContext,
    tasks: TaskContainer,
    archive: Rc<RefCell<Archive>>,
}

impl CoreInner {
    fn push(&self, task: impl Task) {
        self.tasks.push_back(Box::new(task));
    }

    /// 修改存档并立即保存
    ///
    /// 写入失败只记录警告，游戏继续（下次保存时重试）。
    fn modify_archive(&self, what: &str, f: impl FnOnce(&mut Archive) -> Result<(), ArchiveError>) {
        let mut archive = self.archive.borrow_mut();
        if let Err(e) = f(&mut archive).and_then(|()| archive.save()) {
            warn!(what, error = %e, "存档更新失败");
        }
    }

    fn is_saved(&self) -> bool {
        self.archive.borrow().is_saved()
    }

    fn title(&self, first_boot: bool) {
        self.push(Title::new(&self.ctx, first_boot, self.is_saved()));
    }

    fn ranking_games(&self) -> Vec<GameRecord> {
        self.archive.borrow().games().to_vec()
    }

    fn needs_tutorial(&self) -> bool {
        let forced = cfg!(debug_assertions) && self.ctx.params.debug.force_tutorial;
        forced || !self.archive.borrow().record::<bool>("tutorial-finish")
    }
}

/// 根对象
#[derive(Debug)]
pub struct Core {
    inner: Rc<CoreInner>,
    holder: ConnectionHolder,
}

impl Core {
    /// 创建并放入初始 Task（Sound、MainPart、Intro，调试构建另加 DebugTask）
    pub fn new(params: Rc<GameParams>, bus: &EventBus, store: Box<dyn ArchiveStore>) -> Self {
        let archive = Archive::load(store, &params.app.version);
        let inner = Rc::new(CoreInner {
            ctx: ScreenContext::new(bus, Rc::clone(&params)),
            tasks: TaskContainer::new(),
            archive: Rc::new(RefCell::new(archive)),
        });
        let core = Self {
            inner,
            holder: ConnectionHolder::new(),
        };

        core.setup_frame();
        core.setup_title_transitions();
        core.setup_game_transitions();
        core.startup();
        core
    }

    /// 订阅无参数的迁移事件
    fn on(&self, event: &'static str, f: impl Fn(&CoreInner) + 'static) {
        let weak = Rc::downgrade(&self.inner);
        self.holder.add(self.inner.ctx.bus.connect(event, move |_, _| {
            if let Some(inner) = weak.upgrade() {
                debug!(event, "迁移");
                f(&inner);
            }
        }));
    }

    /// 订阅带参数的迁移事件
    fn on_message<M: Message>(&self, f: impl Fn(&CoreInner, M) + 'static) {
        let weak = Rc::downgrade(&self.inner);
        self.holder.add(self.inner.ctx.bus.subscribe::<M, _>(move |_: &Connection, message| {
            if let Some(inner) = weak.upgrade() {
                debug!(event = M::NAME, "迁移");
                f(&inner, message);
            }
        }));
    }

    fn setup_frame(&self) {
        self.on_message::<FrameUpdate>(|core, frame| {
            core.tasks.update(frame.current_time, frame.delta_time);
        });
    }

    fn setup_title_transitions(&self) {
        self.on("Intro:finished", |core| core.title(true));

        self.on("Title:finished", |core| {
            core.push(GameMain::new(&core.ctx));
            if core.needs_tutorial() {
                info!("进入教程");
                core.push(Tutorial::new(&core.ctx));
            }
        });

        self.on("Credits:begin", |core| core.push(Credits::new(&core.ctx)));
        self.on("Credits:Finished", |core| core.title(false));

        self.on("Settings:begin", |core| {
            let detail = {
                let archive = core.archive.borrow();
                SettingsDetail {
                    bgm_enable: archive.record("bgm-enable"),
                    se_enable: archive.record("se-enable"),
                }
            };
            core.push(Settings::new(&core.ctx, detail));
        });
        self.on_message::<SettingsFinished>(|core, message| {
            core.modify_archive("settings", |archive| {
                archive.set_record("bgm-enable", message.bgm_enable)?;
                archive.set_record("se-enable", message.se_enable)
            });
            core.title(false);
        });

        self.on("Records:begin", |core| {
            let detail = RecordsDetail::from_archive(&core.archive.borrow());
            core.push(Records::new(&core.ctx, &detail));
        });
        self.on("Records:Finished", |core| core.title(false));

        self.on("Ranking:begin", |core| {
            let args = RankingArgs::view(core.ranking_games());
            core.push(Ranking::new(&core.ctx, args));
        });
        self.on("Ranking:Finished", |core| core.title(false));
    }

    fn setup_game_transitions(&self) {
        self.on("Game:Aborted", |core| {
            core.modify_archive("abort", |archive| archive.add_record("abort-times", 1).map(drop));
            core.title(false);
        });

        self.on_message::<RecordScore>(|core, message| {
            core.modify_archive("game", |archive| {
                let position = archive.record_game(&message.score)?;
                info!(score = message.score.total_score, ?position, "记录成绩");
                Ok(())
            });
        });

        self.on_message::<ResultBegin>(|core, message| {
            core.push(ResultScreen::new(&core.ctx, message));
        });

        self.on_message::<ResultFinished>(|core, message| {
            if message.rank_in {
                let args = RankingArgs::rank_in(core.ranking_games(), message.ranking);
                core.push(Ranking::new(&core.ctx, args));
            } else {
                core.title(false);
            }
        });

        self.on("Tutorial:Complete", |core| {
            core.modify_archive("tutorial", |archive| archive.set_record("tutorial-finish", true));
        });
        self.on("Tutorial:Finished", |core| core.title(false));

        self.on("Share:completed", |core| {
            core.modify_archive("share", |archive| archive.add_record("share-times", 1).map(drop));
        });
    }

    fn startup(&self) {
        let inner = &self.inner;
        inner.modify_archive("startup", |archive| archive.add_record("startup-times", 1).map(drop));

        let (bgm_enable, se_enable) = {
            let archive = inner.archive.borrow();
            (archive.record::<bool>("bgm-enable"), archive.record::<bool>("se-enable"))
        };
        info!(bgm_enable, se_enable, "启动");

        let params = &inner.ctx.params;
        let bus = &inner.ctx.bus;
        inner.push(Sound::new(bus, &params.sound, bgm_enable, se_enable));
        inner.push(MainPart::new(
            bus,
            ArchiveView::new(Rc::clone(&inner.archive)),
            params.main.result_delay,
        ));
        inner.push(Intro::new(&inner.ctx));
        if cfg!(debug_assertions) {
            inner.push(DebugTask::new(bus, &params.debug));
        }

        // Sound 已经订阅，这里广播当前设置
        bus.emit(&SettingsChanged {
            bgm_enable,
            se_enable,
        });
    }

    /// 推进一帧（发出 `update` 事件）
    pub fn update(&self, current_time: f64, delta_time: f64) {
        self.bus().emit(&FrameUpdate {
            current_time,
            delta_time,
        });
    }

    /// 按顺序绘制所有 Task
    pub fn draw(&self, drawer: &mut dyn Drawer) {
        self.inner.tasks.draw(drawer);
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.ctx.bus
    }

    pub fn params(&self) -> &GameParams {
        &self.inner.ctx.params
    }

    pub fn tasks(&self) -> &TaskContainer {
        &self.inner.tasks
    }

    /// 存档的只读引用
    pub fn archive(&self) -> Ref<'_, Archive> {
        self.inner.archive.borrow()
    }

    /// 向总线发送诊断信息
    pub fn debug_info(&self) {
        let args = Arguments::new()
            .with("tasks", self.inner.tasks.len() as u32)
            .with("connections", self.bus().connection_count() as u32);
        self.bus().signal("Debug:info", &args);
    }
}
