//! # App 模块
//!
//! 固定步长的帧循环：
//!
//! ```text
//! 每帧：注入到期的回放事件 → Core::update（"update" 事件）→ Core::draw
//! ```

use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

use panel_runtime::event::{SharePost, ShareResult};
use panel_runtime::{Archive, ConnectionHolder, Core, EventBus, GameParams, Value, Vec2};

use crate::audio::AudioLog;
use crate::config::AppConfig;
use crate::drawer::TracingDrawer;
use crate::error::{HostError, HostResult};
use crate::replay::{ReplayEvent, ReplayScript};
use crate::store::FileStore;

/// 触摸事件（参数 `pos` 按窗口像素给出）
const TOUCH_EVENTS: [&str; 3] = ["touch_began", "touch_moved", "touch_ended"];

/// 读取参数表
///
/// 没有配置路径时使用内置参数表。
pub fn load_params(path: Option<&Path>) -> HostResult<GameParams> {
    let Some(path) = path else {
        return GameParams::builtin().map_err(|source| HostError::Params {
            path: "<builtin>".into(),
            source,
        });
    };
    let text = std::fs::read_to_string(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let params = GameParams::from_json(&text).map_err(|source| HostError::Params {
        path: path.to_path_buf(),
        source,
    })?;
    info!(?path, "参数表加载成功");
    Ok(params)
}

/// 运行结果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub time: f64,
    pub tasks: Vec<&'static str>,
    pub draw_commands: u64,
    pub replay_remaining: usize,
}

/// 无窗口宿主
pub struct HostApp {
    core: Core,
    store: FileStore,
    drawer: TracingDrawer,
    audio: AudioLog,
    replay: ReplayScript,
    _holder: ConnectionHolder,

    frame_time: f64,
    frame: u64,
    time: f64,
    /// 窗口像素 → 画面坐标
    touch_scale: Vec2,
}

impl HostApp {
    pub fn new(config: &AppConfig, params: GameParams, replay: Option<ReplayScript>) -> Self {
        let camera = params.ui.camera.size;
        let touch_scale = Vec2::new(
            camera.x / config.window.width as f32,
            camera.y / config.window.height as f32,
        );
        let share = params.platform.share;

        let bus = EventBus::new();
        let audio = AudioLog::new(&bus);
        let store = FileStore::new(&config.saves_dir);
        let core = Core::new(Rc::new(params), &bus, Box::new(store.clone()));

        // 没有真正的分享平台，直接回复成功
        let holder = ConnectionHolder::new();
        if share {
            let reply = bus.clone();
            holder.add(bus.subscribe::<SharePost, _>(move |_, post| {
                info!(text = %post.text, "分享");
                reply.emit(&ShareResult { completed: true });
            }));
        }

        info!(
            saves = ?store.path(),
            fps = config.fps,
            replay = replay.as_ref().map_or(0, ReplayScript::len),
            "宿主启动"
        );

        Self {
            core,
            store,
            drawer: TracingDrawer::new(),
            audio,
            replay: replay.unwrap_or_default(),
            _holder: holder,
            frame_time: config.frame_time(),
            frame: 0,
            time: 0.0,
            touch_scale,
        }
    }

    /// 推进一帧
    pub fn step(&mut self) {
        let due: Vec<ReplayEvent> = self.replay.due(self.time).to_vec();
        for event in &due {
            self.inject(event);
        }

        self.core.update(self.time, self.frame_time);

        self.frame += 1;
        self.drawer.begin_frame(self.frame);
        self.core.draw(&mut self.drawer);
        self.drawer.end_frame();

        self.time += self.frame_time;
    }

    /// 运行指定帧数
    pub fn run(&mut self, frames: u64) -> RunSummary {
        for _ in 0..frames {
            self.step();
        }
        self.core.debug_info();
        let summary = self.summary();
        info!(
            frames = summary.frames,
            time = summary.time,
            tasks = ?summary.tasks,
            "运行结束"
        );
        summary
    }

    fn inject(&self, event: &ReplayEvent) {
        let mut args = event.to_arguments();
        if TOUCH_EVENTS.contains(&event.event.as_str())
            && let Some(Value::Vec2(pos)) = args.raw("pos").cloned()
        {
            args.insert("pos", pos * self.touch_scale);
        }
        debug!(time = self.time, event = %event.event, "回放");
        self.core.bus().signal(&event.event, &args);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frame,
            time: self.time,
            tasks: self.core.tasks().task_names(),
            draw_commands: self.drawer.total_commands(),
            replay_remaining: self.replay.remaining(),
        }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn archive(&self) -> std::cell::Ref<'_, Archive> {
        self.core.archive()
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn drawer(&self) -> &TracingDrawer {
        &self.drawer
    }

    pub fn audio(&self) -> &AudioLog {
        &self.audio
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}
