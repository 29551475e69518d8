//! 音频控制
//!
//! 把画面发出的音效名换成文件名交给音频后端：
//!
//! - `UI:sound` → `Audio:se`
//! - `BGM:play` → `Audio:bgm`
//! - `BGM:stop` → `Audio:bgm-stop`
//!
//! `Settings:Changed` 实时切换开关。关闭 BGM 时立即停止，重新打开时接着播放当前曲目。

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

use crate::event::{
    AudioBgm, AudioSe, BgmPlay, Connection, ConnectionHolder, EventBus, SettingsChanged, UiSound,
};
use crate::params::SoundParams;
use crate::task::Task;

#[derive(Debug)]
struct SoundInner {
    bus: EventBus,
    holder: ConnectionHolder,
    se: BTreeMap<String, String>,
    bgm: BTreeMap<String, String>,

    bgm_enable: Cell<bool>,
    se_enable: Cell<bool>,
    current_bgm: RefCell<Option<String>>,
}

impl SoundInner {
    fn play_se(&self, name: &str) {
        if !self.se_enable.get() {
            return;
        }
        match self.se.get(name) {
            Some(file) => self.bus.emit(&AudioSe { name: file.clone() }),
            None => warn!(name, "未知的音效"),
        }
    }

    fn play_bgm(&self, name: &str) {
        let Some(file) = self.bgm.get(name) else {
            warn!(name, "未知的 BGM");
            return;
        };
        *self.current_bgm.borrow_mut() = Some(file.clone());
        if self.bgm_enable.get() {
            self.bus.emit(&AudioBgm { name: file.clone() });
        }
    }

    fn stop_bgm(&self) {
        self.current_bgm.borrow_mut().take();
        self.bus.notify("Audio:bgm-stop");
    }

    fn change_settings(&self, bgm_enable: bool, se_enable: bool) {
        debug!(bgm_enable, se_enable, "音频设置");
        self.se_enable.set(se_enable);

        let was_enabled = self.bgm_enable.replace(bgm_enable);
        if was_enabled == bgm_enable {
            return;
        }
        if !bgm_enable {
            self.bus.notify("Audio:bgm-stop");
        } else if let Some(file) = self.current_bgm.borrow().clone() {
            self.bus.emit(&AudioBgm { name: file });
        }
    }
}

fn handler<M: 'static>(
    weak: &Weak<SoundInner>,
    f: impl Fn(&SoundInner, M) + 'static,
) -> impl Fn(&Connection, M) + 'static {
    let weak = weak.clone();
    move |_, message| {
        if let Some(this) = weak.upgrade() {
            f(&this, message);
        }
    }
}

/// 音频控制 Task（一直存活）
#[derive(Debug)]
pub struct Sound {
    inner: Rc<SoundInner>,
}

impl Sound {
    pub fn new(bus: &EventBus, params: &SoundParams, bgm_enable: bool, se_enable: bool) -> Self {
        let inner = Rc::new(SoundInner {
            bus: bus.clone(),
            holder: ConnectionHolder::new(),
            se: params.se.clone(),
            bgm: params.bgm.clone(),
            bgm_enable: Cell::new(bgm_enable),
            se_enable: Cell::new(se_enable),
            current_bgm: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let holder = &inner.holder;
        holder.add(bus.subscribe::<SettingsChanged, _>(handler(&weak, |this, m: SettingsChanged| {
            this.change_settings(m.bgm_enable, m.se_enable);
        })));
        holder.add(bus.subscribe::<UiSound, _>(handler(&weak, |this, m: UiSound| {
            this.play_se(&m.name);
        })));
        holder.add(bus.subscribe::<BgmPlay, _>(handler(&weak, |this, m: BgmPlay| {
            this.play_bgm(&m.name);
        })));
        let stop = weak.clone();
        holder.add(bus.connect("BGM:stop", move |_, _| {
            if let Some(this) = stop.upgrade() {
                this.stop_bgm();
            }
        }));

        Self { inner }
    }

    pub fn bgm_enable(&self) -> bool {
        self.inner.bgm_enable.get()
    }

    pub fn se_enable(&self) -> bool {
        self.inner.se_enable.get()
    }
}

impl Task for Sound {
    fn name(&self) -> &'static str {
        "Sound"
    }

    fn update(&mut self, _current_time: f64, _delta_time: f64) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
