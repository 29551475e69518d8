//! # Audio 模块
//!
//! 无窗口运行时的音频后端：订阅 `Audio:*` 命令，只写日志并记下当前状态。

use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

use panel_runtime::event::{AudioBgm, AudioSe};
use panel_runtime::{ConnectionHolder, EventBus};

#[derive(Debug, Default)]
struct AudioState {
    current_bgm: Option<String>,
    se_played: u32,
    history: Vec<String>,
}

/// 记录音频命令的后端
#[derive(Debug)]
pub struct AudioLog {
    state: Rc<RefCell<AudioState>>,
    _holder: ConnectionHolder,
}

impl AudioLog {
    pub fn new(bus: &EventBus) -> Self {
        let state = Rc::new(RefCell::new(AudioState::default()));
        let holder = ConnectionHolder::new();

        let s = Rc::clone(&state);
        holder.add(bus.subscribe::<AudioSe, _>(move |_, m| {
            info!(file = %m.name, "播放音效");
            let mut state = s.borrow_mut();
            state.se_played += 1;
            state.history.push(format!("se {}", m.name));
        }));

        let s = Rc::clone(&state);
        holder.add(bus.subscribe::<AudioBgm, _>(move |_, m| {
            info!(file = %m.name, "播放 BGM");
            let mut state = s.borrow_mut();
            state.current_bgm = Some(m.name.clone());
            state.history.push(format!("bgm {}", m.name));
        }));

        let s = Rc::clone(&state);
        holder.add(bus.connect("Audio:bgm-stop", move |_, _| {
            let mut state = s.borrow_mut();
            if let Some(file) = state.current_bgm.take() {
                info!(%file, "停止 BGM");
            }
            state.history.push("bgm-stop".to_string());
        }));

        Self {
            state,
            _holder: holder,
        }
    }

    /// 正在播放的 BGM
    pub fn current_bgm(&self) -> Option<String> {
        self.state.borrow().current_bgm.clone()
    }

    /// 已播放的音效数
    pub fn se_played(&self) -> u32 {
        self.state.borrow().se_played
    }

    /// 收到的全部命令
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }
}
