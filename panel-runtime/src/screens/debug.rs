//! 调试信息（只在调试构建中添加）

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

use crate::event::{ConnectionHolder, EventBus};
use crate::params::DebugParams;
use crate::task::Task;
use crate::ui::{Color, Drawer, Rect, TextAlign, TextStyle};

/// 帧率的统计区间（秒）
const FPS_INTERVAL: f64 = 1.0;

/// 帧数与帧率
#[derive(Debug)]
pub struct DebugTask {
    _holder: ConnectionHolder,
    rect: Rect,
    frames: u64,
    fps: f64,
    window_time: f64,
    window_frames: u32,
    info_count: Rc<Cell<u32>>,
}

impl DebugTask {
    pub fn new(bus: &EventBus, params: &DebugParams) -> Self {
        let holder = ConnectionHolder::new();
        let info_count = Rc::new(Cell::new(0));

        // 开放参数的诊断事件，原样记录
        let count = Rc::clone(&info_count);
        holder.add(bus.connect("Debug:info", move |_, args| {
            count.set(count.get() + 1);
            for (key, value) in args.iter() {
                debug!(key, value = ?value, "Debug:info");
            }
        }));

        Self {
            _holder: holder,
            rect: params.info_rect.unwrap_or(Rect::new(8.0, 8.0, 320.0, 40.0)),
            frames: 0,
            fps: 0.0,
            window_time: 0.0,
            window_frames: 0,
            info_count,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// 收到的 `Debug:info` 次数
    pub fn info_count(&self) -> u32 {
        self.info_count.get()
    }

    fn text(&self) -> String {
        format!("frame {} / {:.1} fps", self.frames, self.fps)
    }
}

impl Task for DebugTask {
    fn name(&self) -> &'static str {
        "Debug"
    }

    fn update(&mut self, _current_time: f64, delta_time: f64) -> bool {
        self.frames += 1;
        self.window_frames += 1;
        self.window_time += delta_time;
        if self.window_time >= FPS_INTERVAL {
            self.fps = f64::from(self.window_frames) / self.window_time;
            self.window_time = 0.0;
            self.window_frames = 0;
        }
        true
    }

    fn draw(&self, drawer: &mut dyn Drawer) {
        let style = TextStyle {
            size: 16.0,
            align: TextAlign::Left,
        };
        drawer.draw_text(self.rect, &self.text(), &style, Color::WHITE);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Arguments;
    use crate::ui::RecordingDrawer;

    #[test]
    fn test_fps_and_overlay() {
        let bus = EventBus::new();
        let mut task = DebugTask::new(&bus, &DebugParams::default());
        // 累加误差可能让第 60 帧差一点不到 1 秒
        for i in 0..61 {
            assert!(task.update(f64::from(i) / 60.0, 1.0 / 60.0));
        }
        assert_eq!(task.frames(), 61);
        assert!((task.fps() - 60.0).abs() < 0.5);

        let mut drawer = RecordingDrawer::new();
        task.draw(&mut drawer);
        assert!(drawer.find_text("frame 61 / 60.0 fps").is_some());
    }

    #[test]
    fn test_debug_info_is_counted() {
        let bus = EventBus::new();
        let task = DebugTask::new(&bus, &DebugParams::default());
        bus.signal("Debug:info", &Arguments::new().with("tasks", 3u32));
        assert_eq!(task.info_count(), 1);
    }
}
