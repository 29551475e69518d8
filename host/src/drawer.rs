//! # Drawer 模块
//!
//! 无窗口运行时的渲染后端：每条绘制命令写一条 `trace` 日志，
//! 每帧结束写一条 `debug` 摘要。

use tracing::{debug, trace};

use panel_runtime::ui::{DrawCommand, TextStyle};
use panel_runtime::{Color, Drawer, Rect};

/// 把绘制命令写进日志的 Drawer
#[derive(Debug, Default)]
pub struct TracingDrawer {
    frame: u64,
    commands: usize,
    texts: Vec<String>,
    total_commands: u64,
}

impl TracingDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新的一帧
    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
        self.commands = 0;
        self.texts.clear();
    }

    /// 结束当前帧并输出摘要
    pub fn end_frame(&mut self) {
        debug!(
            frame = self.frame,
            commands = self.commands,
            texts = self.texts.len(),
            "绘制完成"
        );
    }

    /// 当前帧的命令数
    pub fn commands(&self) -> usize {
        self.commands
    }

    /// 当前帧画出的文字
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn total_commands(&self) -> u64 {
        self.total_commands
    }

    fn record(&mut self, command: DrawCommand) {
        // 完全透明的命令不计
        if command.color().a <= 0.0 {
            return;
        }
        trace!(frame = self.frame, "{}", command);
        if let DrawCommand::Text { text, .. } = &command {
            self.texts.push(text.clone());
        }
        self.commands += 1;
        self.total_commands += 1;
    }
}

impl Drawer for TracingDrawer {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.record(DrawCommand::FillRect { rect, color });
    }

    fn draw_text(&mut self, rect: Rect, text: &str, style: &TextStyle, color: Color) {
        self.record(DrawCommand::Text {
            rect,
            text: text.to_string(),
            size: style.size,
            align: style.align,
            color,
        });
    }

    fn draw_image(&mut self, rect: Rect, image: &str, color: Color) {
        self.record(DrawCommand::Image {
            rect,
            image: image.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_counters() {
        let mut drawer = TracingDrawer::new();
        drawer.begin_frame(1);
        drawer.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        drawer.draw_text(
            Rect::new(0.0, 0.0, 100.0, 20.0),
            "hello",
            &TextStyle::default(),
            Color::WHITE,
        );
        drawer.draw_image(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            "panel.png",
            Color::new(1.0, 1.0, 1.0, 0.0),
        );
        drawer.end_frame();
        assert_eq!(drawer.commands(), 2);
        assert_eq!(drawer.texts(), ["hello".to_string()]);

        drawer.begin_frame(2);
        assert_eq!(drawer.commands(), 0);
        assert!(drawer.texts().is_empty());
        assert_eq!(drawer.total_commands(), 2);
    }
}
