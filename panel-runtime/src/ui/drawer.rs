//! # Drawer 模块
//!
//! 渲染后端的边界。Widget 只把最终的矩形、颜色（已乘入透明度）交给 Drawer，
//! 具体怎么画由宿主决定。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Color, Rect};

/// 文字对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// 文字样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// 字号
    pub size: f32,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 24.0,
            align: TextAlign::Center,
        }
    }
}

/// 渲染后端
pub trait Drawer {
    /// 填充矩形
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// 绘制文字
    fn draw_text(&mut self, rect: Rect, text: &str, style: &TextStyle, color: Color);

    /// 绘制图片
    fn draw_image(&mut self, rect: Rect, image: &str, color: Color);

    /// 调试用边框（默认不画）
    fn stroke_rect(&mut self, _rect: Rect, _color: Color) {}
}

/// 一条绘制命令
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    Text {
        rect: Rect,
        text: String,
        size: f32,
        align: TextAlign,
        color: Color,
    },
    Image {
        rect: Rect,
        image: String,
        color: Color,
    },
    Stroke {
        rect: Rect,
        color: Color,
    },
}

impl DrawCommand {
    pub fn rect(&self) -> Rect {
        match self {
            DrawCommand::FillRect { rect, .. }
            | DrawCommand::Text { rect, .. }
            | DrawCommand::Image { rect, .. }
            | DrawCommand::Stroke { rect, .. } => *rect,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            DrawCommand::FillRect { color, .. }
            | DrawCommand::Text { color, .. }
            | DrawCommand::Image { color, .. }
            | DrawCommand::Stroke { color, .. } => *color,
        }
    }
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rect();
        let rect = format!("[{:.1}, {:.1}, {:.1}, {:.1}]", r.x1, r.y1, r.x2, r.y2);
        let alpha = self.color().a;
        match self {
            DrawCommand::FillRect { .. } => write!(f, "rect  {rect} a={alpha:.2}"),
            DrawCommand::Text { text, .. } => write!(f, "text  {rect} a={alpha:.2} {text:?}"),
            DrawCommand::Image { image, .. } => write!(f, "image {rect} a={alpha:.2} {image}"),
            DrawCommand::Stroke { .. } => write!(f, "frame {rect}"),
        }
    }
}

/// 记录绘制命令的 Drawer（测试与调试用）
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingDrawer {
    pub commands: Vec<DrawCommand>,
    /// 是否记录调试边框
    #[serde(skip)]
    pub record_frames: bool,
}

impl RecordingDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// 每行一条命令的文本形式
    pub fn to_text(&self) -> String {
        self.commands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 指定文字的命令
    pub fn find_text(&self, text: &str) -> Option<&DrawCommand> {
        self.commands
            .iter()
            .find(|c| matches!(c, DrawCommand::Text { text: t, .. } if t == text))
    }
}

impl Drawer for RecordingDrawer {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_text(&mut self, rect: Rect, text: &str, style: &TextStyle, color: Color) {
        self.commands.push(DrawCommand::Text {
            rect,
            text: text.to_string(),
            size: style.size,
            align: style.align,
            color,
        });
    }

    fn draw_image(&mut self, rect: Rect, image: &str, color: Color) {
        self.commands.push(DrawCommand::Image {
            rect,
            image: image.to_string(),
            color,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        if self.record_frames {
            self.commands.push(DrawCommand::Stroke { rect, color });
        }
    }
}
