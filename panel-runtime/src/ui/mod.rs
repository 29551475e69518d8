//! # UI 模块
//!
//! 声明式、数据驱动的画面 UI。
//!
//! ## 核心概念
//!
//! - `Widget`: 树节点，持有几何状态、显示/交互开关和一个绘制部件
//! - `Canvas`: 一个画面的 Widget 树，按标识符查找，管理 Tween 并转发触摸
//! - `Tween`: 按名字启动的参数动画序列
//! - `Drawer`: 渲染后端的边界
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let canvas = Canvas::new(&bus, &params.title.canvas, common, camera, false)?;
//! canvas.set_widget_text("version", "1.0.0");
//! canvas.start_tween("start");
//!
//! // 每帧
//! canvas.update(delta_time);
//! canvas.draw(&mut drawer);
//! ```

mod animation;
mod base;
mod canvas;
mod drawer;
mod easing;
mod geometry;
mod param;
mod tween;
mod widget;

// 基础类型
pub use geometry::{Color, Rect, Vec2, Vec3};

// 动画
pub use animation::{Animation, AnimationState};
pub use easing::EasingFunction;
pub use tween::{TargetDesc, TrackDesc, TweenCommon, TweenDesc};

// Widget 与 Canvas
pub use base::{BaseDesc, Blank, Image, Rectangle, Text, WidgetBase};
pub use canvas::{Canvas, CanvasDesc};
pub use param::{GeometryParam, ParamType, ParamValue};
pub use widget::{Widget, WidgetDesc};

// 渲染
pub use drawer::{DrawCommand, Drawer, RecordingDrawer, TextAlign, TextStyle};
