//! # Base 模块
//!
//! Widget 的绘制部件。每个 Widget 恰好持有一个，几何参数以外的参数名都由它解释。

use serde::Deserialize;
use std::fmt;

use super::param::{ParamType, ParamValue};
use super::{Color, Drawer, Rect, TextAlign, TextStyle};
use crate::error::UiError;

/// 绘制部件
pub trait WidgetBase: fmt::Debug {
    /// 种类名（错误信息用）
    fn kind(&self) -> &'static str;

    /// 设置参数
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), UiError>;

    /// 读取参数
    fn get_param(&self, name: &str) -> Result<ParamValue, UiError>;

    /// 在 `rect` 内绘制，`alpha` 为累计透明度
    fn draw(&self, rect: Rect, drawer: &mut dyn Drawer, alpha: f32);
}

fn unknown(kind: &'static str, name: &str) -> UiError {
    UiError::UnknownParam {
        name: name.to_string(),
        base: kind,
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    Color {
        a: color.a * alpha,
        ..color
    }
}

/// 声明式描述
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BaseDesc {
    /// 不绘制（只用于布局）
    #[default]
    Blank,
    /// 纯色矩形
    Rect {
        #[serde(default)]
        color: Color,
    },
    /// 文字
    Text {
        #[serde(default)]
        text: String,
        #[serde(default)]
        color: Color,
        #[serde(default = "default_text_size")]
        size: f32,
        #[serde(default)]
        align: TextAlign,
    },
    /// 图片
    Image {
        image: String,
        #[serde(default)]
        color: Color,
    },
}

fn default_text_size() -> f32 {
    TextStyle::default().size
}

impl BaseDesc {
    /// 创建绘制部件
    pub fn build(&self) -> Box<dyn WidgetBase> {
        match self {
            BaseDesc::Blank => Box::new(Blank),
            BaseDesc::Rect { color } => Box::new(Rectangle { color: *color }),
            BaseDesc::Text {
                text,
                color,
                size,
                align,
            } => Box::new(Text {
                text: text.clone(),
                color: *color,
                style: TextStyle {
                    size: *size,
                    align: *align,
                },
            }),
            BaseDesc::Image { image, color } => Box::new(Image {
                image: image.clone(),
                color: *color,
            }),
        }
    }
}

/// 空部件
#[derive(Debug, Clone, Default)]
pub struct Blank;

impl WidgetBase for Blank {
    fn kind(&self) -> &'static str {
        "blank"
    }

    fn set_param(&mut self, name: &str, _value: ParamValue) -> Result<(), UiError> {
        Err(unknown(self.kind(), name))
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, UiError> {
        Err(unknown(self.kind(), name))
    }

    fn draw(&self, _rect: Rect, _drawer: &mut dyn Drawer, _alpha: f32) {}
}

/// 纯色矩形
#[derive(Debug, Clone)]
pub struct Rectangle {
    pub color: Color,
}

impl WidgetBase for Rectangle {
    fn kind(&self) -> &'static str {
        "rect"
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), UiError> {
        match name {
            "color" => self.color = Color::expect(name, &value)?,
            _ => return Err(unknown(self.kind(), name)),
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, UiError> {
        match name {
            "color" => Ok(self.color.into()),
            _ => Err(unknown(self.kind(), name)),
        }
    }

    fn draw(&self, rect: Rect, drawer: &mut dyn Drawer, alpha: f32) {
        drawer.fill_rect(rect, with_alpha(self.color, alpha));
    }
}

/// 文字
#[derive(Debug, Clone)]
pub struct Text {
    pub text: String,
    pub color: Color,
    pub style: TextStyle,
}

impl WidgetBase for Text {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), UiError> {
        match name {
            "text" => self.text = String::expect(name, &value)?,
            "color" => self.color = Color::expect(name, &value)?,
            "size" => self.style.size = f32::expect(name, &value)?,
            _ => return Err(unknown(self.kind(), name)),
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, UiError> {
        match name {
            "text" => Ok(self.text.clone().into()),
            "color" => Ok(self.color.into()),
            "size" => Ok(self.style.size.into()),
            _ => Err(unknown(self.kind(), name)),
        }
    }

    fn draw(&self, rect: Rect, drawer: &mut dyn Drawer, alpha: f32) {
        if self.text.is_empty() {
            return;
        }
        drawer.draw_text(rect, &self.text, &self.style, with_alpha(self.color, alpha));
    }
}

/// 图片
#[derive(Debug, Clone)]
pub struct Image {
    pub image: String,
    pub color: Color,
}

impl WidgetBase for Image {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), UiError> {
        match name {
            "image" => self.image = String::expect(name, &value)?,
            "color" => self.color = Color::expect(name, &value)?,
            _ => return Err(unknown(self.kind(), name)),
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, UiError> {
        match name {
            "image" => Ok(self.image.clone().into()),
            "color" => Ok(self.color.into()),
            _ => Err(unknown(self.kind(), name)),
        }
    }

    fn draw(&self, rect: Rect, drawer: &mut dyn Drawer, alpha: f32) {
        drawer.draw_image(rect, &self.image, with_alpha(self.color, alpha));
    }
}
