//! # Param 模块
//!
//! Widget 参数的值类型与几何参数名。
//!
//! 几何参数是固定的一组，由 Widget 自己持有；其余参数名交给 Widget 的绘制部件（base）处理。

use std::fmt;
use std::str::FromStr;

use super::{Color, Rect, Vec2};
use crate::error::UiError;

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vec2(Vec2),
    Rect(Rect),
    Color(Color),
    Text(String),
}

impl ParamValue {
    /// 变体名称
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Vec2(_) => "vec2",
            ParamValue::Rect(_) => "rect",
            ParamValue::Color(_) => "color",
            ParamValue::Text(_) => "text",
        }
    }

    /// 插值到 `other`
    ///
    /// 两端类型不同或为文字时不插值，进度到达终点才切换。
    pub fn lerp(&self, other: &ParamValue, t: f32) -> ParamValue {
        match (self, other) {
            (ParamValue::Float(a), ParamValue::Float(b)) => ParamValue::Float(a + (b - a) * t),
            (ParamValue::Vec2(a), ParamValue::Vec2(b)) => ParamValue::Vec2(a.lerp(*b, t)),
            (ParamValue::Rect(a), ParamValue::Rect(b)) => ParamValue::Rect(a.lerp(*b, t)),
            (ParamValue::Color(a), ParamValue::Color(b)) => ParamValue::Color(a.lerp(*b, t)),
            _ if t >= 1.0 => other.clone(),
            _ => self.clone(),
        }
    }

    /// 按 `like` 的类型解析 JSON 值
    ///
    /// 参数表里的数值没有类型标注，以参数当前值的类型为准。
    /// 标量写给二维量时视为两个分量相同（例如 `"scale": 0`）。
    pub fn from_json_like(like: &ParamValue, json: &serde_json::Value) -> Result<ParamValue, String> {
        let parsed = match like {
            ParamValue::Float(_) => serde_json::from_value::<f32>(json.clone()).map(ParamValue::Float),
            ParamValue::Vec2(_) => match json.as_f64() {
                Some(v) => Ok(ParamValue::Vec2(Vec2::splat(v as f32))),
                None => serde_json::from_value::<Vec2>(json.clone()).map(ParamValue::Vec2),
            },
            ParamValue::Rect(_) => serde_json::from_value::<Rect>(json.clone()).map(ParamValue::Rect),
            ParamValue::Color(_) => {
                serde_json::from_value::<Color>(json.clone()).map(ParamValue::Color)
            }
            ParamValue::Text(_) => serde_json::from_value::<String>(json.clone()).map(ParamValue::Text),
        };
        parsed.map_err(|e| format!("{} ({json}): {e}", like.type_name()))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Vec2(v) => write!(f, "[{}, {}]", v.x, v.y),
            ParamValue::Rect(r) => write!(f, "[{}, {}, {}, {}]", r.x1, r.y1, r.x2, r.y2),
            ParamValue::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            ParamValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// 可以从 `ParamValue` 取出的类型
pub trait ParamType: Sized + Into<ParamValue> {
    const TYPE_NAME: &'static str;

    fn from_param(value: &ParamValue) -> Option<Self>;

    /// 取值，类型不符时返回错误
    fn expect(name: &str, value: &ParamValue) -> Result<Self, UiError> {
        Self::from_param(value).ok_or_else(|| UiError::ParamType {
            name: name.to_string(),
            expected: Self::TYPE_NAME,
            actual: value.type_name(),
        })
    }
}

macro_rules! impl_param_type {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl ParamType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_param(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for ParamValue {
            fn from(v: $ty) -> Self {
                ParamValue::$variant(v)
            }
        }
    };
}

impl_param_type!(f32, Float, "float");
impl_param_type!(Vec2, Vec2, "vec2");
impl_param_type!(Rect, Rect, "rect");
impl_param_type!(Color, Color, "color");
impl_param_type!(String, Text, "text");

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Widget 自己持有的几何参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryParam {
    Rect,
    Pivot,
    AnchorMin,
    AnchorMax,
    Offset,
    Scale,
    Alpha,
}

impl GeometryParam {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryParam::Rect => "rect",
            GeometryParam::Pivot => "pivot",
            GeometryParam::AnchorMin => "anchor_min",
            GeometryParam::AnchorMax => "anchor_max",
            GeometryParam::Offset => "offset",
            GeometryParam::Scale => "scale",
            GeometryParam::Alpha => "alpha",
        }
    }
}

impl FromStr for GeometryParam {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "rect" => GeometryParam::Rect,
            "pivot" => GeometryParam::Pivot,
            "anchor_min" => GeometryParam::AnchorMin,
            "anchor_max" => GeometryParam::AnchorMax,
            "offset" => GeometryParam::Offset,
            "scale" => GeometryParam::Scale,
            "alpha" => GeometryParam::Alpha,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geometry_names() {
        for param in [
            GeometryParam::Rect,
            GeometryParam::Pivot,
            GeometryParam::AnchorMin,
            GeometryParam::AnchorMax,
            GeometryParam::Offset,
            GeometryParam::Scale,
            GeometryParam::Alpha,
        ] {
            assert_eq!(param.name().parse::<GeometryParam>(), Ok(param));
        }
        assert!("color".parse::<GeometryParam>().is_err());
    }

    #[test]
    fn test_from_json_like() {
        let scale = ParamValue::Vec2(Vec2::one());
        assert_eq!(
            ParamValue::from_json_like(&scale, &json!(0.5)),
            Ok(ParamValue::Vec2(Vec2::splat(0.5)))
        );
        assert_eq!(
            ParamValue::from_json_like(&scale, &json!([1.0, 2.0])),
            Ok(ParamValue::Vec2(Vec2::new(1.0, 2.0)))
        );
        assert!(ParamValue::from_json_like(&ParamValue::Float(0.0), &json!("x")).is_err());
    }

    #[test]
    fn test_lerp() {
        let a = ParamValue::Float(0.0);
        let b = ParamValue::Float(10.0);
        assert_eq!(a.lerp(&b, 0.25), ParamValue::Float(2.5));

        let from = ParamValue::Text("a".into());
        let to = ParamValue::Text("b".into());
        assert_eq!(from.lerp(&to, 0.5), from);
        assert_eq!(from.lerp(&to, 1.0), to);
    }
}
