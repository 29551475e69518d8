//! # Value 模块
//!
//! 事件参数包：字符串键 → 变体值。
//!
//! 每个事件的参数结构是隐式约定的，读取时键不存在或类型不匹配都属于调用方错误。

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::error::{EventError, contract_violation};
use crate::ui::{Vec2, Vec3};

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 布尔值
    Bool(bool),
    /// 无符号整数
    UInt(u32),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    Text(String),
    /// 二维向量
    Vec2(Vec2),
    /// 三维向量
    Vec3(Vec3),
    /// 结构化数据（得分记录、历史列表等）
    Json(serde_json::Value),
}

impl Value {
    /// 变体名称（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::UInt(_) => "uint",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Vec2(_) => "vec2",
            Value::Vec3(_) => "vec3",
            Value::Json(_) => "json",
        }
    }
}

/// 从 `Value` 中取出具体类型
pub trait FromValue: Sized {
    /// 期望的变体名称
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_conversion {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_value_conversion!(bool, Bool, "bool");
impl_value_conversion!(u32, UInt, "uint");
impl_value_conversion!(i64, Int, "int");
impl_value_conversion!(f64, Float, "float");
impl_value_conversion!(String, Text, "text");
impl_value_conversion!(Vec2, Vec2, "vec2");
impl_value_conversion!(Vec3, Vec3, "vec3");
impl_value_conversion!(serde_json::Value, Json, "json");

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

/// 事件参数包
///
/// 按键有序，便于调试输出稳定。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    /// 创建空参数包
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加参数（构建器风格）
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 追加结构化参数
    ///
    /// 参数结构体都是普通数据，序列化失败只可能是程序错误。
    pub fn with_json<T: Serialize>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.insert_json(key, value);
        self
    }

    /// 设置结构化参数
    pub fn insert_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(json) => {
                self.values.insert(key, Value::Json(json));
            }
            Err(e) => contract_violation(EventError::Decode {
                key,
                message: e.to_string(),
            }),
        }
    }

    /// 设置参数
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// 原始值
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 是否包含键
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 按类型读取参数
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, EventError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| EventError::MissingArgument {
                key: key.to_string(),
            })?;

        T::from_value(value).ok_or_else(|| EventError::ArgumentType {
            key: key.to_string(),
            expected: T::TYPE_NAME,
            actual: value.type_name(),
        })
    }

    /// 读取结构化参数
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, EventError> {
        let json = self.get::<serde_json::Value>(key)?;
        serde_json::from_value(json).map_err(|e| EventError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_get() {
        let args = Arguments::new()
            .with("rank_in", true)
            .with("ranking", 3u32)
            .with("name", "like");

        assert_eq!(args.get::<bool>("rank_in"), Ok(true));
        assert_eq!(args.get::<u32>("ranking"), Ok(3));
        assert_eq!(args.get::<String>("name"), Ok("like".to_string()));
    }

    #[test]
    fn test_missing_and_mistyped() {
        let args = Arguments::new().with("ranking", 3u32);

        assert!(matches!(
            args.get::<bool>("rank_in"),
            Err(EventError::MissingArgument { .. })
        ));
        assert_eq!(
            args.get::<bool>("ranking"),
            Err(EventError::ArgumentType {
                key: "ranking".to_string(),
                expected: "bool",
                actual: "uint",
            })
        );
    }

    #[test]
    fn test_json_roundtrip_value() {
        let args = Arguments::new().with_json("scores", &vec![1u32, 2, 3]);
        let scores: Vec<u32> = args.get_json("scores").unwrap();
        assert_eq!(scores, vec![1, 2, 3]);
    }
}
