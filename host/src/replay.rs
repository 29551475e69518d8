//! # Replay 模块
//!
//! 回放文件：按时间向事件总线注入事件。
//!
//! ```json
//! [
//!   { "time": 3.0, "event": "Intro:finished" },
//!   { "time": 5.0, "event": "touch_began", "args": { "pos": { "vec2": [320, 500] } } },
//!   { "time": 9.0, "event": "Settings:Finished",
//!     "args": { "bgm-enable": false, "se-enable": true } }
//! ]
//! ```
//!
//! 布尔值和字符串直接写；其余类型用单键对象标明变体
//! （`uint` / `int` / `float` / `vec2` / `vec3` / `json`），
//! 因为事件参数按变体严格读取，数字本身无法区分。

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use panel_runtime::{Arguments, Value, Vec2, Vec3};

use crate::error::{HostError, HostResult};

/// 回放参数值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplayValue {
    Bool(bool),
    Text(String),
    Typed(TypedValue),
}

/// 标明变体的参数值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypedValue {
    Uint(u32),
    Int(i64),
    Float(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Json(serde_json::Value),
}

impl From<ReplayValue> for Value {
    fn from(value: ReplayValue) -> Self {
        match value {
            ReplayValue::Bool(v) => Value::Bool(v),
            ReplayValue::Text(v) => Value::Text(v),
            ReplayValue::Typed(TypedValue::Uint(v)) => Value::UInt(v),
            ReplayValue::Typed(TypedValue::Int(v)) => Value::Int(v),
            ReplayValue::Typed(TypedValue::Float(v)) => Value::Float(v),
            ReplayValue::Typed(TypedValue::Vec2(v)) => Value::Vec2(Vec2::from(v)),
            ReplayValue::Typed(TypedValue::Vec3(v)) => Value::Vec3(Vec3::from(v)),
            ReplayValue::Typed(TypedValue::Json(v)) => Value::Json(v),
        }
    }
}

/// 一条回放事件
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayEvent {
    /// 注入时间（秒）
    pub time: f64,
    /// 事件名
    pub event: String,
    #[serde(default)]
    pub args: BTreeMap<String, ReplayValue>,
}

impl ReplayEvent {
    pub fn to_arguments(&self) -> Arguments {
        let mut args = Arguments::new();
        for (key, value) in &self.args {
            args.insert(key.as_str(), Value::from(value.clone()));
        }
        args
    }
}

/// 回放脚本
#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    events: Vec<ReplayEvent>,
    cursor: usize,
}

impl ReplayScript {
    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// 从 JSON 文本解析
    ///
    /// 事件按时间稳定排序，同一时间的事件保持文件中的顺序。
    pub fn from_json(json: &str) -> HostResult<Self> {
        let mut events: Vec<ReplayEvent> =
            serde_json::from_str(json).map_err(|e| HostError::Replay(e.to_string()))?;

        if let Some(bad) = events.iter().find(|e| !e.time.is_finite() || e.time < 0.0) {
            return Err(HostError::Replay(format!(
                "事件 '{}' 的时间无效: {}",
                bad.event, bad.time
            )));
        }
        if let Some(bad) = events.iter().find(|e| e.event.is_empty()) {
            return Err(HostError::Replay(format!("时间 {} 的事件名为空", bad.time)));
        }

        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { events, cursor: 0 })
    }

    /// 取出到 `time` 为止尚未注入的事件
    pub fn due(&mut self, time: f64) -> &[ReplayEvent] {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].time <= time {
            self.cursor += 1;
        }
        &self.events[start..self.cursor]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 剩余事件数
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.events.len()
    }
}
