//! # Tween 模块
//!
//! 按名字启动的参数动画序列。
//!
//! 一个 Tween 由若干目标组成，每个目标是一个 Widget 标识符加上若干轨道；
//! 一条轨道在 `delay` 之后用 `duration` 把一个参数从起始值变到终值。
//!
//! 参数表中的值没有类型标注，启动时以参数当前值的类型解析。
//!
//! ```json
//! "start": [
//!   { "target": "title", "tracks": [
//!     { "param": "alpha", "from": 0, "to": 1, "duration": 0.5 },
//!     { "param": "scale", "from": 1.2, "to": 1, "duration": 0.5, "easing": "EaseOutBack" }
//!   ] }
//! ]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

use super::param::ParamValue;
use super::{Animation, EasingFunction, Widget};
use crate::error::UiError;

/// 一条参数轨道
#[derive(Debug, Clone, Deserialize)]
pub struct TrackDesc {
    /// 参数名
    pub param: String,
    /// 起始值（缺省为启动时的当前值）
    #[serde(default)]
    pub from: Option<serde_json::Value>,
    /// 终值
    pub to: serde_json::Value,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub easing: EasingFunction,
}

/// Tween 的一个目标
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDesc {
    /// Widget 标识符
    pub target: String,
    pub tracks: Vec<TrackDesc>,
}

/// Tween 定义：按顺序排列的目标
pub type TweenDesc = Vec<TargetDesc>;

/// 不绑定目标的公共 Tween（按钮出现、画面切换等）
///
/// 所有画面共用，由参数表提供。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TweenCommon {
    tweens: BTreeMap<String, Vec<TrackDesc>>,
}

impl TweenCommon {
    pub fn new(tweens: BTreeMap<String, Vec<TrackDesc>>) -> Self {
        Self { tweens }
    }

    pub fn get(&self, name: &str) -> Result<&[TrackDesc], UiError> {
        self.tweens
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| UiError::UnknownTween(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tweens.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tweens.keys().map(String::as_str)
    }
}

/// 播放中的一条轨道
#[derive(Debug)]
struct RunningTrack {
    /// 目标 Widget 在树中的路径
    path: Vec<usize>,
    param: String,
    from: ParamValue,
    to: ParamValue,
    animation: Animation,
    /// 起始值由定义指定
    explicit_from: bool,
}

/// 播放中的 Tween
#[derive(Debug)]
pub(crate) struct RunningTween {
    /// 名字（停止与查询用）
    pub key: String,
    tracks: Vec<RunningTrack>,
    /// 结束时发出的事件
    pub on_complete: Option<String>,
}

impl RunningTween {
    /// 解析轨道并设置初始值
    ///
    /// `targets` 为 (Widget 路径, 轨道列表)。
    pub fn start<'a>(
        root: &mut Widget,
        key: String,
        targets: impl IntoIterator<Item = (Vec<usize>, &'a [TrackDesc])>,
        on_complete: Option<String>,
    ) -> Result<Self, UiError> {
        let mut tracks = Vec::new();
        for (path, descs) in targets {
            let widget = root
                .descendant(&path)
                .ok_or_else(|| UiError::UnknownWidget(format!("{path:?}")))?;
            for desc in descs {
                let current = widget.get_param(&desc.param)?;
                let parse = |json: &serde_json::Value| {
                    ParamValue::from_json_like(&current, json).map_err(|message| {
                        UiError::TweenValue {
                            param: desc.param.clone(),
                            message,
                        }
                    })
                };
                let from = match &desc.from {
                    Some(json) => parse(json)?,
                    None => current.clone(),
                };
                let to = parse(&desc.to)?;
                let animation = Animation::normalized(desc.duration)
                    .with_easing(desc.easing)
                    .with_delay(desc.delay);
                tracks.push(RunningTrack {
                    path: path.clone(),
                    param: desc.param.clone(),
                    from,
                    to,
                    animation,
                    explicit_from: desc.from.is_some(),
                });
            }
        }

        // 设置初始值：同一参数的轨道中最早开始的那条指定了起始值时才写入
        for (i, track) in tracks.iter().enumerate() {
            let earliest = tracks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.path == track.path && t.param == track.param)
                .min_by(|(_, a), (_, b)| a.animation.delay.total_cmp(&b.animation.delay))
                .map(|(j, _)| j);
            if track.explicit_from && earliest == Some(i) {
                if let Some(widget) = root.descendant_mut(&track.path) {
                    widget.set_param(&track.param, track.from.clone())?;
                }
            }
        }

        Ok(Self {
            key,
            tracks,
            on_complete,
        })
    }

    /// 推进时间并写入参数，返回是否仍在播放
    pub fn update(&mut self, root: &mut Widget, dt: f32) -> bool {
        let mut playing = false;
        for track in &mut self.tracks {
            if track.animation.is_finished() {
                continue;
            }
            playing |= track.animation.update(dt);
            if !track.animation.is_started() {
                continue;
            }

            let value = track.from.lerp(&track.to, track.animation.progress);
            if let Some(widget) = root.descendant_mut(&track.path) {
                // 轨道在启动时已经检查过类型
                if let Err(e) = widget.set_param(&track.param, value) {
                    tracing::warn!(tween = %self.key, error = %e, "Tween 写入参数失败");
                }
            }
        }
        playing
    }

    /// 去掉与 `other` 驱动同一 Widget 同一参数的轨道，返回是否还有剩余轨道
    pub fn yield_to(&mut self, other: &RunningTween) -> bool {
        self.tracks.retain(|track| {
            !other
                .tracks
                .iter()
                .any(|o| o.path == track.path && o.param == track.param)
        });
        !self.tracks.is_empty()
    }

    /// 轨道数
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::base::Blank;
    use crate::ui::{Rect, Vec2};

    fn tracks(json: &str) -> Vec<TrackDesc> {
        serde_json::from_str(json).unwrap()
    }

    fn root_with_child() -> Widget {
        let mut root = Widget::new(Rect::default(), Box::new(Blank));
        root.add_child(Widget::new(Rect::default(), Box::new(Blank)));
        root
    }

    #[test]
    fn test_track_defaults() {
        let t = tracks(r#"[{ "param": "alpha", "to": 0 }]"#);
        assert_eq!(t[0].duration, 0.0);
        assert_eq!(t[0].easing, EasingFunction::Linear);
        assert!(t[0].from.is_none());
    }

    #[test]
    fn test_from_defaults_to_current_value() {
        let mut root = root_with_child();
        let t = tracks(r#"[{ "param": "alpha", "to": 0, "duration": 1.0 }]"#);
        let mut tween =
            RunningTween::start(&mut root, "fade".into(), [(vec![0], t.as_slice())], None).unwrap();

        assert!(tween.update(&mut root, 0.5));
        assert_eq!(root.children()[0].get_param("alpha"), Ok(ParamValue::Float(0.5)));
        assert!(!tween.update(&mut root, 0.5));
        assert_eq!(root.children()[0].get_param("alpha"), Ok(ParamValue::Float(0.0)));
    }

    #[test]
    fn test_earliest_explicit_start_value_applied_immediately() {
        let mut root = root_with_child();
        let t = tracks(
            r#"[
                { "param": "scale", "from": 1.2, "to": 1.0, "duration": 0.2, "delay": 0.5 },
                { "param": "scale", "from": 0, "to": 1.2, "duration": 0.5, "delay": 0.1 }
            ]"#,
        );
        let mut tween =
            RunningTween::start(&mut root, "pop".into(), [(vec![0], t.as_slice())], None).unwrap();
        assert_eq!(root.children()[0].get_param("scale"), Ok(ParamValue::Vec2(Vec2::zero())));

        // 延迟中的轨道不写入
        assert!(tween.update(&mut root, 0.05));
        assert_eq!(root.children()[0].get_param("scale"), Ok(ParamValue::Vec2(Vec2::zero())));

        while tween.update(&mut root, 0.1) {}
        assert_eq!(root.children()[0].get_param("scale"), Ok(ParamValue::Vec2(Vec2::one())));
    }

    #[test]
    fn test_value_type_mismatch() {
        let mut root = root_with_child();
        let t = tracks(r#"[{ "param": "offset", "to": "left" }]"#);
        let err = RunningTween::start(&mut root, "bad".into(), [(vec![0], t.as_slice())], None)
            .unwrap_err();
        assert!(matches!(err, UiError::TweenValue { .. }));
    }
}
