//! # Params 模块
//!
//! 数据驱动的游戏参数：每个画面的 Canvas 描述、时间常数、公共 Tween、
//! 音效表和文字表。
//!
//! 内置一份完整的参数（`assets/params.json`），宿主可以用自己的文件替换。
//! 文件中缺少的字段使用默认值。

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ParamsError;
use crate::ui::{CanvasDesc, EasingFunction, TweenCommon, Vec2, Vec3};

const BUILTIN: &str = include_str!("../assets/params.json");

/// 带延迟的音效：`[delay, name]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimedSound(pub f64, pub String);

/// 游戏参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameParams {
    pub app: AppParams,
    pub ui: UiParams,
    pub platform: PlatformParams,
    /// 公共 Tween
    pub tween_common: TweenCommon,
    pub sound: SoundParams,
    /// 文字表（键 → 显示文字）
    pub text: BTreeMap<String, String>,
    pub debug: DebugParams,

    pub intro: IntroParams,
    pub title: TitleParams,
    pub credits: ScreenParams,
    pub settings: ScreenParams,
    pub records: RecordsParams,
    pub ranking: RankingParams,
    pub gamemain: GameMainParams,
    pub tutorial: TutorialParams,
    pub result: ResultParams,
    pub main: MainParams,
}

impl GameParams {
    /// 内置参数
    pub fn builtin() -> Result<Self, ParamsError> {
        Self::from_json(BUILTIN)
    }

    /// 从 JSON 文本读取
    pub fn from_json(text: &str) -> Result<Self, ParamsError> {
        serde_json::from_str(text).map_err(|e| ParamsError::Parse(e.to_string()))
    }

    /// 文字表查找，没有对应项时返回键本身
    pub fn text(&self, key: &str) -> String {
        match self.text.get(key) {
            Some(text) => text.clone(),
            None => {
                tracing::warn!(key, "文字表中没有该项");
                key.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppParams {
    pub version: String,
}

impl Default for AppParams {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiParams {
    pub camera: CameraParams,
    pub wipe: WipeParams,
}

/// UI 坐标系
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// 画面尺寸
    pub size: Vec2,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            size: Vec2::new(640.0, 960.0),
        }
    }
}

/// 画面切换的时间
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WipeParams {
    /// 开始切换到发出事件的时间
    pub delay: f64,
    /// 开始切换到旧画面结束的时间
    pub duration: f64,
}

impl Default for WipeParams {
    fn default() -> Self {
        Self {
            delay: 0.4,
            duration: 0.8,
        }
    }
}

/// 平台能力
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformParams {
    /// 有安全区域（刘海屏等）
    pub safe_area: bool,
    /// 支持分享
    pub share: bool,
}

/// 音效表
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SoundParams {
    /// 音效名 → 文件
    pub se: BTreeMap<String, String>,
    /// BGM 名 → 文件
    pub bgm: BTreeMap<String, String>,
}

/// 只在调试构建中生效的开关
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DebugParams {
    /// 总是进入教程
    pub force_tutorial: bool,
    /// 调试信息的显示位置
    pub info_rect: Option<crate::ui::Rect>,
}

/// 只有 Canvas 的画面
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    pub canvas: CanvasDesc,
    pub se: Vec<TimedSound>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntroParams {
    pub canvas: CanvasDesc,
    pub se: Vec<TimedSound>,
    /// 自动进入标题的时间
    pub duration: f64,
}

impl Default for IntroParams {
    fn default() -> Self {
        Self {
            canvas: CanvasDesc::default(),
            se: Vec::new(),
            duration: 2.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleParams {
    pub canvas: CanvasDesc,
    pub se: Vec<TimedSound>,
    /// 按钮出现的时间
    pub button_delay: f64,
    pub button_interval: f64,
    pub bgm: Option<String>,
}

impl Default for TitleParams {
    fn default() -> Self {
        Self {
            canvas: CanvasDesc::default(),
            se: Vec::new(),
            button_delay: 0.6,
            button_interval: 0.1,
            bgm: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordsParams {
    pub canvas: CanvasDesc,
    /// 返回按钮出现的时间
    pub touch_delay: f64,
    /// 按下返回到结束的时间
    pub finish_delay: f64,
}

impl Default for RecordsParams {
    fn default() -> Self {
        Self {
            canvas: CanvasDesc::default(),
            touch_delay: 1.0,
            finish_delay: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RankingParams {
    pub canvas: CanvasDesc,
    /// 名次的显示文字（1st, 2nd, ...）
    pub ranking: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameMainParams {
    pub canvas: CanvasDesc,
    pub se: Vec<TimedSound>,
    /// 开始演出到可以操作的时间
    pub start_delay: f64,
    /// 结束演出的时间
    pub end_delay: f64,
}

impl Default for GameMainParams {
    fn default() -> Self {
        Self {
            canvas: CanvasDesc::default(),
            se: Vec::new(),
            start_delay: 2.0,
            end_delay: 1.5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TutorialParams {
    pub canvas: CanvasDesc,
    /// 特殊指示（手持面板）的箭头偏移
    pub offset_special: Vec2,
    /// 一般指示的箭头偏移
    pub offset_common: Vec2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultParams {
    pub canvas: CanvasDesc,
    pub se: Vec<TimedSound>,
    /// 色相循环：x = 速度，y = 各项之间的相位差
    pub effect_speed: Vec3,
    /// 各项得分出现的间隔
    pub score_interval: f64,
    /// 可以点击跳过的时间
    pub skip_delay: f64,
    /// 总分计数的时长
    pub disp_duration: f64,
    pub disp_ease: EasingFunction,
    /// 计数结束到徽章出现的时间
    pub disp_delay_2: f64,
    /// 星星图标（整颗、半颗）
    pub rank_icon: [String; 2],
    /// 分享文字的键（`%1` 替换为得分）
    pub share: String,
}

impl Default for ResultParams {
    fn default() -> Self {
        Self {
            canvas: CanvasDesc::default(),
            se: Vec::new(),
            effect_speed: Vec3::new(0.5, 0.1, 0.0),
            score_interval: 0.4,
            skip_delay: 0.5,
            disp_duration: 1.5,
            disp_ease: EasingFunction::EaseOutCubic,
            disp_delay_2: 0.5,
            rank_icon: ["★".to_string(), "☆".to_string()],
            share: "Share".to_string(),
        }
    }
}

/// 后台 Task
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MainParams {
    /// 本局结束到进入结果画面的时间
    pub result_delay: f64,
}

impl Default for MainParams {
    fn default() -> Self {
        Self { result_delay: 2.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_params_parse() {
        let params = GameParams::builtin().unwrap();
        assert!(params.tween_common.contains("out-to-right"));
        assert!(params.tween_common.contains("touch-in"));
        assert!(params.gamemain.canvas.tween.contains_key("like"));
        assert_eq!(params.ui.camera.size, Vec2::new(640.0, 960.0));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params = GameParams::from_json(r#"{ "main": {} }"#).unwrap();
        assert_eq!(params.main.result_delay, 2.0);
        assert_eq!(params.ui.wipe.delay, 0.4);
        assert_eq!(params.result.disp_ease, EasingFunction::EaseOutCubic);
    }

    #[test]
    fn test_timed_sound_from_array() {
        let params = GameParams::from_json(r#"{ "intro": { "se": [[0.5, "logo"]] } }"#).unwrap();
        assert_eq!(params.intro.se, vec![TimedSound(0.5, "logo".to_string())]);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            GameParams::from_json("{ not json"),
            Err(ParamsError::Parse(_))
        ));
    }

    #[test]
    fn test_text_falls_back_to_key() {
        let params = GameParams::default();
        assert_eq!(params.text("Tutorial02"), "Tutorial02");
    }
}
