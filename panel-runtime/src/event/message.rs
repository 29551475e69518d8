//! # Message 模块
//!
//! 稳定事件的类型化参数结构。
//!
//! 每个结构体对应一个事件名，在总线边界与参数包互相转换；
//! 转换失败（缺键、类型不符）说明生产方与消费方的约定不一致。

use serde::Serialize;

use super::value::{Arguments, FromValue, Value};
use crate::archive::{GameRecord, Score};
use crate::error::EventError;
use crate::ui::{Vec2, Vec3};

/// 类型化事件
pub trait Message: Sized + 'static {
    /// 事件名
    const NAME: &'static str;

    fn to_arguments(&self) -> Arguments;

    fn from_arguments(args: &Arguments) -> Result<Self, EventError>;
}

/// 消息字段与参数值之间的转换
pub trait Field: Sized {
    fn store(&self, args: &mut Arguments, key: &str);
    fn load(args: &Arguments, key: &str) -> Result<Self, EventError>;
}

impl<T> Field for T
where
    T: FromValue + Into<Value> + Clone,
{
    fn store(&self, args: &mut Arguments, key: &str) {
        args.insert(key, self.clone());
    }

    fn load(args: &Arguments, key: &str) -> Result<Self, EventError> {
        args.get(key)
    }
}

/// 以 JSON 形式携带的结构化字段
macro_rules! json_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn store(&self, args: &mut Arguments, key: &str) {
                    store_json(self, args, key);
                }

                fn load(args: &Arguments, key: &str) -> Result<Self, EventError> {
                    args.get_json(key)
                }
            }
        )*
    };
}

fn store_json<T: Serialize>(value: &T, args: &mut Arguments, key: &str) {
    args.insert_json(key, value);
}

json_field!(Score, Vec<u32>, Vec<Vec3>, Vec<GameRecord>);

macro_rules! message {
    (
        $(#[$meta:meta])*
        $name:ident = $event:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty => $key:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Message for $name {
            const NAME: &'static str = $event;

            fn to_arguments(&self) -> Arguments {
                #[allow(unused_mut)]
                let mut args = Arguments::new();
                $( Field::store(&self.$field, &mut args, $key); )*
                args
            }

            fn from_arguments(args: &Arguments) -> Result<Self, EventError> {
                let _ = args;
                Ok(Self {
                    $( $field: Field::load(args, $key)?, )*
                })
            }
        }
    };
}

message! {
    /// 每帧驱动
    FrameUpdate = "update" {
        /// 当前时间（秒，单调递增）
        current_time: f64 => "current_time",
        /// 距上一帧的时间（秒）
        delta_time: f64 => "delta_time",
    }
}

message! {
    /// 音频设置变更（实时生效）
    SettingsChanged = "Settings:Changed" {
        bgm_enable: bool => "bgm-enable",
        se_enable: bool => "se-enable",
    }
}

message! {
    /// 设置画面结束，需要持久化
    SettingsFinished = "Settings:Finished" {
        bgm_enable: bool => "bgm-enable",
        se_enable: bool => "se-enable",
    }
}

message! {
    /// 本局结束（玩法层发出）
    GameFinish = "Game:Finish" {
        score: Score => "score",
        /// 手持面板用尽
        no_panels: bool => "no_panels",
        tutorial: bool => "tutorial",
    }
}

message! {
    /// 请求 Core 记录本局成绩
    RecordScore = "Game:Record" {
        score: Score => "score",
    }
}

message! {
    /// 进入结果画面
    ResultBegin = "Result:begin" {
        rank_in: bool => "rank_in",
        /// 名次（0 起）
        ranking: u32 => "ranking",
        high_score: bool => "high_score",
        score: Score => "score",
        tutorial: bool => "tutorial",
    }
}

message! {
    /// 结果画面结束
    ResultFinished = "Result:Finished" {
        rank_in: bool => "rank_in",
        ranking: u32 => "ranking",
    }
}

message! {
    /// UI 音效请求
    UiSound = "UI:sound" {
        name: String => "name",
    }
}

message! {
    /// 游戏中的 UI 刷新
    GameUi = "Game:UI" {
        remaining_time: f64 => "remaining_time",
    }
}

message! {
    /// 各类得分更新
    UpdateScores = "Game:UpdateScores" {
        scores: Vec<u32> => "scores",
    }
}

message! {
    /// 放置了一块面板
    PutPanel = "Game:PutPanel" {
        total_panels: u32 => "total_panels",
    }
}

message! {
    /// 开始长按放置
    PutBegin = "Game:PutBegin" {
        /// 归一化设备坐标
        pos: Vec3 => "pos",
    }
}

message! {
    /// 长按放置进行中
    PutHold = "Game:PutHold" {
        pos: Vec3 => "pos",
        /// 进度 (0.0 - 1.0)
        scale: f64 => "scale",
    }
}

message! {
    /// 完成了森林/道路等，在这些位置显示「いいね」
    Completed = "Game:completed" {
        positions: Vec<Vec3> => "positions",
    }
}

message! {
    /// 教程指示位置（第一个是光标位置）
    TutorialPositions = "Tutorial:positions" {
        positions: Vec<Vec3> => "positions",
    }
}

message! {
    /// 教程需要指示的目标种类（位掩码）
    TutorialKinds = "Tutorial:kinds" {
        kinds: u32 => "kinds",
    }
}

message! {
    /// 请求平台分享
    SharePost = "Share:post" {
        text: String => "text",
    }
}

message! {
    /// 平台分享结束
    ShareResult = "Share:result" {
        completed: bool => "completed",
    }
}

message! {
    /// 播放音效（交给音频后端）
    AudioSe = "Audio:se" {
        name: String => "name",
    }
}

message! {
    /// 播放 BGM（交给音频后端）
    AudioBgm = "Audio:bgm" {
        name: String => "name",
    }
}

message! {
    /// 请求播放 BGM
    BgmPlay = "BGM:play" {
        name: String => "name",
    }
}

message! {
    /// 触摸开始（画面坐标）
    TouchBegan = "touch_began" {
        pos: Vec2 => "pos",
    }
}

message! {
    /// 触摸移动
    TouchMoved = "touch_moved" {
        pos: Vec2 => "pos",
    }
}

message! {
    /// 触摸结束
    TouchEnded = "touch_ended" {
        pos: Vec2 => "pos",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenated_keys() {
        let msg = SettingsFinished {
            bgm_enable: false,
            se_enable: true,
        };
        let args = msg.to_arguments();
        assert_eq!(args.get::<bool>("bgm-enable"), Ok(false));
        assert_eq!(args.get::<bool>("se-enable"), Ok(true));
    }

    #[test]
    fn test_structured_field() {
        let msg = ResultBegin {
            rank_in: true,
            ranking: 3,
            high_score: false,
            score: Score {
                total_score: 120,
                forest: vec![4, 9],
                ..Default::default()
            },
            tutorial: false,
        };
        let decoded = ResultBegin::from_arguments(&msg.to_arguments()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_mismatched_shape_is_error() {
        let args = Arguments::new().with("rank_in", 1u32);
        assert!(ResultFinished::from_arguments(&args).is_err());
    }
}
