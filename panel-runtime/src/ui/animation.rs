//! # Animation 模块
//!
//! 单个数值在时间轴上的变化。
//!
//! 动画只关注 `from → to` 的时间插值，不假设被驱动的对象：
//! Tween 用它驱动 Widget 参数，结果画面用它做分数的计数。

use super::EasingFunction;

/// 动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
}

impl AnimationState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing)
    }
}

/// 数值动画
#[derive(Debug, Clone)]
pub struct Animation {
    /// 起始值
    pub from: f32,
    /// 目标值
    pub to: f32,
    /// 动画时长（秒）
    pub duration: f32,
    /// 缓动函数
    pub easing: EasingFunction,
    /// 延迟启动（秒）
    pub delay: f32,
    /// 当前状态
    pub state: AnimationState,
    /// 当前进度（已应用缓动）
    pub progress: f32,
    /// 已经过的时间
    elapsed: f32,
}

impl Animation {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            easing: EasingFunction::default(),
            delay: 0.0,
            state: AnimationState::Pending,
            progress: 0.0,
            elapsed: 0.0,
        }
    }

    /// 归一化进度动画（0.0 → 1.0）
    pub fn normalized(duration: f32) -> Self {
        Self::new(0.0, 1.0, duration)
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// 更新动画
    ///
    /// # 返回
    /// - `true`: 动画仍在进行中
    /// - `false`: 动画已结束
    pub fn update(&mut self, dt: f32) -> bool {
        match self.state {
            AnimationState::Pending => {
                self.elapsed += dt;
                if self.elapsed >= self.delay {
                    self.state = AnimationState::Playing;
                    self.elapsed -= self.delay;
                    self.update_playing()
                } else {
                    true
                }
            }
            AnimationState::Playing => {
                self.elapsed += dt;
                self.update_playing()
            }
            AnimationState::Completed => false,
        }
    }

    fn update_playing(&mut self) -> bool {
        let raw_progress = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };

        if raw_progress >= 1.0 {
            self.progress = 1.0;
            self.state = AnimationState::Completed;
            false
        } else {
            self.progress = self.easing.apply(raw_progress);
            true
        }
    }

    /// 直接跳到终点
    pub fn finish(&mut self) {
        self.progress = 1.0;
        self.state = AnimationState::Completed;
    }

    /// 是否已经开始（延迟已过）
    pub fn is_started(&self) -> bool {
        self.state != AnimationState::Pending
    }

    pub fn is_finished(&self) -> bool {
        self.state == AnimationState::Completed
    }

    /// 当前值
    pub fn current_value(&self) -> f32 {
        self.from + (self.to - self.from) * self.progress
    }
}
