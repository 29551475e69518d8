//! # Config 模块
//!
//! 宿主配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 参数表路径，不配置时使用内置参数表
    #[serde(default)]
    pub params_path: Option<PathBuf>,

    /// 存档目录
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 固定帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 运行的帧数
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 回放文件
    #[serde(default)]
    pub replay: Option<PathBuf>,
}

/// 窗口配置
///
/// 回放里的触摸坐标按窗口像素给出，运行时换算到画面坐标。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_window_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_saves_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_fps() -> u32 {
    60
}

fn default_frames() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_window_width() -> u32 {
    640
}

fn default_window_height() -> u32 {
    960
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            params_path: None,
            saves_dir: default_saves_dir(),
            window: WindowConfig::default(),
            fps: default_fps(),
            frames: default_frames(),
            log_level: default_log_level(),
            replay: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件
    ///
    /// 文件不存在时返回 `Ok(None)`。
    pub fn read(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        Ok(Some(config))
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(Some(config)) => {
                tracing::info!(?path, "配置文件加载成功");
                config
            }
            Ok(None) => {
                tracing::warn!(?path, "配置文件不存在，使用默认配置");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "配置文件无效，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// 每帧的时间（秒）
    pub fn frame_time(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ValidationFailed("fps 必须大于 0".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::ValidationFailed("窗口尺寸必须大于 0".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "未知的日志级别: {}",
                self.log_level
            )));
        }
        if let Some(params_path) = &self.params_path
            && !params_path.exists()
        {
            return Err(ConfigError::ValidationFailed(format!(
                "参数表不存在: {:?}",
                params_path
            )));
        }
        Ok(())
    }
}

/// 可用的日志级别
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 960);
        assert_eq!(config.fps, 60);
        assert!(config.params_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "fps": 30, "window": { "width": 320 } }"#).unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 960);
        assert_eq!(config.saves_dir, PathBuf::from("saves"));
        assert!((config.frame_time() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(AppConfig::read(&path).unwrap(), None);
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::read(&path),
            Err(ConfigError::SerializationFailed(_))
        ));
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            fps: 30,
            log_level: "debug".to_string(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::read(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_validate() {
        let config = AppConfig {
            fps: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));

        let config = AppConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            params_path: Some(PathBuf::from("does/not/exist.json")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
