//! # Host
//!
//! `panel-runtime` 的无窗口宿主：
//!
//! - [`config`]：配置文件与命令行覆盖
//! - [`store`]：存档文件
//! - [`drawer`]：把绘制命令写进日志
//! - [`audio`]：记录音频命令
//! - [`replay`]：按时间注入事件
//! - [`app`]：固定步长帧循环

pub mod app;
pub mod audio;
pub mod config;
pub mod drawer;
pub mod error;
pub mod replay;
pub mod store;

pub use app::{HostApp, RunSummary, load_params};
pub use audio::AudioLog;
pub use config::{AppConfig, ConfigError};
pub use drawer::TracingDrawer;
pub use error::{HostError, HostResult};
pub use replay::{ReplayEvent, ReplayScript};
pub use store::FileStore;
