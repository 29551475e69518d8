//! 宿主层错误

use std::path::PathBuf;
use thiserror::Error;

use panel_runtime::ParamsError;

/// 宿主层错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 文件读写失败
    #[error("无法读写 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 参数表无效
    #[error("参数表 {path:?} 无效: {source}")]
    Params {
        path: PathBuf,
        #[source]
        source: ParamsError,
    },

    /// 回放文件无效
    #[error("回放文件无效: {0}")]
    Replay(String),

    /// 配置无效
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

pub type HostResult<T> = Result<T, HostError>;
