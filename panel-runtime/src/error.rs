//! # Error 模块
//!
//! 定义 panel-runtime 中使用的错误类型。
//!
//! 错误分三类：
//! - 契约违反（事件参数缺失/类型错误、未知 Widget/参数名）：程序错误，立即失败
//! - 配置缺陷（声明式 UI 缺少可选字段）：使用默认值，不会出错
//! - 生命周期误用：由结构保证不可能发生

use thiserror::Error;

/// 事件参数错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    /// 缺少参数
    #[error("缺少参数 '{key}'")]
    MissingArgument { key: String },

    /// 参数类型不匹配
    #[error("参数 '{key}' 类型错误：期望 {expected}，实际 {actual}")]
    ArgumentType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// 结构化参数解码失败
    #[error("参数 '{key}' 解码失败: {message}")]
    Decode { key: String, message: String },

    /// 附带事件名的错误
    #[error("事件 '{event}': {source}")]
    InEvent {
        event: String,
        #[source]
        source: Box<EventError>,
    },
}

impl EventError {
    /// 附加事件名
    pub fn in_event(self, event: &str) -> Self {
        EventError::InEvent {
            event: event.to_string(),
            source: Box::new(self),
        }
    }
}

/// UI 错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    /// Widget 未找到
    #[error("Widget '{0}' 未找到")]
    UnknownWidget(String),

    /// Widget 标识符重复
    #[error("Widget 标识符 '{0}' 重复")]
    DuplicateIdentifier(String),

    /// 未知参数
    #[error("参数 '{name}' 不存在（{base}）")]
    UnknownParam { name: String, base: &'static str },

    /// 参数类型不匹配
    #[error("参数 '{name}' 类型错误：期望 {expected}，实际 {actual}")]
    ParamType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Tween 未找到
    #[error("Tween '{0}' 未找到")]
    UnknownTween(String),

    /// Tween 的值与参数类型不符
    #[error("Tween 参数 '{param}' 的值无效: {message}")]
    TweenValue { param: String, message: String },

    /// Tween 目标索引越界
    #[error("Tween '{tween}' 的目标索引 {index} 越界（共 {len} 个）")]
    TweenIndex {
        tween: String,
        index: usize,
        len: usize,
    },
}

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchiveError {
    /// 记录未找到
    #[error("记录 '{0}' 未找到")]
    UnknownRecord(String),

    /// 记录类型不匹配
    #[error("记录 '{key}' 类型错误：期望 {expected}")]
    RecordType { key: String, expected: &'static str },

    /// 序列化失败
    #[error("存档序列化失败: {0}")]
    Serialization(String),

    /// 存储后端错误
    #[error("存档存储失败: {0}")]
    Store(String),
}

/// 参数表错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// JSON 解析失败
    #[error("参数解析失败: {0}")]
    Parse(String),
}

/// panel-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 事件错误
    #[error("事件错误: {0}")]
    Event(#[from] EventError),

    /// UI 错误
    #[error("UI 错误: {0}")]
    Ui(#[from] UiError),

    /// 存档错误
    #[error("存档错误: {0}")]
    Archive(#[from] ArchiveError),

    /// 参数表错误
    #[error("参数表错误: {0}")]
    Params(#[from] ParamsError),
}

/// Result 类型别名
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// 契约违反：记录后立即失败
///
/// 静默恢复会让 UI 状态在不可见处损坏，所以这里不做降级。
#[track_caller]
pub fn contract_violation(error: impl Into<RuntimeError>) -> ! {
    let error = error.into();
    tracing::error!(error = %error, "契约违反");
    panic!("contract violation: {error}");
}

/// 成功则取值，失败则按契约违反处理
pub trait OrViolation<T> {
    fn or_violation(self) -> T;
}

impl<T, E: Into<RuntimeError>> OrViolation<T> for Result<T, E> {
    #[track_caller]
    fn or_violation(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => contract_violation(e),
        }
    }
}
