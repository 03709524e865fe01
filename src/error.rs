//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Slack Log Transport 的主要错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notify(#[from] NotifyError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP传输错误
    #[error("HTTP请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 非成功状态码
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Slack API 返回 ok=false
    #[error("Slack API错误: {0}")]
    Api(String),

    /// 被 Slack 限流 (HTTP 429)
    #[error("被Slack限流")]
    RateLimited,

    /// 模板编译或渲染错误
    #[error("模板渲染失败: {0}")]
    Template(String),

    /// 部分消息发送失败
    #[error("{failed}/{total} 条Slack消息发送失败")]
    Delivery { failed: usize, total: usize },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, TransportError>;
