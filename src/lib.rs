//! Slack Log Transport - 将日志事件转发到 Slack 的传输层
//!
//! 这是一个用Rust编写的日志传输适配器，支持：
//! - 通过 incoming webhook 发送普通消息
//! - 通过 token 调用 files.upload 上传附件
//! - 默认频道与主题频道路由
//! - 日志级别过滤
//! - 附件规范化与模板渲染
//! - tracing 日志桥接

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notification;

// 重新导出主要类型
pub use config::{Config, SlackConfig};
pub use error::TransportError;
pub use notification::{Attachment, AttachmentInput, Level, LogOptions, SlackTransport};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
