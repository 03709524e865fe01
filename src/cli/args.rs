//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::notification::level::Level;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Slack Log Transport - 将日志事件转发到 Slack
#[derive(Parser, Debug, Clone)]
#[command(
    name = "slack-log-transport",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "SLACK_LOG_TRANSPORT_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        help = "本进程日志级别（默认取配置文件中的值）",
        env = "SLACK_LOG_TRANSPORT_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 是否启用详细输出
    #[arg(short, long, help = "启用详细输出")]
    pub verbose: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 发送一条日志事件到 Slack
    Send {
        /// 事件级别
        #[arg(short = 'L', long, default_value = "info", help = "事件级别")]
        level: Level,

        /// 消息内容
        #[arg(value_name = "MESSAGE", help = "消息内容")]
        message: String,

        /// 主题
        #[arg(short, long, help = "主题（映射到 topics 中的频道）")]
        topic: Option<String>,

        /// 附件内容（JSON对象或纯文本）
        #[arg(short, long, help = "附件内容，JSON对象或纯文本", conflicts_with = "attachment_file")]
        attachment: Option<String>,

        /// 附件文件
        #[arg(long, value_name = "FILE", help = "从文件读取附件内容")]
        attachment_file: Option<PathBuf>,

        /// 模板字段
        #[arg(short, long = "field", value_name = "KEY=VALUE", help = "模板字段，可重复")]
        fields: Vec<String>,

        /// 只打印将要执行的调用，不实际发送
        #[arg(long, help = "只打印将要执行的调用")]
        dry_run: bool,
    },

    /// 查看事件会被发送到哪些频道
    Channels {
        /// 事件级别
        #[arg(short = 'L', long, default_value = "info", help = "事件级别")]
        level: Level,

        /// 主题
        #[arg(short, long, help = "主题")]
        topic: Option<String>,
    },

    /// 初始化配置文件
    Init {
        /// 配置文件路径
        #[arg(
            value_name = "FILE",
            help = "配置文件路径",
            default_value = "slack-log-transport.toml"
        )]
        config_path: PathBuf,

        /// 是否覆盖现有文件
        #[arg(short, long, help = "覆盖现有文件")]
        force: bool,

        /// 配置模板类型
        #[arg(short, long, value_enum, default_value = "minimal", help = "配置模板类型")]
        template: ConfigTemplate,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,

        /// 是否显示详细信息
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

/// 配置模板类型
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum ConfigTemplate {
    /// 最小模板
    Minimal,
    /// 完整模板
    Full,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::loader::get_default_config_path)
    }
}
