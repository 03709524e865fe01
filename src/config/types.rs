//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::notification::level::Level;
use crate::notification::template::create_template;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Slack 传输配置
    pub slack: SlackConfig,
    /// 本进程日志配置
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// 附件模板引擎
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatEngine {
    /// `<%= field %>` 占位符替换
    #[default]
    Simple,
    /// Handlebars `{{field}}` 语法
    Handlebars,
}

/// Slack 传输配置
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct SlackConfig {
    /// incoming webhook 地址
    pub webhook: Option<String>,
    /// 默认频道
    pub channel: Option<String>,
    /// 主题到频道的映射
    #[serde(default)]
    pub topics: HashMap<String, String>,
    /// API token，配置后启用附件上传
    pub token: Option<String>,
    /// webhook 消息的级别阈值
    pub log_level: Option<Level>,
    /// 附件内容模板
    pub format: Option<String>,
    /// 模板引擎
    #[serde(default)]
    pub format_engine: FormatEngine,
    /// 附件上传是否同样受级别阈值限制
    #[serde(default)]
    pub gate_attachments: bool,
    /// 显示用户名，未设置时使用主机名
    pub username: Option<String>,
    /// 头像 emoji
    pub icon_emoji: Option<String>,
    /// Slack Web API 地址
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("webhook", &self.webhook.as_ref().map(|_| "[REDACTED]"))
            .field("channel", &self.channel)
            .field("topics", &self.topics)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("log_level", &self.log_level)
            .field("format", &self.format)
            .field("format_engine", &self.format_engine)
            .field("gate_attachments", &self.gate_attachments)
            .field("username", &self.username)
            .field("icon_emoji", &self.icon_emoji)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook: None,
            channel: None,
            topics: HashMap::new(),
            token: None,
            log_level: None,
            format: None,
            format_engine: FormatEngine::default(),
            gate_attachments: false,
            username: None,
            icon_emoji: None,
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

impl SlackConfig {
    /// 创建空配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 webhook 地址
    #[must_use]
    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.webhook = Some(webhook.into());
        self
    }

    /// 设置默认频道
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// 添加主题映射
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>, channel: impl Into<String>) -> Self {
        self.topics.insert(topic.into(), channel.into());
        self
    }

    /// 设置 API token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// 设置级别阈值
    #[must_use]
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// 设置附件模板
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// 覆盖 API 地址（测试时使用）
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// 本进程日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 是否使用JSON格式
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

// 默认值函数
fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    validate_slack_config(&config.slack)?;

    // 验证日志级别（不区分大小写，接受 warning）
    let valid_log_levels = ["trace", "debug", "info", "warn", "warning", "error"];
    let level = config.logging.level.trim().to_ascii_lowercase();
    if !valid_log_levels.contains(&level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.logging.level, valid_log_levels
        ));
    }

    Ok(())
}

/// 验证 Slack 配置
pub fn validate_slack_config(slack: &SlackConfig) -> Result<(), String> {
    // 验证webhook地址
    if let Some(ref webhook) = slack.webhook {
        if !webhook.starts_with("http://") && !webhook.starts_with("https://") {
            return Err(format!("webhook 地址格式无效: {webhook}"));
        }
    }

    if !slack.api_base_url.starts_with("http://") && !slack.api_base_url.starts_with("https://") {
        return Err(format!("API 地址格式无效: {}", slack.api_base_url));
    }

    if slack.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if let Some(ref channel) = slack.channel {
        if channel.trim().is_empty() {
            return Err("默认频道不能为空字符串".to_string());
        }
    }

    for (topic, channel) in &slack.topics {
        if topic.trim().is_empty() {
            return Err("主题名称不能为空".to_string());
        }
        if channel.trim().is_empty() {
            return Err(format!("主题 {topic} 的频道不能为空"));
        }
    }

    if let Some(ref token) = slack.token {
        if token.trim().is_empty() {
            return Err("token 不能为空字符串".to_string());
        }
    }

    // 验证模板语法
    if let Some(ref format) = slack.format {
        create_template(slack.format_engine, format)
            .map_err(|e| format!("附件模板无效: {e}"))?;
    }

    Ok(())
}
