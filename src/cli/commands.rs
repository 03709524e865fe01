//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, ConfigTemplate, OutputFormat};
use crate::config::{Config, ConfigLoader, TomlConfigLoader};
use crate::error::{ConfigError, Result};
use crate::notification::attachment::AttachmentInput;
use crate::notification::channels::{resolve_routes, Route};
use crate::notification::level::Level;
use crate::notification::transport::{LogOptions, SlackTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载并验证配置文件
async fn load_config(path: &Path) -> Result<Config> {
    let loader = TomlConfigLoader::new(true);
    loader.load_from_file(path).await
}

/// 发送命令
pub struct SendCommand;

#[async_trait]
impl Command for SendCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Send {
            level,
            message,
            topic,
            attachment,
            attachment_file,
            fields,
            dry_run,
        } = &args.command
        {
            let config = load_config(&args.get_config_path()).await?;
            let transport = SlackTransport::new(config.slack)?;

            let mut options = LogOptions::new();
            options.topic = topic.clone();
            options.attachment = read_attachment(attachment.as_deref(), attachment_file.as_deref()).await?;
            for field in fields {
                let (key, value) = parse_field(field)?;
                options.fields.push((key, value));
            }

            if *dry_run {
                let plan = transport.plan(*level, message, &options);
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            let sent = transport.deliver(*level, message, &options).await?;
            if sent == 0 {
                println!("没有需要发送的 Slack 消息（检查频道、webhook、token 和级别阈值）");
            } else {
                println!("✓ 已发送 {sent} 条 Slack 调用");
            }
        }
        Ok(())
    }
}

/// 读取附件参数
async fn read_attachment(
    inline: Option<&str>,
    file: Option<&Path>,
) -> Result<Option<AttachmentInput>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(AttachmentInput::parse_text(text))),
        (None, Some(path)) => {
            let content = tokio::fs::read_to_string(path).await?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), Value::String(content));
            if !filename.is_empty() {
                map.insert("filename".to_string(), Value::String(filename.clone()));
                map.insert("title".to_string(), Value::String(filename));
            }
            Ok(Some(AttachmentInput::Structured(map)))
        }
        (None, None) => Ok(None),
    }
}

/// 解析 `KEY=VALUE` 形式的模板字段，值能按JSON解析时保留其类型
pub fn parse_field(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConfigError::ValidationError(format!("字段格式无效，应为 KEY=VALUE: {raw}")))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::ValidationError(format!("字段名不能为空: {raw}")).into());
    }

    let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// 频道查看命令
pub struct ChannelsCommand;

#[async_trait]
impl Command for ChannelsCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Channels { level, topic } = &args.command {
            let config = load_config(&args.get_config_path()).await?;
            let routes = resolve_routes(&config.slack, *level, topic.as_deref());

            if routes.is_empty() {
                println!("没有匹配的频道");
                return Ok(());
            }

            let passes = level.passes(config.slack.log_level);
            for route in routes {
                let (kind, sends) = match route.route {
                    Route::Default => ("默认", passes),
                    Route::Topic => ("主题", true),
                };
                let webhook = if config.slack.webhook.is_none() {
                    "未配置webhook"
                } else if sends {
                    "发送"
                } else {
                    "低于阈值"
                };
                println!("{:<24} {:<4} {}", route.name, kind, webhook);
            }
        }
        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init {
            config_path,
            force,
            template,
        } = &args.command
        {
            self.create_config_file(config_path, *force, template).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(
        &self,
        config_path: &Path,
        force: bool,
        template: &ConfigTemplate,
    ) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(config_path, Self::template_content(template)).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件填写 webhook 和频道");

        Ok(())
    }

    /// 配置模板内容
    fn template_content(template: &ConfigTemplate) -> &'static str {
        match template {
            ConfigTemplate::Minimal => include_str!("../../demos/minimal_config.toml"),
            ConfigTemplate::Full => include_str!("../../demos/full_config.toml"),
        }
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file: PathBuf = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let config = load_config(config_path).await?;
        let slack = &config.slack;

        if verbose {
            println!("配置验证通过！");
            println!("Slack 配置:");
            println!("  webhook: {}", if slack.webhook.is_some() { "已配置" } else { "未配置" });
            println!("  token: {}", if slack.token.is_some() { "已配置" } else { "未配置" });
            println!("  默认频道: {}", slack.channel.as_deref().unwrap_or("无"));
            println!(
                "  级别阈值: {}",
                slack.log_level.map(|l| l.to_string()).unwrap_or_else(|| "无".to_string())
            );
            println!("  附件模板: {}", slack.format.as_deref().unwrap_or("无"));
            println!("  API 地址: {}", slack.api_base_url);
            println!("  请求超时: {}秒", slack.request_timeout_seconds);

            let mut topics: Vec<_> = slack.topics.iter().collect();
            topics.sort();
            println!("主题映射:");
            for (topic, channel) in topics {
                println!("  {topic} -> {channel}");
            }

            println!("级别路由:");
            for level in Level::ALL {
                let channels = crate::notification::resolve_channels(slack, level, None);
                println!("  {:<5} -> {:?}", level, channels);
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个主题映射", slack.topics.len());
        }

        Ok(())
    }
}
