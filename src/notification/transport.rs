//! Slack 日志传输模块
//!
//! 解析目标频道、构建消息体并分发到 webhook 或 files.upload

use crate::config::types::SlackConfig;
use crate::error::{NotifyError, TransportError};
use crate::notification::attachment::{fix_attachment, AttachmentInput};
use crate::notification::channels::{resolve_channels, resolve_routes, Route};
use crate::notification::client::{HttpSlackClient, SlackClient};
use crate::notification::level::Level;
use crate::notification::payload::{stack_trace_attachment, Dispatch, UploadForm, WebhookPayload};
use crate::notification::template::{create_template, MessageTemplate, TemplateContext};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 单条日志事件的附加选项
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// 主题键
    pub topic: Option<String>,
    /// 附件
    pub attachment: Option<AttachmentInput>,
    /// 模板可用的额外字段
    pub fields: Vec<(String, Value)>,
}

impl LogOptions {
    /// 创建空选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置主题
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// 设置附件
    #[must_use]
    pub fn with_attachment(mut self, attachment: impl Into<AttachmentInput>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// 追加模板字段
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Slack 日志传输
///
/// 配置在构造后不可变；可以廉价克隆并在多个任务间共享。
#[derive(Clone)]
pub struct SlackTransport {
    config: Arc<SlackConfig>,
    hostname: String,
    client: Arc<dyn SlackClient>,
    template: Option<Arc<dyn MessageTemplate>>,
}

impl std::fmt::Debug for SlackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackTransport")
            .field("config", &self.config)
            .field("hostname", &self.hostname)
            .field("has_template", &self.template.is_some())
            .finish()
    }
}

impl SlackTransport {
    /// 使用 reqwest 客户端创建传输
    ///
    /// # 参数
    /// * `config` - Slack 配置
    ///
    /// # 返回
    /// * `Result<Self, TransportError>` - 模板无效或客户端创建失败时返回错误
    pub fn new(config: SlackConfig) -> Result<Self, TransportError> {
        let client = HttpSlackClient::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        Self::with_client(config, Arc::new(client))
    }

    /// 使用自定义客户端创建传输
    pub fn with_client(
        config: SlackConfig,
        client: Arc<dyn SlackClient>,
    ) -> Result<Self, TransportError> {
        let template: Option<Arc<dyn MessageTemplate>> = match &config.format {
            Some(format) => Some(Arc::from(create_template(config.format_engine, format)?)),
            None => None,
        };

        let hostname = config.username.clone().unwrap_or_else(resolve_hostname);

        Ok(Self {
            config: Arc::new(config),
            hostname,
            client,
            template,
        })
    }

    /// 覆盖显示用的主机名
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// 显示用户名（主机名）
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// 当前配置
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    /// 解析目标频道
    pub fn resolve_channels(&self, level: Level, options: &LogOptions) -> Vec<String> {
        resolve_channels(&self.config, level, options.topic.as_deref())
    }

    /// 计算一条日志事件需要执行的全部 Slack 调用
    ///
    /// 默认频道的 webhook 受 `log_level` 过滤，主题频道不受过滤；
    /// 附件上传只在配置了 token 时发生，默认不受级别过滤。
    pub fn plan(&self, level: Level, message: &str, options: &LogOptions) -> Vec<Dispatch> {
        let routes = resolve_routes(&self.config, level, options.topic.as_deref());
        if routes.is_empty() {
            debug!(%level, topic = ?options.topic, "没有匹配的 Slack 频道，跳过");
            return Vec::new();
        }

        let level_passes = level.passes(self.config.log_level);
        let mut dispatches = Vec::new();

        if let Some(webhook) = &self.config.webhook {
            let attachments = (level == Level::Error).then(|| vec![stack_trace_attachment(message)]);

            for route in &routes {
                if route.route == Route::Default && !level_passes {
                    debug!(channel = %route.name, %level, "级别未达到阈值，跳过默认频道");
                    continue;
                }
                dispatches.push(Dispatch::Webhook {
                    url: webhook.clone(),
                    payload: WebhookPayload {
                        text: message.to_string(),
                        username: self.hostname.clone(),
                        channel: route.name.clone(),
                        icon_emoji: self.config.icon_emoji.clone(),
                        attachments: attachments.clone(),
                    },
                });
            }
        } else {
            debug!("未配置 webhook，跳过消息发送");
        }

        if let Some(input) = &options.attachment {
            match &self.config.token {
                Some(_) if self.config.gate_attachments && !level_passes => {
                    debug!(%level, "级别未达到阈值，跳过附件上传");
                }
                Some(token) => {
                    let base = self.upload_form(token, input, options);
                    for route in &routes {
                        dispatches.push(Dispatch::Upload(UploadForm {
                            channels: route.name.clone(),
                            ..base.clone()
                        }));
                    }
                }
                None => debug!("未配置 token，跳过附件上传"),
            }
        }

        dispatches
    }

    /// 发送日志事件（发出即忘）
    ///
    /// 每个调用在当前 tokio 运行时上独立执行，失败只记录日志，不重试。
    /// 返回的句柄可以直接丢弃。
    pub fn emit_log(&self, level: Level, message: &str, options: &LogOptions) -> Vec<JoinHandle<()>> {
        let dispatches = self.plan(level, message, options);
        if dispatches.is_empty() {
            return Vec::new();
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(count = dispatches.len(), "当前没有 tokio 运行时，丢弃 Slack 消息");
                return Vec::new();
            }
        };

        dispatches
            .into_iter()
            .map(|dispatch| {
                let client = Arc::clone(&self.client);
                runtime.spawn(async move {
                    if let Err(e) = execute(client.as_ref(), &dispatch).await {
                        warn!(channel = %dispatch.channel(), error = %e, "Slack 消息发送失败");
                    }
                })
            })
            .collect()
    }

    /// 发送日志事件并等待全部调用完成
    ///
    /// # 返回
    /// * `Result<usize, NotifyError>` - 成功发送的调用数；任一调用失败时返回 [`NotifyError::Delivery`]
    pub async fn deliver(
        &self,
        level: Level,
        message: &str,
        options: &LogOptions,
    ) -> Result<usize, NotifyError> {
        let dispatches = self.plan(level, message, options);
        let total = dispatches.len();

        let results = join_all(
            dispatches
                .iter()
                .map(|dispatch| execute(self.client.as_ref(), dispatch)),
        )
        .await;

        let mut failed = 0;
        for (dispatch, result) in dispatches.iter().zip(results) {
            if let Err(e) = result {
                warn!(channel = %dispatch.channel(), error = %e, "Slack 消息发送失败");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NotifyError::Delivery { failed, total });
        }
        Ok(total)
    }

    /// 构建上传表单（不含频道）
    fn upload_form(&self, token: &str, input: &AttachmentInput, options: &LogOptions) -> UploadForm {
        let attachment = fix_attachment(input);

        let content = match &self.template {
            Some(template) => {
                let mut context = TemplateContext::new();
                context.extend(options.fields.iter().cloned());
                context.extend(input.raw_fields());
                context.extend(
                    attachment
                        .fields()
                        .map(|(k, v)| (k, Value::String(v.to_string()))),
                );
                template.render(&context).unwrap_or_else(|e| {
                    warn!(error = %e, "附件模板渲染失败，使用原始内容");
                    attachment.data.clone()
                })
            }
            None => attachment.data.clone(),
        };

        UploadForm {
            token: token.to_string(),
            content,
            channels: String::new(),
            filename: attachment.filename,
            filetype: attachment.filetype,
            title: attachment.title,
        }
    }
}

/// 执行单个 Slack 调用
async fn execute(client: &dyn SlackClient, dispatch: &Dispatch) -> Result<(), NotifyError> {
    match dispatch {
        Dispatch::Webhook { url, payload } => client.send_webhook(url, payload).await,
        Dispatch::Upload(form) => client.upload_file(form).await,
    }
}

/// 获取本机主机名
pub fn resolve_hostname() -> String {
    #[cfg(unix)]
    {
        if let Some(name) = nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
        {
            return name;
        }
    }

    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}
