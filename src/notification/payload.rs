//! Slack 消息体定义
//!
//! webhook JSON 消息体、files.upload 表单以及堆栈附件的构建

use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;

/// 堆栈附件中最多保留的帧数
const MAX_STACK_FRAMES: usize = 20;

/// webhook 消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// 消息文本
    pub text: String,
    /// 显示用户名（主机名）
    pub username: String,
    /// 目标频道
    pub channel: String,
    /// 头像 emoji
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    /// 结构化附件，仅错误级别事件携带
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<WebhookAttachment>>,
}

/// webhook 结构化附件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAttachment {
    /// 不支持附件的客户端显示的文本
    pub fallback: String,
    /// 边条颜色
    pub color: String,
    /// 标题
    pub title: String,
    /// 正文
    pub text: String,
    /// 字段列表
    pub fields: Vec<AttachmentField>,
    /// 时间戳（秒）
    pub ts: i64,
}

/// 附件字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    /// 字段标题
    pub title: String,
    /// 字段值
    pub value: String,
    /// 是否短字段
    pub short: bool,
}

/// files.upload 表单
#[derive(Clone, PartialEq, Serialize)]
pub struct UploadForm {
    /// API token
    #[serde(skip_serializing)]
    pub token: String,
    /// 文件内容
    pub content: String,
    /// 目标频道
    pub channels: String,
    /// 文件名
    pub filename: String,
    /// 文件类型
    pub filetype: String,
    /// 标题
    pub title: String,
}

impl std::fmt::Debug for UploadForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadForm")
            .field("token", &"[REDACTED]")
            .field("content", &self.content)
            .field("channels", &self.channels)
            .field("filename", &self.filename)
            .field("filetype", &self.filetype)
            .field("title", &self.title)
            .finish()
    }
}

/// 一次待执行的 Slack 调用
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    /// webhook 消息
    Webhook {
        /// webhook 地址
        #[serde(skip_serializing)]
        url: String,
        /// 消息体
        payload: WebhookPayload,
    },
    /// 文件上传
    Upload(UploadForm),
}

impl Dispatch {
    /// 目标频道
    pub fn channel(&self) -> &str {
        match self {
            Dispatch::Webhook { payload, .. } => &payload.channel,
            Dispatch::Upload(form) => &form.channels,
        }
    }
}

/// 捕获当前调用栈并构建堆栈附件
pub fn stack_trace_attachment(message: &str) -> WebhookAttachment {
    let backtrace = Backtrace::force_capture().to_string();
    build_stack_attachment(message, &backtrace)
}

/// 将 backtrace 文本解析为附件，每一帧一个字段
pub(crate) fn build_stack_attachment(message: &str, backtrace: &str) -> WebhookAttachment {
    let mut fields: Vec<AttachmentField> = Vec::new();

    for line in backtrace.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = fields.last_mut() {
                frame.value = location.to_string();
            }
            continue;
        }

        if fields.len() >= MAX_STACK_FRAMES {
            break;
        }

        let symbol = match line.split_once(": ") {
            Some((index, symbol)) if index.chars().all(|c| c.is_ascii_digit()) => symbol,
            _ => line,
        };
        fields.push(AttachmentField {
            title: symbol.to_string(),
            value: String::new(),
            short: false,
        });
    }

    if fields.is_empty() {
        fields.push(AttachmentField {
            title: "backtrace".to_string(),
            value: "unavailable".to_string(),
            short: false,
        });
    }

    WebhookAttachment {
        fallback: format!("Stack trace: {message}"),
        color: "danger".to_string(),
        title: "Stack trace".to_string(),
        text: message.to_string(),
        fields,
        ts: chrono::Utc::now().timestamp(),
    }
}
