//! 通知模块
//!
//! 提供 Slack 频道解析、附件规范化、模板渲染和消息分发功能

pub mod attachment;
pub mod channels;
pub mod client;
pub mod level;
pub mod payload;
pub mod template;
pub mod transport;

// 重新导出主要类型
pub use attachment::{fix_attachment, has_attachment_structure, Attachment, AttachmentInput};
pub use channels::{resolve_channels, ResolvedChannel, Route};
pub use client::{HttpSlackClient, SlackClient};
pub use level::Level;
pub use payload::{Dispatch, UploadForm, WebhookAttachment, WebhookPayload};
pub use template::{HandlebarsTemplate, MessageTemplate, SimpleTemplate, TemplateContext};
pub use transport::{LogOptions, SlackTransport};
