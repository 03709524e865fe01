//! Slack HTTP 客户端模块
//!
//! 定义 Slack 调用的trait，并基于 reqwest 实现 webhook 与 files.upload

use crate::error::NotifyError;
use crate::notification::payload::{UploadForm, WebhookPayload};
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Slack 客户端trait
#[async_trait]
pub trait SlackClient: Send + Sync {
    /// 发送 webhook 消息
    ///
    /// # 参数
    /// * `url` - webhook 地址
    /// * `payload` - 消息体
    ///
    /// # 返回
    /// * `Result<(), NotifyError>` - 发送结果
    async fn send_webhook(&self, url: &str, payload: &WebhookPayload) -> Result<(), NotifyError>;

    /// 上传文件
    ///
    /// # 参数
    /// * `form` - 上传表单
    ///
    /// # 返回
    /// * `Result<(), NotifyError>` - 上传结果
    async fn upload_file(&self, form: &UploadForm) -> Result<(), NotifyError>;
}

/// Slack Web API 的通用响应
#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    error: Option<String>,
}

/// 基于 reqwest 的 Slack 客户端
pub struct HttpSlackClient {
    /// HTTP客户端
    client: Client,
    /// Slack Web API 地址
    api_base_url: String,
}

impl HttpSlackClient {
    /// 创建新的客户端
    ///
    /// # 参数
    /// * `api_base_url` - Slack Web API 地址
    /// * `timeout` - 请求超时时间
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base_url: api_base_url.into(),
        })
    }

    /// 构建 API 方法地址
    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url.trim_end_matches('/'))
    }

    /// 检查HTTP状态码
    async fn check_status(response: Response) -> Result<Response, NotifyError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Slack API 触发限流");
            return Err(NotifyError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Slack 请求失败: {} - {}", status, body);
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl SlackClient for HttpSlackClient {
    async fn send_webhook(&self, url: &str, payload: &WebhookPayload) -> Result<(), NotifyError> {
        debug!(channel = %payload.channel, "发送 Slack webhook 消息");

        let response = self.client.post(url).json(payload).send().await?;
        Self::check_status(response).await?;

        debug!(channel = %payload.channel, "Slack webhook 消息发送成功");
        Ok(())
    }

    async fn upload_file(&self, form: &UploadForm) -> Result<(), NotifyError> {
        let url = self.api_url("files.upload");
        debug!(channel = %form.channels, filename = %form.filename, "上传 Slack 附件");

        let multipart = Form::new()
            .text("token", form.token.clone())
            .text("content", form.content.clone())
            .text("channels", form.channels.clone())
            .text("filename", form.filename.clone())
            .text("filetype", form.filetype.clone())
            .text("title", form.title.clone());

        let response = self.client.post(&url).multipart(multipart).send().await?;
        let response = Self::check_status(response).await?;

        let api_response: SlackApiResponse = response.json().await?;
        if !api_response.ok {
            let error_code = api_response
                .error
                .unwrap_or_else(|| "unknown_error".to_string());
            error!("Slack 附件上传失败: {}", error_code);
            return Err(NotifyError::Api(error_code));
        }

        debug!(channel = %form.channels, "Slack 附件上传成功");
        Ok(())
    }
}
