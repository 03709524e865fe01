//! tracing 到 Slack 的桥接层
//!
//! 把达到最低级别的 tracing 事件转交给 [`SlackTransport`] 发送

use crate::notification::attachment::AttachmentInput;
use crate::notification::level::Level;
use crate::notification::transport::{LogOptions, SlackTransport};
use serde_json::Value;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// 默认忽略的事件来源，避免发送过程中产生的日志再次被转发
const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "slack_log_transport",
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "tokio",
    "mio",
];

/// 把 tracing 事件转发到 Slack 的 Layer
#[derive(Debug, Clone)]
pub struct SlackLayer {
    transport: SlackTransport,
    min_level: Level,
    ignored_targets: Vec<String>,
}

impl SlackLayer {
    /// 创建新的转发层
    ///
    /// # 参数
    /// * `transport` - Slack 传输
    /// * `min_level` - 转发的最低级别
    pub fn new(transport: SlackTransport, min_level: Level) -> Self {
        Self {
            transport,
            min_level,
            ignored_targets: DEFAULT_IGNORED_TARGETS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    /// 额外忽略一个事件来源（包含其子模块）
    #[must_use]
    pub fn ignore_target(mut self, target: impl Into<String>) -> Self {
        self.ignored_targets.push(target.into());
        self
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets.iter().any(|ignored| {
            target == ignored
                || target
                    .strip_prefix(ignored.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

impl<S: Subscriber> Layer<S> for SlackLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        if level < self.min_level || self.is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let (message, options) = visitor.finish();

        // 发出即忘
        drop(self.transport.emit_log(level, &message, &options));
    }
}

/// 收集事件字段
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    options: LogOptions,
}

impl EventVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => {
                self.message = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            }
            "topic" => {
                if let Value::String(topic) = value {
                    self.options.topic = Some(topic);
                }
            }
            "attachment" => {
                let input = match value {
                    // 字段值可能是序列化后的JSON
                    Value::String(s) => AttachmentInput::parse_text(s),
                    other => AttachmentInput::from_value(other),
                };
                self.options.attachment = Some(input);
            }
            name => self.options.fields.push((name.to_string(), value)),
        }
    }

    fn finish(self) -> (String, LogOptions) {
        (self.message.unwrap_or_default(), self.options)
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if field.name() == "attachment" {
            self.options.attachment = Some(AttachmentInput::ErrorValue {
                kind: "Error".to_string(),
                message: value.to_string(),
            });
            return;
        }
        self.record_value(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::from(format!("{value:?}")));
    }
}
