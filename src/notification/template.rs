//! 消息模板模块
//!
//! 提供附件内容的模板渲染功能

use crate::config::types::FormatEngine;
use crate::error::NotifyError;
use crate::notification::attachment::value_to_text;
use handlebars::Handlebars;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// 模板上下文数据
///
/// 有序的字段列表，同名字段以后写入的为准。
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    entries: Vec<(String, Value)>,
}

impl TemplateContext {
    /// 创建空的上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个字段
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// 批量追加字段
    pub fn extend<I, K>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.entries
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
    }

    /// 查找字段值（最后写入的优先）
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// 转换为JSON对象
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.entries {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// 消息模板trait
pub trait MessageTemplate: Send + Sync {
    /// 渲染模板
    ///
    /// # 参数
    /// * `context` - 模板上下文
    ///
    /// # 返回
    /// * `Result<String, NotifyError>` - 渲染后的内容
    fn render(&self, context: &TemplateContext) -> Result<String, NotifyError>;

    /// 验证模板语法
    ///
    /// # 返回
    /// * `Result<(), NotifyError>` - 验证结果
    fn validate(&self) -> Result<(), NotifyError>;
}

/// 匹配 `<%= field %>` 占位符
fn placeholder_regex() -> Result<&'static Regex, NotifyError> {
    static PLACEHOLDER: OnceLock<Result<Regex, String>> = OnceLock::new();

    PLACEHOLDER
        .get_or_init(|| {
            Regex::new(r"<%=\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*%>").map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| NotifyError::Template(format!("正则表达式错误: {e}")))
}

/// 简单的占位符替换模板，语法为 `<%= field %>`
pub struct SimpleTemplate {
    /// 模板字符串
    template: String,
}

impl SimpleTemplate {
    /// 创建新的简单模板
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl MessageTemplate for SimpleTemplate {
    fn render(&self, context: &TemplateContext) -> Result<String, NotifyError> {
        let regex = placeholder_regex()?;
        let rendered = regex.replace_all(&self.template, |caps: &regex::Captures<'_>| {
            context
                .get(&caps[1])
                .map(value_to_text)
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    fn validate(&self) -> Result<(), NotifyError> {
        let regex = placeholder_regex()?;
        let stripped = regex.replace_all(&self.template, "");
        if stripped.contains("<%") || stripped.contains("%>") {
            return Err(NotifyError::Template(format!(
                "模板包含无法识别的占位符: {}",
                self.template
            )));
        }
        Ok(())
    }
}

const HANDLEBARS_TEMPLATE_NAME: &str = "format";

/// Handlebars模板，语法为 `{{field}}`
pub struct HandlebarsTemplate {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplate {
    /// 创建并编译Handlebars模板
    ///
    /// # 参数
    /// * `template` - 模板字符串
    ///
    /// # 返回
    /// * `Result<Self, NotifyError>` - 编译失败时返回错误
    pub fn new(template: &str) -> Result<Self, NotifyError> {
        let mut registry = Handlebars::new();
        // 附件内容是纯文本
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(HANDLEBARS_TEMPLATE_NAME, template)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { registry })
    }
}

impl MessageTemplate for HandlebarsTemplate {
    fn render(&self, context: &TemplateContext) -> Result<String, NotifyError> {
        self.registry
            .render(HANDLEBARS_TEMPLATE_NAME, &context.to_json())
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    fn validate(&self) -> Result<(), NotifyError> {
        // 构造时已完成编译
        if self.registry.has_template(HANDLEBARS_TEMPLATE_NAME) {
            Ok(())
        } else {
            Err(NotifyError::Template("模板未注册".to_string()))
        }
    }
}

/// 按引擎类型创建模板
pub fn create_template(
    engine: FormatEngine,
    template: &str,
) -> Result<Box<dyn MessageTemplate>, NotifyError> {
    let template: Box<dyn MessageTemplate> = match engine {
        FormatEngine::Simple => Box::new(SimpleTemplate::new(template)),
        FormatEngine::Handlebars => Box::new(HandlebarsTemplate::new(template)?),
    };
    template.validate()?;
    Ok(template)
}
