//! 附件规范化模块
//!
//! 将任意形态的附件输入（字符串、部分对象、错误、任意对象）
//! 规范化为固定的四个字段：filename、filetype、title、data

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 规范化附件的字段名
pub const ATTACHMENT_KEYS: [&str; 4] = ["filename", "filetype", "title", "data"];

const DEFAULT_FILENAME: &str = "attachment.txt";
const DEFAULT_FILETYPE: &str = "text";
const DEFAULT_TITLE: &str = "Attachment";

/// 规范化后的附件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// 文件名
    pub filename: String,
    /// 文件类型
    pub filetype: String,
    /// 标题
    pub title: String,
    /// 文件内容
    pub data: String,
}

impl Default for Attachment {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            filetype: DEFAULT_FILETYPE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            data: String::new(),
        }
    }
}

impl Attachment {
    /// 按固定顺序返回四个字段
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("filename", self.filename.as_str()),
            ("filetype", self.filetype.as_str()),
            ("title", self.title.as_str()),
            ("data", self.data.as_str()),
        ]
    }
}

/// 附件输入
///
/// 在边界处把附件分类为以下几种形态，之后按形态分别规范化。
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentInput {
    /// 空值
    Empty,
    /// 纯文本，直接作为 data
    Text(String),
    /// 错误值
    ErrorValue {
        /// 错误类型名称
        kind: String,
        /// 错误信息
        message: String,
    },
    /// 带 data 字段的部分附件对象
    Structured(Map<String, Value>),
    /// 不具备附件结构的任意值
    Arbitrary(Value),
}

impl AttachmentInput {
    /// 对JSON值进行分类
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => AttachmentInput::Empty,
            Value::String(text) if text.is_empty() => AttachmentInput::Empty,
            Value::String(text) => AttachmentInput::Text(text),
            Value::Object(map) if map.contains_key("data") => AttachmentInput::Structured(map),
            other => AttachmentInput::Arbitrary(other),
        }
    }

    /// 解析文本输入：JSON 对象按对象处理，其余按纯文本处理
    pub fn parse_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => AttachmentInput::from_value(value),
            _ => AttachmentInput::from(text),
        }
    }

    /// 从错误值构造，类型名取最后一段路径
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        AttachmentInput::ErrorValue {
            kind: short_type_name(std::any::type_name::<E>()).to_string(),
            message: err.to_string(),
        }
    }

    /// 原始对象中的键值对，供模板渲染使用
    pub fn raw_fields(&self) -> Vec<(String, Value)> {
        match self {
            AttachmentInput::Structured(map) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            AttachmentInput::Arbitrary(Value::Object(map)) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<String> for AttachmentInput {
    fn from(text: String) -> Self {
        AttachmentInput::from_value(Value::String(text))
    }
}

impl From<&str> for AttachmentInput {
    fn from(text: &str) -> Self {
        AttachmentInput::from(text.to_string())
    }
}

impl From<Value> for AttachmentInput {
    fn from(value: Value) -> Self {
        AttachmentInput::from_value(value)
    }
}

/// 判断值是否具备附件结构：是对象且包含 data 字段
pub fn has_attachment_structure(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("data"))
}

/// 将附件输入规范化为恰好四个字段
pub fn fix_attachment(input: &AttachmentInput) -> Attachment {
    match input {
        AttachmentInput::Empty => Attachment::default(),
        AttachmentInput::Text(text) => Attachment {
            data: text.clone(),
            ..Attachment::default()
        },
        AttachmentInput::ErrorValue { kind, message } => Attachment {
            data: format!("{kind}: {message}"),
            ..Attachment::default()
        },
        AttachmentInput::Structured(map) => {
            let mut attachment = Attachment::default();
            if let Some(value) = map.get("filename") {
                attachment.filename = value_to_text(value);
            }
            if let Some(value) = map.get("filetype") {
                attachment.filetype = value_to_text(value);
            }
            if let Some(value) = map.get("title") {
                attachment.title = value_to_text(value);
            }
            if let Some(value) = map.get("data") {
                attachment.data = value_to_text(value);
            }
            attachment
        }
        AttachmentInput::Arbitrary(value) => Attachment {
            data: pretty_json(value),
            ..Attachment::default()
        },
    }
}

/// 字符串原样返回，其他值按JSON格式化
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => pretty_json(value),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `std::io::error::Error` -> `Error`
fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys_of(attachment: &Attachment) -> Vec<String> {
        let value = serde_json::to_value(attachment).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn canonical_keys() -> Vec<String> {
        let mut keys: Vec<String> = ATTACHMENT_KEYS.iter().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_has_attachment_structure() {
        assert!(!has_attachment_structure(&json!("")));
        assert!(!has_attachment_structure(&json!({})));
        assert!(has_attachment_structure(&json!({ "data": "" })));
        assert!(!has_attachment_structure(&Value::Null));
    }

    #[test]
    fn test_fix_partial_object() {
        let input = AttachmentInput::from_value(json!({ "data": "test_data" }));
        let result = fix_attachment(&input);
        assert_eq!(keys_of(&result), canonical_keys());
        assert_eq!(result.data, "test_data");
        assert_eq!(result.filename, "attachment.txt");
    }

    #[test]
    fn test_fix_string() {
        let result = fix_attachment(&AttachmentInput::from("test_data"));
        assert_eq!(keys_of(&result), canonical_keys());
        assert_eq!(result.data, "test_data");
    }

    #[test]
    fn test_fix_error_value() {
        let err = std::io::Error::other("test");
        let result = fix_attachment(&AttachmentInput::from_error(&err));
        assert_eq!(keys_of(&result), canonical_keys());
        assert_eq!(result.data, "Error: test");
    }

    #[test]
    fn test_fix_random_object() {
        let result = fix_attachment(&AttachmentInput::from_value(json!({ "test": "x" })));
        assert_eq!(keys_of(&result), canonical_keys());
        assert_eq!(result.data, "{\n  \"test\": \"x\"\n}");
    }

    #[test]
    fn test_fix_random_object_keeps_key_order() {
        let expected = "{\n  \"zeta\": \"1\",\n  \"alpha\": \"2\"\n}";

        let from_value = fix_attachment(&AttachmentInput::from_value(json!({
            "zeta": "1",
            "alpha": "2"
        })));
        assert_eq!(from_value.data, expected);

        let from_text = fix_attachment(&AttachmentInput::parse_text(r#"{"zeta":"1","alpha":"2"}"#));
        assert_eq!(from_text.data, expected);
    }

    #[test]
    fn test_fix_structured_drops_extra_keys() {
        let input = AttachmentInput::from_value(json!({
            "other": "foo",
            "data": { "a": 1 },
            "title": "crash report"
        }));
        let result = fix_attachment(&input);
        assert_eq!(keys_of(&result), canonical_keys());
        assert_eq!(result.title, "crash report");
        assert_eq!(result.data, "{\n  \"a\": 1\n}");

        // 额外字段仍可用于模板
        let raw = input.raw_fields();
        assert!(raw.iter().any(|(k, v)| k == "other" && v == "foo"));
    }

    #[test]
    fn test_classify_empty_values() {
        assert_eq!(AttachmentInput::from_value(Value::Null), AttachmentInput::Empty);
        assert_eq!(AttachmentInput::from(""), AttachmentInput::Empty);
        assert_eq!(fix_attachment(&AttachmentInput::Empty), Attachment::default());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("my::ParseFailure<alloc::string::String>"), "ParseFailure");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_parse_text() {
        assert!(matches!(
            AttachmentInput::parse_text(r#"{"data":"x"}"#),
            AttachmentInput::Structured(_)
        ));
        assert!(matches!(
            AttachmentInput::parse_text(r#"{"test":"x"}"#),
            AttachmentInput::Arbitrary(_)
        ));
        assert_eq!(
            AttachmentInput::parse_text("[1, 2]"),
            AttachmentInput::Text("[1, 2]".to_string())
        );
        assert_eq!(AttachmentInput::parse_text(""), AttachmentInput::Empty);
    }
}
