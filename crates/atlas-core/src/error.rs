//! 统一错误处理系统

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 表单校验错误：字段级消息 + 非字段消息
///
/// 表单集合（formset）中的字段以 `protocols[<i>].<field>` 形式作为键，
/// 表单集合整体的错误以 `protocols` 作为键。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个字段级错误
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// 追加一个非字段错误
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        self.non_field.extend(other.non_field);
    }

    /// 无错误时返回 Ok，否则转换为 CoreError::Validation
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation { errors: self })
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        parts.extend(self.non_field.iter().cloned());
        write!(f, "{}", parts.join(", "))
    }
}

/// 核心错误类型 - 统一的错误处理
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CoreError {
    // === 请求校验 ===
    #[error("Validation failed: {errors}")]
    Validation { errors: ValidationErrors },

    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },

    // === 权限和安全错误 ===
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {operation}")]
    PermissionDenied { operation: String },

    // === 存储 ===
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("NATS error: {message}")]
    Nats { message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    // === 配置错误 ===
    #[error("Config error: {message}")]
    Config { message: String },

    // === 系统错误 ===
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// 创建实体未找到错误
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        CoreError::NotFound {
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
        }
    }

    /// 创建单字段校验错误
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        CoreError::Validation { errors }
    }

    pub fn permission_denied(operation: impl Into<String>) -> Self {
        CoreError::PermissionDenied {
            operation: operation.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        CoreError::Store {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config_error(message: impl Into<String>) -> Self {
        CoreError::Config {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal {
            message: message.into(),
        }
    }

    /// 取出校验错误（非校验错误返回 None）
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            CoreError::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

/// Core 操作的 Result 类型别名
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_into_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("hostname", "This field is required.");
        errors.add("hostname", "Too long.");
        errors.add_non_field("Something else");

        assert_eq!(errors.field("hostname").len(), 2);
        assert!(errors.field("ip").is_empty());

        let err = errors.into_result().unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("hostname"));
        assert_eq!(errors.non_field, vec!["Something else".to_string()]);
    }

    #[test]
    fn test_merge_keeps_both_sides() {
        let mut left = ValidationErrors::new();
        left.add("protocols", "Please submit 1 or more protocols.");
        let mut right = ValidationErrors::new();
        right.add("protocols", "other");
        right.add("nodes", "required");
        left.merge(right);

        assert_eq!(left.field("protocols").len(), 2);
        assert!(left.has_field("nodes"));
    }

    #[test]
    fn test_display_mentions_fields() {
        let err = CoreError::invalid_field("name", "Label with this name already exists.");
        let text = err.to_string();
        assert!(text.contains("name"));
        assert!(text.contains("already exists"));
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("Asset", "a-1");
        assert_eq!(err.to_string(), "Asset not found: a-1");
    }
}
