//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, FunnelConfig};
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从内容推断格式 (rc 文件没有扩展名)
    pub fn sniff(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Toml
        }
    }
}

/// 解析 TOML 格式
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    toml::from_str(content)
        .map_err(|e| ContractError::config_parse_caused(format!("TOML parse error: {e}"), e))
}

/// 解析 JSON 格式
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    serde_json::from_str(content)
        .map_err(|e| ContractError::config_parse_caused(format!("JSON parse error: {e}"), e))
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<FunnelConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 解析为 TOML 表 (用于分层合并)
pub fn parse_table(content: &str) -> Result<toml::Table, ContractError> {
    match ConfigFormat::sniff(content) {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => {
            let value: serde_json::Value = parse_json(content)?;
            let value = toml::Value::try_from(value).map_err(|e| {
                ContractError::config_parse_caused(
                    format!("JSON is not representable as a table: {e}"),
                    e,
                )
            })?;
            match value {
                toml::Value::Table(table) => Ok(table),
                other => Err(ContractError::config_parse(format!(
                    "expected a table at top level, got {}",
                    other.type_str()
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
title = "[prod] error"

[log]
path = "/var/log/app-errors.log"

[notify]
recipients = "ops@example.com"
"#;
        let result = parse_toml::<FunnelConfig>(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.title.as_deref(), Some("[prod] error"));
        assert_eq!(config.backlog_warning, 100);
        assert!(config.trace);
        assert_eq!(config.notify.unwrap().recipients.len(), 1);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "backlog_warning": 8,
            "notify": {
                "recipients": ["a@x.com", "b@x.com"],
                "mail": { "auth": { "user": "bot@x.com" } }
            }
        }"#;
        let result = parse_json::<FunnelConfig>(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.backlog_warning, 8);
        assert!(config.log.is_none());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml::<FunnelConfig>(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_parse_table_sniffs_json() {
        let table = parse_table(r#"{"auth": {"user": "bot@x.com"}, "port": 25}"#).unwrap();
        assert_eq!(table["port"].as_integer(), Some(25));
        assert_eq!(table["auth"]["user"].as_str(), Some("bot@x.com"));

        let table = parse_table("port = 465\n[auth]\nuser = \"bot@x.com\"\n").unwrap();
        assert_eq!(table["port"].as_integer(), Some(465));
    }

    #[test]
    fn test_parse_table_rejects_non_table_json() {
        assert!(parse_table("[1, 2]").is_err());
    }
}
