//! Log level negotiation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP log level (RFC 5424 severities).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::Alert => "alert",
            Self::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// `logging/setLevel` parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetLogLevelParams {
    pub level: LogLevel,
}

/// `notifications/message` payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogMessage {
    pub level: LogLevel,
    /// Name of the component that logged, e.g. the tool name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
}

impl LogMessage {
    pub fn new(level: LogLevel, data: Value) -> Self {
        Self {
            level,
            logger: None,
            data,
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse_and_order() {
        let params: SetLogLevelParams =
            serde_json::from_value(serde_json::json!({ "level": "warning" })).unwrap();
        assert_eq!(params.level, LogLevel::Warning);
        assert!(LogLevel::Debug < LogLevel::Warning);
        assert_eq!(LogLevel::Critical.to_string(), "critical");
    }

    #[test]
    fn test_log_message_shape() {
        let message = LogMessage::new(LogLevel::Error, serde_json::json!({ "message": "boom" }))
            .with_logger("upload_slack_image");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["logger"], "upload_slack_image");
        assert_eq!(value["data"]["message"], "boom");
    }
}
