//! SMS provider capability interface and the IPROG client
//!
//! The gateway is reached through a small trait so the concrete HTTP client
//! can be swapped for a fake in tests. Dispatch is at-most-once: a failed
//! request is reported, never retried.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::formatter;
use crate::models::SmsConfig;

/// Outcome of a single send attempt
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// True when the gateway accepted the message
    pub success: bool,
    /// Human-readable description of the outcome
    pub message: String,
    /// Provider-assigned message id, when accepted
    pub message_id: Option<String>,
    /// Raw provider response body, when one was received
    pub raw_response: Option<String>,
}

impl SendOutcome {
    /// Build a failed outcome with a diagnostic message
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            message_id: None,
            raw_response: None,
        }
    }
}

/// Capability interface for dispatching a single SMS
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Send one message to one phone number, at most once.
    ///
    /// Transport and provider failures are reported through the returned
    /// [`SendOutcome`], not as errors; `Err` is reserved for conditions that
    /// make the attempt itself impossible to describe.
    async fn send(&self, phone: &str, message: &str) -> Result<SendOutcome>;
}

/// Shape of the IPROG gateway's JSON reply
#[derive(Debug, Deserialize)]
struct IprogResponse {
    /// Numeric 200 or the string "success" on acceptance
    status: Option<serde_json::Value>,
    /// Provider diagnostic text
    message: Option<String>,
    /// Message id, present on acceptance for some account types
    message_id: Option<String>,
    /// Additional payload; newer API revisions nest the message id here
    data: Option<serde_json::Value>,
}

impl IprogResponse {
    fn accepted(&self) -> bool {
        match &self.status {
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(200),
            Some(serde_json::Value::String(s)) => {
                s.eq_ignore_ascii_case("success") || s == "200"
            }
            _ => false,
        }
    }

    fn resolved_message_id(&self) -> Option<String> {
        if let Some(id) = &self.message_id {
            return Some(id.clone());
        }

        let data = self.data.as_ref()?;
        match data.get("message_id") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// HTTP client for the IPROG SMS gateway
pub struct IprogClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_name: Option<String>,
}

impl IprogClient {
    /// Build a client from the stored provider configuration
    pub fn new(config: &SmsConfig, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_name: config.sender_name.clone(),
        })
    }

    fn interpret_response(http_status: reqwest::StatusCode, body: &str) -> SendOutcome {
        if !http_status.is_success() {
            return SendOutcome {
                success: false,
                message: format!("Gateway returned HTTP {http_status}"),
                message_id: None,
                raw_response: Some(body.to_string()),
            };
        }

        match serde_json::from_str::<IprogResponse>(body) {
            Ok(parsed) if parsed.accepted() => SendOutcome {
                success: true,
                message: parsed
                    .message
                    .clone()
                    .unwrap_or_else(|| "Message accepted".to_string()),
                message_id: parsed.resolved_message_id(),
                raw_response: Some(body.to_string()),
            },
            Ok(parsed) => SendOutcome {
                success: false,
                message: parsed
                    .message
                    .unwrap_or_else(|| "Gateway rejected the message".to_string()),
                message_id: None,
                raw_response: Some(body.to_string()),
            },
            Err(e) => SendOutcome {
                success: false,
                message: format!("Unparseable gateway response: {e}"),
                message_id: None,
                raw_response: Some(body.to_string()),
            },
        }
    }
}

#[async_trait]
impl SmsProvider for IprogClient {
    async fn send(&self, phone: &str, message: &str) -> Result<SendOutcome> {
        // A missing key means the attempt is doomed; fail before touching the
        // network so misconfiguration never burns gateway quota.
        if self.api_key.trim().is_empty() {
            warn!("SMS dispatch refused: API key is missing");
            return Ok(SendOutcome::failure(
                "IPROG API key is missing or empty; message not sent",
            ));
        }

        let body = formatter::format_message(message);
        if body.is_empty() {
            return Ok(SendOutcome::failure(
                "Message is empty after formatting; nothing to send",
            ));
        }

        let mut form = vec![
            ("api_token", self.api_key.as_str()),
            ("phone_number", phone),
            ("message", body.as_str()),
        ];
        if let Some(sender) = &self.sender_name {
            form.push(("sender_name", sender.as_str()));
        }

        debug!(phone, length = body.len(), "Dispatching SMS through IPROG");

        let response = match self.http.post(&self.api_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "SMS transport error");
                return Ok(SendOutcome::failure(format!("Transport error: {e}")));
            }
        };

        let http_status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return Ok(SendOutcome::failure(format!(
                    "Failed to read gateway response: {e}"
                )))
            }
        };

        Ok(Self::interpret_response(http_status, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepting_response_with_message_id() {
        let body = r#"{"status":200,"message":"queued","message_id":"abc-123"}"#;
        let outcome = IprogClient::interpret_response(reqwest::StatusCode::OK, body);
        assert!(outcome.success);
        assert_eq!(outcome.message_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_accepting_response_with_nested_message_id() {
        let body = r#"{"status":"success","data":{"message_id":9981}}"#;
        let outcome = IprogClient::interpret_response(reqwest::StatusCode::OK, body);
        assert!(outcome.success);
        assert_eq!(outcome.message_id.as_deref(), Some("9981"));
    }

    #[test]
    fn test_provider_error_payload() {
        let body = r#"{"status":401,"message":"Invalid API token"}"#;
        let outcome = IprogClient::interpret_response(reqwest::StatusCode::OK, body);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid API token");
    }

    #[test]
    fn test_non_success_http_status() {
        let outcome =
            IprogClient::interpret_response(reqwest::StatusCode::SERVICE_UNAVAILABLE, "oops");
        assert!(!outcome.success);
        assert!(outcome.message.contains("503"));
        assert_eq!(outcome.raw_response.as_deref(), Some("oops"));
    }

    #[test]
    fn test_unparseable_body() {
        let outcome = IprogClient::interpret_response(reqwest::StatusCode::OK, "<html>gateway</html>");
        assert!(!outcome.success);
        assert!(outcome.message.contains("Unparseable"));
    }
}
