//! Integration tests for the IPROG provider client

use std::time::Duration;

use school_sms_rust::models::{SmsConfig, SmsConfigStatus};
use school_sms_rust::provider::{IprogClient, SmsProvider};

fn config_with_key(api_key: &str) -> SmsConfig {
    SmsConfig {
        id: 1,
        provider_name: "IPROG".to_string(),
        // Unroutable local port so an accidental network attempt fails fast
        api_url: "http://127.0.0.1:9/api/v1/sms_messages".to_string(),
        api_key: api_key.to_string(),
        sender_name: Some("DemoSchool".to_string()),
        status: SmsConfigStatus::Active,
    }
}

#[tokio::test]
async fn test_empty_api_key_fails_without_network_call() {
    let client = IprogClient::new(&config_with_key(""), Duration::from_secs(5))
        .expect("client build failed");

    let outcome = client
        .send("+639171234567", "hello")
        .await
        .expect("send returned an error");

    assert!(!outcome.success);
    assert!(outcome.message.contains("API key"));
    // No request was issued, so there is no response to report
    assert!(outcome.raw_response.is_none());
}

#[tokio::test]
async fn test_whitespace_api_key_treated_as_missing() {
    let client = IprogClient::new(&config_with_key("   "), Duration::from_secs(5))
        .expect("client build failed");

    let outcome = client
        .send("+639171234567", "hello")
        .await
        .expect("send returned an error");

    assert!(!outcome.success);
    assert!(outcome.message.contains("API key"));
}

#[tokio::test]
async fn test_message_empty_after_formatting_not_sent() {
    let client = IprogClient::new(&config_with_key("key-123"), Duration::from_secs(5))
        .expect("client build failed");

    let outcome = client
        .send("+639171234567", "\u{1F600}\u{1F601}")
        .await
        .expect("send returned an error");

    assert!(!outcome.success);
    assert!(outcome.message.contains("empty after formatting"));
}

#[tokio::test]
async fn test_transport_error_surfaces_as_failed_outcome() {
    let client = IprogClient::new(&config_with_key("key-123"), Duration::from_secs(5))
        .expect("client build failed");

    let outcome = client
        .send("+639171234567", "hello")
        .await
        .expect("send returned an error");

    assert!(!outcome.success);
    assert!(outcome.message.contains("Transport error"));
}
