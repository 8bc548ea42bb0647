use anyhow::Result;
use school_sms_rust::{
    config::AppConfig,
    db::Database,
    formatter,
    provider::{IprogClient, SmsProvider},
};
use std::time::Duration;

/// One-off smoke harness: drives a live send end-to-end against the
/// configured IPROG gateway.
///
/// Usage: test_sms <phone> [message]
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let Some(phone) = args.get(1) else {
        eprintln!("Usage: test_sms <phone> [message]");
        std::process::exit(1);
    };
    let message = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "Test message from the school SMS harness.".to_string());

    let config = AppConfig::load()?;
    let db = Database::new(&config.get_database_url())?;

    println!("Testing SMS dispatch functionality...");
    println!("Formatted body: {:?}", formatter::format_message(&message));

    let Some(sms_config) = db.get_active_sms_config()? else {
        println!("No active SMS configuration found. SMS is disabled.");
        println!("Use the set-config command to store an active configuration first.");
        return Ok(());
    };

    println!(
        "Using provider {} at {}",
        sms_config.provider_name, sms_config.api_url
    );

    let client = IprogClient::new(
        &sms_config,
        Duration::from_secs(config.sms.request_timeout_secs),
    )?;

    let outcome = client.send(phone, &message).await?;

    println!("\nSend outcome:");
    println!("  success: {}", outcome.success);
    println!("  message: {}", outcome.message);
    if let Some(id) = &outcome.message_id {
        println!("  message id: {id}");
    }
    if let Some(raw) = &outcome.raw_response {
        println!("  raw response: {raw}");
    }

    Ok(())
}
