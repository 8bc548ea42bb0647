mod config;
mod db;
mod error;
mod formatter;
mod logging;
mod models;
mod provider;
mod schema;
mod service;
mod validation;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::Database;
use crate::logging::init_logging;
use crate::models::{NewUser, SmsConfigStatus, SmsConfigUpdate, UserRole};
use crate::provider::IprogClient;
use crate::service::NotificationService;
use crate::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single test SMS through the configured gateway
    SendTest {
        /// Destination phone number
        #[arg(short, long)]
        phone: String,

        /// Message text to send
        #[arg(short, long)]
        message: String,
    },
    /// Notify parents of active students that a teacher is absent
    NotifyAbsence {
        /// User id of the absent teacher
        #[arg(short, long)]
        teacher_id: i64,

        /// Absence date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Inspect the absence log table, creating it if missing
    InspectLogs {
        /// Number of recent rows to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Update the stored SMS provider configuration
    SetConfig {
        /// Gateway endpoint URL
        #[arg(long)]
        api_url: Option<String>,

        /// Gateway API key
        #[arg(long)]
        api_key: Option<String>,

        /// Registered sender name
        #[arg(long)]
        sender: Option<String>,

        /// Configuration status (active or inactive)
        #[arg(long)]
        status: Option<String>,
    },
    /// Reset a user's password
    ResetPassword {
        /// Username of the account to update
        username: String,

        /// New password (minimum 6 characters)
        new_password: String,
    },
    /// Seed sample users, links, and configuration for local testing
    SeedDemo,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; hold the guard so buffered file output flushes
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(std::path::Path::new),
    )?;

    info!("Starting school-sms administration tool");

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize database with configuration
    let db = Database::new(&config.get_database_url())
        .context("Failed to open the school database")?;

    // Process command
    match &cli.command {
        Commands::SendTest { phone, message } => send_test(&config, db, phone, message).await?,
        Commands::NotifyAbsence { teacher_id, date } => {
            notify_absence(&config, db, *teacher_id, date.as_deref()).await?;
        }
        Commands::InspectLogs { limit } => inspect_logs(&db, *limit)?,
        Commands::SetConfig {
            api_url,
            api_key,
            sender,
            status,
        } => set_config(&db, api_url, api_key, sender, status)?,
        Commands::ResetPassword {
            username,
            new_password,
        } => reset_password(&db, username, new_password)?,
        Commands::SeedDemo => seed_demo(&db)?,
    }

    Ok(())
}

/// Build the notification service from the active provider configuration
///
/// Returns `None` when no configuration row is active, which callers report
/// as "SMS disabled" rather than an error.
fn build_service(config: &AppConfig, db: Database) -> Result<Option<NotificationService>> {
    let Some(sms_config) = db.get_active_sms_config()? else {
        return Ok(None);
    };

    let provider = IprogClient::new(
        &sms_config,
        Duration::from_secs(config.sms.request_timeout_secs),
    )?;

    Ok(Some(NotificationService::new(
        db,
        Box::new(provider),
        config.notification.absence_template.clone(),
    )))
}

/// Send one test message through the live gateway
async fn send_test(config: &AppConfig, db: Database, phone: &str, message: &str) -> Result<()> {
    let Some(service) = build_service(config, db)? else {
        println!("SMS notifications are disabled: no active provider configuration.");
        return Ok(());
    };

    // Strip control characters that terminals sometimes smuggle into argv
    let message = InputValidator::sanitize_text(message);

    info!(phone, "Sending test SMS");
    let outcome = service.send_test(phone, &message).await?;

    if outcome.success {
        println!("Message accepted by the gateway.");
        if let Some(id) = &outcome.message_id {
            println!("Provider message id: {id}");
        }
    } else {
        println!("Send failed: {}", outcome.message);
    }

    if let Some(raw) = &outcome.raw_response {
        println!("Raw response: {raw}");
    }

    Ok(())
}

/// Run the teacher-absence notification flow
async fn notify_absence(
    config: &AppConfig,
    db: Database,
    teacher_id: i64,
    date: Option<&str>,
) -> Result<()> {
    let date = parse_notification_date(date)?;

    let Some(service) = build_service(config, db)? else {
        println!("SMS notifications are disabled: no active provider configuration.");
        return Ok(());
    };

    let report = service.notify_teacher_absence(teacher_id, date).await?;

    println!(
        "Absence of {} on {} recorded (log #{}).",
        report.log.teacher_name, report.log.notification_date, report.log.id
    );
    println!(
        "Students notified: {}, SMS sent: {}, SMS failed: {}, unreachable students: {}",
        report.log.students_notified,
        report.log.sms_sent,
        report.log.sms_failed,
        report.students_unreachable
    );

    Ok(())
}

/// Inspect the absence log table, creating it when missing
fn inspect_logs(db: &Database, limit: usize) -> Result<()> {
    let existed = db.table_exists(schema::teacher_absent_logs::TABLE)?;
    db.ensure_absent_log_table()?;

    if existed {
        println!("Table teacher_absent_logs exists.");
    } else {
        warn!("Table teacher_absent_logs was missing; created it with its indexes");
        println!("Table teacher_absent_logs was missing and has been created.");
    }

    println!("\nColumns:");
    for (name, declared_type) in db.absent_log_columns()? {
        println!("  - {name}: {declared_type}");
    }

    let logs = db.recent_absent_logs(limit)?;
    if logs.is_empty() {
        println!("\nNo absence log rows recorded yet.");
        return Ok(());
    }

    println!("\nMost recent rows:");
    for log in logs {
        println!(
            "  #{} {} on {}: notified {}, sent {}, failed {} (created {})",
            log.id,
            log.teacher_name,
            log.notification_date,
            log.students_notified,
            log.sms_sent,
            log.sms_failed,
            log.created_at
        );
    }

    Ok(())
}

/// Update the singleton sms_config row
fn set_config(
    db: &Database,
    api_url: &Option<String>,
    api_key: &Option<String>,
    sender: &Option<String>,
    status: &Option<String>,
) -> Result<()> {
    let status = match status.as_deref() {
        None => None,
        Some(value) if value.eq_ignore_ascii_case("active") => Some(SmsConfigStatus::Active),
        Some(value) if value.eq_ignore_ascii_case("inactive") => Some(SmsConfigStatus::Inactive),
        Some(other) => {
            return Err(anyhow::anyhow!(
                "Invalid status: {other}. Must be active or inactive"
            ))
        }
    };

    let update = SmsConfigUpdate {
        api_url: api_url.clone(),
        api_key: api_key.clone(),
        sender_name: sender.clone(),
        status,
    };

    let saved = db.save_sms_config("IPROG", &update)?;

    println!(
        "Configuration saved: provider {}, endpoint {}, sender {}, status {}.",
        saved.provider_name,
        saved.api_url,
        saved.sender_name.as_deref().unwrap_or("(none)"),
        saved.status.as_str()
    );

    Ok(())
}

/// Reset a user's password after validating the minimum-length policy
fn reset_password(db: &Database, username: &str, new_password: &str) -> Result<()> {
    InputValidator::validate_username(username)?;
    InputValidator::validate_password(new_password)?;

    db.reset_user_password(username, new_password)
        .with_context(|| format!("Failed to update password for {username}"))?;

    println!("Password updated for user: {username}");
    Ok(())
}

/// Populate sample rows so the harness commands can be exercised locally
fn seed_demo(db: &Database) -> Result<()> {
    let hash = bcrypt::hash("changeme1", bcrypt::DEFAULT_COST)?;

    let teacher = db.insert_user(&NewUser {
        full_name: "Maria Santos".to_string(),
        username: "msantos".to_string(),
        role: UserRole::Teacher,
        phone: Some("+639170000001".to_string()),
        password: hash.clone(),
        status: "active".to_string(),
    })?;

    let parent_a = db.insert_user(&NewUser {
        full_name: "Ramon Cruz".to_string(),
        username: "rcruz".to_string(),
        role: UserRole::Parent,
        phone: Some("+639170000002".to_string()),
        password: hash.clone(),
        status: "active".to_string(),
    })?;

    let parent_b = db.insert_user(&NewUser {
        full_name: "Lina Reyes".to_string(),
        username: "lreyes".to_string(),
        role: UserRole::Parent,
        phone: None,
        password: hash.clone(),
        status: "active".to_string(),
    })?;

    let student_one = db.insert_user(&NewUser {
        full_name: "Paolo Cruz".to_string(),
        username: "pcruz".to_string(),
        role: UserRole::Student,
        phone: None,
        password: hash.clone(),
        status: "active".to_string(),
    })?;

    let student_two = db.insert_user(&NewUser {
        full_name: "Bea Cruz".to_string(),
        username: "bcruz".to_string(),
        role: UserRole::Student,
        phone: None,
        password: hash.clone(),
        status: "active".to_string(),
    })?;

    let student_three = db.insert_user(&NewUser {
        full_name: "Nina Reyes".to_string(),
        username: "nreyes".to_string(),
        role: UserRole::Student,
        phone: None,
        password: hash,
        status: "active".to_string(),
    })?;

    db.link_student_parent(student_one.id, parent_a.id, Some("father"), true)?;
    db.link_student_parent(student_two.id, parent_a.id, Some("father"), true)?;
    db.link_student_parent(student_three.id, parent_b.id, Some("mother"), true)?;

    db.save_sms_config(
        "IPROG",
        &SmsConfigUpdate {
            api_url: Some("https://sms.iprogtech.com/api/v1/sms_messages".to_string()),
            api_key: Some(String::new()),
            sender_name: Some("DemoSchool".to_string()),
            status: Some(SmsConfigStatus::Inactive),
        },
    )?;

    println!("Seeded demo data:");
    println!("  teacher: {} (id {})", teacher.full_name, teacher.id);
    println!(
        "  parents: {} (id {}), {} (id {}, no phone)",
        parent_a.full_name, parent_a.id, parent_b.full_name, parent_b.id
    );
    println!("  students: 3, sms_config: inactive placeholder");
    println!("Run `set-config --api-key <key> --status active` to enable dispatch.");

    Ok(())
}

/// Parse an optional YYYY-MM-DD date, defaulting to today
fn parse_notification_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        None => Ok(Local::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {raw}")),
    }
}
