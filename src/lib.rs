//! School SMS - Notification and Administration Tools
//!
//! A Rust library for dispatching SMS notifications from a school management
//! database through the IPROG gateway, plus the small administrative tools
//! that surround the feature.
//!
//! # Features
//!
//! - Format and send SMS messages via the IPROG HTTP API
//! - Look up the active SMS provider configuration
//! - Notify parents when a teacher is absent, recording a log row
//! - Inspect/create the `teacher_absent_logs` table
//! - Reset a user's password from the command line

/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// SMS message formatting for the IPROG gateway
pub mod formatter;
/// Logging setup and utilities
pub mod logging;
/// Data models and structures
pub mod models;
/// SMS provider capability interface and the IPROG client
pub mod provider;
/// Database schema definitions
pub mod schema;
/// Notification orchestration
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use models::{SmsConfig, TeacherAbsentLog, User, UserRole};
pub use provider::{IprogClient, SendOutcome, SmsProvider};
