//! Data models for users, SMS configuration, and notification logs
//!
//! This module contains all data structures used throughout the application.
//! Rows are read from a pre-existing school management database; this crate
//! only mutates a user's password hash and appends absence log rows.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Role of a user account in the school management system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// An enrolled student
    Student,
    /// A parent or guardian of one or more students
    Parent,
    /// A teaching staff member
    Teacher,
    /// An administrator
    Admin,
    /// Any other role string stored in the database
    Other(String),
}

impl UserRole {
    /// Parse a role from its stored database value.
    ///
    /// Unknown values are preserved verbatim rather than rejected, since the
    /// host application owns the role vocabulary.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "student" => Self::Student,
            "parent" => Self::Parent,
            "teacher" => Self::Teacher,
            "admin" => Self::Admin,
            _ => Self::Other(value.to_string()),
        }
    }

    /// Get the stored database value for this role
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::Other(value) => value,
        }
    }
}

/// A user account row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database primary key
    pub id: i64,
    /// Full display name
    pub full_name: String,
    /// Login name, unique per account
    pub username: String,
    /// Account role
    pub role: UserRole,
    /// Phone number, used verbatim for SMS dispatch when present
    pub phone: Option<String>,
    /// Password hash (bcrypt)
    pub password: String,
    /// Account status (active, inactive)
    pub status: String,
}

impl User {
    /// True if the account is marked active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Fields for inserting a user row (seed tooling and tests)
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Full display name
    pub full_name: String,
    /// Login name
    pub username: String,
    /// Account role
    pub role: UserRole,
    /// Phone number
    pub phone: Option<String>,
    /// Password hash
    pub password: String,
    /// Account status
    pub status: String,
}

/// A student-parent link row with the resolved parent account
#[derive(Debug, Clone)]
pub struct ParentLink {
    /// The linked parent account
    pub parent: User,
    /// Relationship description (mother, father, guardian)
    pub relationship: Option<String>,
    /// True if this parent is the first contact for the student
    pub is_primary: bool,
}

/// Status of an SMS provider configuration row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmsConfigStatus {
    /// Configuration is in use for dispatch
    Active,
    /// Configuration is present but disabled
    Inactive,
}

impl SmsConfigStatus {
    /// Parse a status from its stored database value
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Get the stored database value for this status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// The SMS provider configuration row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Database primary key
    pub id: i64,
    /// Provider display name (IPROG)
    pub provider_name: String,
    /// Gateway endpoint URL
    pub api_url: String,
    /// Gateway API key
    pub api_key: String,
    /// Registered sender name, if any
    pub sender_name: Option<String>,
    /// Whether this configuration is in use
    pub status: SmsConfigStatus,
}

/// Partial update for the SMS configuration row
///
/// `None` fields are left untouched; at least one field must be set.
#[derive(Debug, Clone, Default)]
pub struct SmsConfigUpdate {
    /// New gateway endpoint URL
    pub api_url: Option<String>,
    /// New gateway API key
    pub api_key: Option<String>,
    /// New registered sender name
    pub sender_name: Option<String>,
    /// New configuration status
    pub status: Option<SmsConfigStatus>,
}

impl SmsConfigUpdate {
    /// True if no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.api_url.is_none()
            && self.api_key.is_none()
            && self.sender_name.is_none()
            && self.status.is_none()
    }
}

/// A recorded teacher-absence notification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAbsentLog {
    /// Database primary key
    pub id: i64,
    /// The absent teacher's user id
    pub teacher_id: i64,
    /// The absent teacher's display name at notification time
    pub teacher_name: String,
    /// The date the absence was notified for
    pub notification_date: NaiveDate,
    /// Number of students whose parent was notified
    pub students_notified: i64,
    /// Number of SMS messages the gateway accepted
    pub sms_sent: i64,
    /// Number of SMS messages that failed
    pub sms_failed: i64,
    /// Row creation timestamp
    pub created_at: NaiveDateTime,
}

/// Fields for inserting an absence log row
#[derive(Debug, Clone)]
pub struct NewTeacherAbsentLog {
    /// The absent teacher's user id
    pub teacher_id: i64,
    /// The absent teacher's display name
    pub teacher_name: String,
    /// The date the absence was notified for
    pub notification_date: NaiveDate,
    /// Number of students whose parent was notified
    pub students_notified: i64,
    /// Number of SMS messages the gateway accepted
    pub sms_sent: i64,
    /// Number of SMS messages that failed
    pub sms_failed: i64,
}

/// Summary of one absence notification run
#[derive(Debug, Clone)]
pub struct AbsenceReport {
    /// The recorded log row
    pub log: TeacherAbsentLog,
    /// Students that had no reachable parent (no link, or no phone on file)
    pub students_unreachable: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_known() {
        assert_eq!(UserRole::parse("Teacher"), UserRole::Teacher);
        assert_eq!(UserRole::parse("student"), UserRole::Student);
    }

    #[test]
    fn test_role_parse_unknown_preserved() {
        let role = UserRole::parse("registrar");
        assert_eq!(role, UserRole::Other("registrar".to_string()));
        assert_eq!(role.as_str(), "registrar");
    }

    #[test]
    fn test_config_status_round_trip() {
        assert_eq!(SmsConfigStatus::parse("ACTIVE"), SmsConfigStatus::Active);
        assert_eq!(SmsConfigStatus::parse("anything"), SmsConfigStatus::Inactive);
        assert_eq!(SmsConfigStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(SmsConfigUpdate::default().is_empty());
        let update = SmsConfigUpdate {
            api_key: Some("key".to_string()),
            ..SmsConfigUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
