//! Database schema definitions
//!
//! This module provides constants for table and column names used with
//! rusqlite, plus the DDL for creating the tables when they are missing.

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// Primary key column
    pub const ID: &str = "id";
    /// Full display name column
    pub const FULL_NAME: &str = "full_name";
    /// Login name column
    pub const USERNAME: &str = "username";
    /// Role column (student, parent, teacher, admin, staff)
    pub const ROLE: &str = "role";
    /// Phone number column
    pub const PHONE: &str = "phone";
    /// Password hash column
    pub const PASSWORD: &str = "password";
    /// Account status column (active, inactive)
    pub const STATUS: &str = "status";
}

/// Student-parent link table schema
pub mod student_parents {
    /// Table name
    pub const TABLE: &str = "student_parents";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to the student user
    pub const STUDENT_ID: &str = "student_id";
    /// Foreign key to the parent user
    pub const PARENT_ID: &str = "parent_id";
    /// Relationship description column (mother, father, guardian)
    pub const RELATIONSHIP: &str = "relationship";
    /// Flag marking the first-contact parent for a student
    pub const IS_PRIMARY: &str = "is_primary";
}

/// SMS provider configuration table schema
pub mod sms_config {
    /// Table name
    pub const TABLE: &str = "sms_config";
    /// Primary key column
    pub const ID: &str = "id";
    /// Provider display name column
    pub const PROVIDER_NAME: &str = "provider_name";
    /// Gateway endpoint URL column
    pub const API_URL: &str = "api_url";
    /// Gateway API key column
    pub const API_KEY: &str = "api_key";
    /// Registered sender name column
    pub const SENDER_NAME: &str = "sender_name";
    /// Configuration status column (active, inactive)
    pub const STATUS: &str = "status";
}

/// Teacher absence notification log table schema
pub mod teacher_absent_logs {
    /// Table name
    pub const TABLE: &str = "teacher_absent_logs";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to the teacher user
    pub const TEACHER_ID: &str = "teacher_id";
    /// Teacher display name snapshot column
    pub const TEACHER_NAME: &str = "teacher_name";
    /// Date the absence was notified for
    pub const NOTIFICATION_DATE: &str = "notification_date";
    /// Count of students whose parent was notified
    pub const STUDENTS_NOTIFIED: &str = "students_notified";
    /// Count of SMS messages accepted by the gateway
    pub const SMS_SENT: &str = "sms_sent";
    /// Count of SMS messages the gateway rejected or that failed in transit
    pub const SMS_FAILED: &str = "sms_failed";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// DDL for the core tables, run once at connection time.
pub const CREATE_CORE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    phone TEXT,
    password TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS student_parents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL,
    parent_id INTEGER NOT NULL,
    relationship TEXT,
    is_primary INTEGER NOT NULL DEFAULT 0,
    UNIQUE (student_id, parent_id),
    FOREIGN KEY (student_id) REFERENCES users (id),
    FOREIGN KEY (parent_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS sms_config (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_name TEXT NOT NULL,
    api_url TEXT NOT NULL,
    api_key TEXT NOT NULL,
    sender_name TEXT,
    status TEXT NOT NULL DEFAULT 'inactive'
);
";

/// DDL for the absence log table and its indexes.
///
/// Kept separate from the core tables so the debug tool can create it on
/// demand against an existing database that predates the feature.
pub const CREATE_ABSENT_LOG_TABLE: &str = "
CREATE TABLE IF NOT EXISTS teacher_absent_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    teacher_id INTEGER NOT NULL,
    teacher_name TEXT NOT NULL,
    notification_date TEXT NOT NULL,
    students_notified INTEGER NOT NULL DEFAULT 0,
    sms_sent INTEGER NOT NULL DEFAULT 0,
    sms_failed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_teacher_absent_logs_teacher_date
    ON teacher_absent_logs (teacher_id, notification_date);

CREATE INDEX IF NOT EXISTS idx_teacher_absent_logs_created_at
    ON teacher_absent_logs (created_at);
";
