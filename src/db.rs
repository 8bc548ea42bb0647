use std::fs;
use std::path::Path;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{Result, SchoolSmsError};
use crate::models::{
    NewTeacherAbsentLog, NewUser, ParentLink, SmsConfig, SmsConfigStatus, SmsConfigUpdate,
    TeacherAbsentLog, User, UserRole,
};
use crate::schema::{sms_config, student_parents, teacher_absent_logs, users};
use crate::validation::MIN_PASSWORD_LEN;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
/// A pooled database connection
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// Accepts a plain file path or a `sqlite:`-prefixed URL. Missing tables
    /// are created on first connection.
    pub fn new(database_url: &str) -> Result<Self> {
        let path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| SchoolSmsError::Other(format!("Failed to create connection pool: {e}")))?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(crate::schema::CREATE_CORE_TABLES)?;
        conn.execute_batch(crate::schema::CREATE_ABSENT_LOG_TABLE)?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Map a database row to a User
    fn map_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(users::ID)?,
            full_name: row.get(users::FULL_NAME)?,
            username: row.get(users::USERNAME)?,
            role: UserRole::parse(&row.get::<_, String>(users::ROLE)?),
            phone: row.get(users::PHONE)?,
            password: row.get(users::PASSWORD)?,
            status: row.get(users::STATUS)?,
        })
    }

    /// Get a user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.get_connection()?;

        let user = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?",
                    users::TABLE,
                    users::USERNAME
                ),
                params![username],
                Self::map_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Get a user by id
    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.get_connection()?;

        let user = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", users::TABLE, users::ID),
                params![id],
                Self::map_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Insert a user row, returning it with its assigned id
    pub fn insert_user(&self, new_user: &NewUser) -> Result<User> {
        let conn = self.get_connection()?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?)",
                users::TABLE,
                users::FULL_NAME,
                users::USERNAME,
                users::ROLE,
                users::PHONE,
                users::PASSWORD,
                users::STATUS
            ),
            params![
                new_user.full_name,
                new_user.username,
                new_user.role.as_str(),
                new_user.phone,
                new_user.password,
                new_user.status
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(User {
            id,
            full_name: new_user.full_name.clone(),
            username: new_user.username.clone(),
            role: new_user.role.clone(),
            phone: new_user.phone.clone(),
            password: new_user.password.clone(),
            status: new_user.status.clone(),
        })
    }

    /// Replace the stored password hash for a user
    ///
    /// The update is a single atomic row update; fails with
    /// [`SchoolSmsError::UserNotFound`] when no row matches the username.
    pub fn update_user_password(&self, username: &str, password_hash: &str) -> Result<()> {
        let conn = self.get_connection()?;

        let updated = conn.execute(
            &format!(
                "UPDATE {} SET {} = ? WHERE {} = ?",
                users::TABLE,
                users::PASSWORD,
                users::USERNAME
            ),
            params![password_hash, username],
        )?;

        if updated == 0 {
            return Err(SchoolSmsError::UserNotFound(username.to_string()));
        }

        debug!(username, "Password hash updated");
        Ok(())
    }

    /// Reset a user's password to a new plain-text credential
    ///
    /// Enforces the minimum-length policy before hashing, so a rejected
    /// password never reaches the database.
    pub fn reset_user_password(&self, username: &str, new_password: &str) -> Result<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(SchoolSmsError::PasswordTooShort(MIN_PASSWORD_LEN));
        }

        let hash = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;
        self.update_user_password(username, &hash)
    }

    /// Link a student to a parent
    pub fn link_student_parent(
        &self,
        student_id: i64,
        parent_id: i64,
        relationship: Option<&str>,
        is_primary: bool,
    ) -> Result<()> {
        let conn = self.get_connection()?;

        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                student_parents::TABLE,
                student_parents::STUDENT_ID,
                student_parents::PARENT_ID,
                student_parents::RELATIONSHIP,
                student_parents::IS_PRIMARY
            ),
            params![student_id, parent_id, relationship, is_primary],
        )?;

        Ok(())
    }

    /// List all active students
    pub fn list_active_students(&self) -> Result<Vec<User>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? AND {} = ? ORDER BY {} ASC",
            users::TABLE,
            users::ROLE,
            users::STATUS,
            users::ID
        ))?;

        let user_iter = stmt.query_map(params!["student", "active"], Self::map_user)?;

        let mut results = Vec::new();
        for user in user_iter {
            results.push(user?);
        }

        Ok(results)
    }

    /// Get all parents linked to a student
    pub fn parents_of_student(&self, student_id: i64) -> Result<Vec<ParentLink>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT u.*, sp.{} AS link_relationship, sp.{} AS link_is_primary \
             FROM {} u JOIN {} sp ON sp.{} = u.{} \
             WHERE sp.{} = ? ORDER BY sp.{} DESC, sp.{} ASC",
            student_parents::RELATIONSHIP,
            student_parents::IS_PRIMARY,
            users::TABLE,
            student_parents::TABLE,
            student_parents::PARENT_ID,
            users::ID,
            student_parents::STUDENT_ID,
            student_parents::IS_PRIMARY,
            student_parents::ID
        ))?;

        let link_iter = stmt.query_map(params![student_id], |row| {
            Ok(ParentLink {
                parent: Self::map_user(row)?,
                relationship: row.get("link_relationship")?,
                is_primary: row.get("link_is_primary")?,
            })
        })?;

        let mut results = Vec::new();
        for link in link_iter {
            results.push(link?);
        }

        Ok(results)
    }

    /// Get the first-contact parent for a student
    ///
    /// Prefers the link flagged primary; falls back to the earliest link so a
    /// student without a flagged parent is still covered.
    pub fn primary_parent_of_student(&self, student_id: i64) -> Result<Option<User>> {
        Ok(self
            .parents_of_student(student_id)?
            .into_iter()
            .next()
            .map(|link| link.parent))
    }

    /// Map a database row to an SmsConfig
    fn map_sms_config(row: &Row) -> rusqlite::Result<SmsConfig> {
        Ok(SmsConfig {
            id: row.get(sms_config::ID)?,
            provider_name: row.get(sms_config::PROVIDER_NAME)?,
            api_url: row.get(sms_config::API_URL)?,
            api_key: row.get(sms_config::API_KEY)?,
            sender_name: row.get(sms_config::SENDER_NAME)?,
            status: SmsConfigStatus::parse(&row.get::<_, String>(sms_config::STATUS)?),
        })
    }

    /// Get the single active SMS provider configuration
    ///
    /// Returns `None` when no row has status `active`; callers treat that as
    /// "SMS disabled", not as an error.
    pub fn get_active_sms_config(&self) -> Result<Option<SmsConfig>> {
        let conn = self.get_connection()?;

        let config = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {} ASC LIMIT 1",
                    sms_config::TABLE,
                    sms_config::STATUS,
                    sms_config::ID
                ),
                params!["active"],
                Self::map_sms_config,
            )
            .optional()?;

        Ok(config)
    }

    /// Get the SMS configuration row regardless of status
    pub fn get_sms_config(&self) -> Result<Option<SmsConfig>> {
        let conn = self.get_connection()?;

        let config = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} ORDER BY {} ASC LIMIT 1",
                    sms_config::TABLE,
                    sms_config::ID
                ),
                params![],
                Self::map_sms_config,
            )
            .optional()?;

        Ok(config)
    }

    /// Apply a partial update to the SMS configuration row, inserting it when
    /// missing
    pub fn save_sms_config(
        &self,
        provider_name: &str,
        update: &SmsConfigUpdate,
    ) -> Result<SmsConfig> {
        if update.is_empty() {
            return Err(SchoolSmsError::InvalidConfig(
                "no configuration fields provided".to_string(),
            ));
        }

        let conn = self.get_connection()?;

        if let Some(existing) = self.get_sms_config()? {
            let mut update_fields = Vec::new();
            let mut update_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(api_url) = &update.api_url {
                update_fields.push(format!("{} = ?", sms_config::API_URL));
                update_params.push(Box::new(api_url.clone()));
            }

            if let Some(api_key) = &update.api_key {
                update_fields.push(format!("{} = ?", sms_config::API_KEY));
                update_params.push(Box::new(api_key.clone()));
            }

            if let Some(sender_name) = &update.sender_name {
                update_fields.push(format!("{} = ?", sms_config::SENDER_NAME));
                update_params.push(Box::new(sender_name.clone()));
            }

            if let Some(status) = update.status {
                update_fields.push(format!("{} = ?", sms_config::STATUS));
                update_params.push(Box::new(status.as_str().to_string()));
            }

            // Add the row ID for the WHERE clause
            update_params.push(Box::new(existing.id));

            let query = format!(
                "UPDATE {} SET {} WHERE {} = ?",
                sms_config::TABLE,
                update_fields.join(", "),
                sms_config::ID
            );

            conn.execute(&query, rusqlite::params_from_iter(update_params.iter()))?;
        } else {
            let api_url = update.api_url.as_deref().ok_or_else(|| {
                SchoolSmsError::InvalidConfig(
                    "no existing configuration; an API URL is required".to_string(),
                )
            })?;
            let api_key = update.api_key.as_deref().ok_or_else(|| {
                SchoolSmsError::InvalidConfig(
                    "no existing configuration; an API key is required".to_string(),
                )
            })?;
            let status = update.status.unwrap_or(SmsConfigStatus::Inactive);

            conn.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?)",
                    sms_config::TABLE,
                    sms_config::PROVIDER_NAME,
                    sms_config::API_URL,
                    sms_config::API_KEY,
                    sms_config::SENDER_NAME,
                    sms_config::STATUS
                ),
                params![
                    provider_name,
                    api_url,
                    api_key,
                    update.sender_name,
                    status.as_str()
                ],
            )?;
        }

        self.get_sms_config()?.ok_or_else(|| {
            SchoolSmsError::Other("Failed to retrieve saved SMS configuration".to_string())
        })
    }

    /// Create the absence log table and its indexes if they are missing
    ///
    /// Idempotent; the debug tool calls this against databases that predate
    /// the notification feature.
    pub fn ensure_absent_log_table(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(crate::schema::CREATE_ABSENT_LOG_TABLE)?;
        Ok(())
    }

    /// Check whether a table exists
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let conn = self.get_connection()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
            params![table_name],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    /// List the absence log table's columns as (name, declared type) pairs
    pub fn absent_log_columns(&self) -> Result<Vec<(String, String)>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT name, type FROM pragma_table_info('{}')",
            teacher_absent_logs::TABLE
        ))?;

        let column_iter = stmt.query_map(params![], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut results = Vec::new();
        for column in column_iter {
            results.push(column?);
        }

        Ok(results)
    }

    /// Map a database row to a TeacherAbsentLog
    fn map_absent_log(row: &Row) -> rusqlite::Result<TeacherAbsentLog> {
        Ok(TeacherAbsentLog {
            id: row.get(teacher_absent_logs::ID)?,
            teacher_id: row.get(teacher_absent_logs::TEACHER_ID)?,
            teacher_name: row.get(teacher_absent_logs::TEACHER_NAME)?,
            notification_date: row.get(teacher_absent_logs::NOTIFICATION_DATE)?,
            students_notified: row.get(teacher_absent_logs::STUDENTS_NOTIFIED)?,
            sms_sent: row.get(teacher_absent_logs::SMS_SENT)?,
            sms_failed: row.get(teacher_absent_logs::SMS_FAILED)?,
            created_at: row.get(teacher_absent_logs::CREATED_AT)?,
        })
    }

    /// Insert an absence notification log row
    pub fn insert_absent_log(&self, new_log: &NewTeacherAbsentLog) -> Result<TeacherAbsentLog> {
        self.ensure_absent_log_table()?;

        let conn = self.get_connection()?;
        let created_at = Utc::now().naive_utc();

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                teacher_absent_logs::TABLE,
                teacher_absent_logs::TEACHER_ID,
                teacher_absent_logs::TEACHER_NAME,
                teacher_absent_logs::NOTIFICATION_DATE,
                teacher_absent_logs::STUDENTS_NOTIFIED,
                teacher_absent_logs::SMS_SENT,
                teacher_absent_logs::SMS_FAILED,
                teacher_absent_logs::CREATED_AT
            ),
            params![
                new_log.teacher_id,
                new_log.teacher_name,
                new_log.notification_date,
                new_log.students_notified,
                new_log.sms_sent,
                new_log.sms_failed,
                created_at
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(TeacherAbsentLog {
            id,
            teacher_id: new_log.teacher_id,
            teacher_name: new_log.teacher_name.clone(),
            notification_date: new_log.notification_date,
            students_notified: new_log.students_notified,
            sms_sent: new_log.sms_sent,
            sms_failed: new_log.sms_failed,
            created_at,
        })
    }

    /// Get the most recent absence log rows, newest first
    pub fn recent_absent_logs(&self, limit: usize) -> Result<Vec<TeacherAbsentLog>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} DESC LIMIT ?",
            teacher_absent_logs::TABLE,
            teacher_absent_logs::CREATED_AT
        ))?;

        let log_iter = stmt.query_map(params![limit as i64], Self::map_absent_log)?;

        let mut results = Vec::new();
        for log in log_iter {
            results.push(log?);
        }

        Ok(results)
    }
}
