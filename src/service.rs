//! Notification orchestration
//!
//! Ties the database layer to the provider seam: resolves which parents to
//! reach, renders the message, dispatches one SMS per parent, and records the
//! run in `teacher_absent_logs`.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Result, SchoolSmsError};
use crate::logging::OperationTimer;
use crate::models::{AbsenceReport, NewTeacherAbsentLog, User, UserRole};
use crate::provider::{SendOutcome, SmsProvider};
use crate::validation::InputValidator;

/// Orchestrates SMS notification runs
pub struct NotificationService {
    db: Database,
    provider: Box<dyn SmsProvider>,
    absence_template: String,
}

impl NotificationService {
    /// Build a service over a database and a provider implementation
    #[must_use]
    pub fn new(db: Database, provider: Box<dyn SmsProvider>, absence_template: String) -> Self {
        Self {
            db,
            provider,
            absence_template,
        }
    }

    /// Send a single test message, as the harness scripts did
    pub async fn send_test(&self, phone: &str, message: &str) -> Result<SendOutcome> {
        InputValidator::validate_phone(phone)?;
        InputValidator::validate_message(message)?;

        self.provider.send(phone, message).await
    }

    /// Render the absence template for a teacher and date
    fn render_absence_message(&self, teacher_name: &str, date: NaiveDate) -> String {
        self.absence_template
            .replace("{teacher}", teacher_name)
            .replace("{date}", &date.format("%Y-%m-%d").to_string())
    }

    /// Notify the primary parent of every active student that a teacher is
    /// absent, then record the run
    ///
    /// Parents are deduplicated: a parent with several enrolled students
    /// receives one message, while each covered student still counts as
    /// notified. Students with no linked parent, or whose parent has no phone
    /// on file, are reported as unreachable.
    pub async fn notify_teacher_absence(
        &self,
        teacher_id: i64,
        date: NaiveDate,
    ) -> Result<AbsenceReport> {
        let teacher = self
            .db
            .get_user_by_id(teacher_id)?
            .ok_or_else(|| SchoolSmsError::UserNotFound(format!("teacher id {teacher_id}")))?;

        if teacher.role != UserRole::Teacher {
            return Err(SchoolSmsError::Other(format!(
                "User {} is not a teacher (role: {})",
                teacher.username,
                teacher.role.as_str()
            )));
        }

        let timer = OperationTimer::new("notify_teacher_absence");
        let message = self.render_absence_message(&teacher.full_name, date);

        let students = self.db.list_active_students()?;
        info!(
            teacher = %teacher.full_name,
            students = students.len(),
            "Starting absence notification run"
        );

        let mut dispatched_parents: HashSet<i64> = HashSet::new();
        let mut students_notified: i64 = 0;
        let mut students_unreachable: i64 = 0;
        let mut sms_sent: i64 = 0;
        let mut sms_failed: i64 = 0;

        for student in &students {
            let Some(parent) = self.reachable_parent(student)? else {
                students_unreachable += 1;
                continue;
            };

            students_notified += 1;

            // One SMS per parent, even with several enrolled children
            if !dispatched_parents.insert(parent.id) {
                continue;
            }

            let Some(phone) = parent.phone.as_deref() else {
                continue;
            };

            let outcome = self.provider.send(phone, &message).await?;
            if outcome.success {
                sms_sent += 1;
            } else {
                warn!(
                    parent = %parent.full_name,
                    reason = %outcome.message,
                    "SMS dispatch failed"
                );
                sms_failed += 1;
            }
        }

        let log = self.db.insert_absent_log(&NewTeacherAbsentLog {
            teacher_id: teacher.id,
            teacher_name: teacher.full_name.clone(),
            notification_date: date,
            students_notified,
            sms_sent,
            sms_failed,
        })?;

        timer.finish();
        info!(
            sent = sms_sent,
            failed = sms_failed,
            unreachable = students_unreachable,
            "Absence notification run recorded"
        );

        Ok(AbsenceReport {
            log,
            students_unreachable,
        })
    }

    /// Find the student's first-contact parent with a phone on file
    fn reachable_parent(&self, student: &User) -> Result<Option<User>> {
        let parent = self.db.primary_parent_of_student(student.id)?;

        match parent {
            Some(parent) if parent.phone.is_some() => Ok(Some(parent)),
            _ => Ok(None),
        }
    }
}
