//! Integration tests for the notification service, using a mocked provider

use chrono::NaiveDate;
use mockall::mock;
use mockall::predicate::{always, eq};
use school_sms_rust::db::Database;
use school_sms_rust::error::{Result as SmsResult, SchoolSmsError};
use school_sms_rust::models::{NewUser, UserRole};
use school_sms_rust::provider::{SendOutcome, SmsProvider};
use school_sms_rust::service::NotificationService;
use tempfile::TempDir;

mock! {
    Provider {}

    #[async_trait::async_trait]
    impl SmsProvider for Provider {
        async fn send(&self, phone: &str, message: &str) -> SmsResult<SendOutcome>;
    }
}

const TEMPLATE: &str = "{teacher} is absent on {date}.";

fn open_test_database() -> (TempDir, Database) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("school.db");
    let db = Database::new(&db_path.display().to_string()).expect("Failed to create database");
    (temp_dir, db)
}

fn insert_user(db: &Database, username: &str, role: UserRole, phone: Option<&str>) -> i64 {
    db.insert_user(&NewUser {
        full_name: format!("User {username}"),
        username: username.to_string(),
        role,
        phone: phone.map(ToString::to_string),
        password: "placeholder-hash".to_string(),
        status: "active".to_string(),
    })
    .expect("insert failed")
    .id
}

fn accepted() -> SendOutcome {
    SendOutcome {
        success: true,
        message: "queued".to_string(),
        message_id: Some("msg-1".to_string()),
        raw_response: None,
    }
}

#[tokio::test]
async fn test_absence_run_counts_and_dedupes_parents() {
    let (_dir, db) = open_test_database();

    let teacher_id = insert_user(&db, "msantos", UserRole::Teacher, None);
    // Parent A has two enrolled students and should get exactly one SMS
    let parent_a = insert_user(&db, "parent_a", UserRole::Parent, Some("+639170000001"));
    let parent_b = insert_user(&db, "parent_b", UserRole::Parent, Some("+639170000002"));
    // Parent C has no phone on file, so their student is unreachable
    let parent_c = insert_user(&db, "parent_c", UserRole::Parent, None);

    let student_one = insert_user(&db, "student1", UserRole::Student, None);
    let student_two = insert_user(&db, "student2", UserRole::Student, None);
    let student_three = insert_user(&db, "student3", UserRole::Student, None);
    let student_four = insert_user(&db, "student4", UserRole::Student, None);
    // Fifth student has no parent link at all
    insert_user(&db, "student5", UserRole::Student, None);

    db.link_student_parent(student_one, parent_a, Some("father"), true)
        .expect("link failed");
    db.link_student_parent(student_two, parent_a, Some("father"), true)
        .expect("link failed");
    db.link_student_parent(student_three, parent_b, Some("mother"), true)
        .expect("link failed");
    db.link_student_parent(student_four, parent_c, Some("guardian"), true)
        .expect("link failed");

    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .with(eq("+639170000001"), always())
        .times(1)
        .returning(|_, _| Ok(accepted()));
    provider
        .expect_send()
        .with(eq("+639170000002"), always())
        .times(1)
        .returning(|_, _| Ok(SendOutcome::failure("Invalid API token")));

    let service = NotificationService::new(db.clone(), Box::new(provider), TEMPLATE.to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    let report = service
        .notify_teacher_absence(teacher_id, date)
        .await
        .expect("run failed");

    // Students 1-3 had a reachable parent; 4 (no parent phone) and 5 (no
    // link) did not
    assert_eq!(report.log.students_notified, 3);
    assert_eq!(report.students_unreachable, 2);
    assert_eq!(report.log.sms_sent, 1);
    assert_eq!(report.log.sms_failed, 1);
    assert_eq!(report.log.notification_date, date);

    // The run is recorded in teacher_absent_logs
    let logs = db.recent_absent_logs(10).expect("query failed");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, report.log.id);
    assert_eq!(logs[0].sms_sent, 1);
}

#[tokio::test]
async fn test_absence_message_renders_template() {
    let (_dir, db) = open_test_database();

    let teacher_id = insert_user(&db, "msantos", UserRole::Teacher, None);
    let parent = insert_user(&db, "parent_a", UserRole::Parent, Some("+639170000001"));
    let student = insert_user(&db, "student1", UserRole::Student, None);
    db.link_student_parent(student, parent, Some("mother"), true)
        .expect("link failed");

    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .withf(|_, message| message == "User msantos is absent on 2026-06-15.")
        .times(1)
        .returning(|_, _| Ok(accepted()));

    let service = NotificationService::new(db, Box::new(provider), TEMPLATE.to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    service
        .notify_teacher_absence(teacher_id, date)
        .await
        .expect("run failed");
}

#[tokio::test]
async fn test_absence_run_with_no_students_records_zeroes() {
    let (_dir, db) = open_test_database();

    let teacher_id = insert_user(&db, "msantos", UserRole::Teacher, None);

    let mut provider = MockProvider::new();
    provider.expect_send().times(0);

    let service = NotificationService::new(db.clone(), Box::new(provider), TEMPLATE.to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    let report = service
        .notify_teacher_absence(teacher_id, date)
        .await
        .expect("run failed");

    assert_eq!(report.log.students_notified, 0);
    assert_eq!(report.log.sms_sent, 0);
    assert_eq!(report.log.sms_failed, 0);
}

#[tokio::test]
async fn test_unknown_teacher_rejected() {
    let (_dir, db) = open_test_database();

    let mut provider = MockProvider::new();
    provider.expect_send().times(0);

    let service = NotificationService::new(db, Box::new(provider), TEMPLATE.to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    let result = service.notify_teacher_absence(999, date).await;
    assert!(matches!(result, Err(SchoolSmsError::UserNotFound(_))));
}

#[tokio::test]
async fn test_non_teacher_user_rejected() {
    let (_dir, db) = open_test_database();

    let student_id = insert_user(&db, "student1", UserRole::Student, None);

    let mut provider = MockProvider::new();
    provider.expect_send().times(0);

    let service = NotificationService::new(db, Box::new(provider), TEMPLATE.to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    let result = service.notify_teacher_absence(student_id, date).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_send_test_validates_phone_first() {
    let (_dir, db) = open_test_database();

    let mut provider = MockProvider::new();
    provider.expect_send().times(0);

    let service = NotificationService::new(db, Box::new(provider), TEMPLATE.to_string());

    let result = service.send_test("not-a-phone", "hello").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_send_test_passes_through_outcome() {
    let (_dir, db) = open_test_database();

    let mut provider = MockProvider::new();
    provider
        .expect_send()
        .with(eq("+639171234567"), eq("hello"))
        .times(1)
        .returning(|_, _| Ok(accepted()));

    let service = NotificationService::new(db, Box::new(provider), TEMPLATE.to_string());

    let outcome = service
        .send_test("+639171234567", "hello")
        .await
        .expect("send failed");
    assert!(outcome.success);
    assert_eq!(outcome.message_id.as_deref(), Some("msg-1"));
}
