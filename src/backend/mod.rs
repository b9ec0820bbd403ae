//! Port onto the platform's REST service. The console core only ever sees
//! this trait; the HTTP adapter lives in the embedding shell, and
//! [`memory::MemoryBackend`] stands in for the service in tests and fixture
//! mode.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::status::AttendanceStatus;

/// Row of `GET /students`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: i64,
    pub student_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
    Withdrawn,
}

impl EnrollmentStatus {
    /// Only active and completed enrollments populate the course selector.
    pub fn selectable(self) -> bool {
        matches!(self, EnrollmentStatus::Active | EnrollmentStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Row of `GET /enrollments?student_id=`. `enrollment_date` is the lower
/// bound of the editing window for that course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRow {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
}

/// Row of `GET /academic/attendance?student_id=&course_id=&date_from=&date_to=`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Body of `POST /academic/attendance`. The service treats the
/// (student, course, date) triple as the record identity: posting it twice
/// updates rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpsert {
    pub student_id: i64,
    pub course_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[async_trait]
pub trait AcademicBackend: Send + Sync {
    async fn list_students(&self) -> Result<Vec<StudentRow>>;

    async fn enrollments_for_student(&self, student_id: i64) -> Result<Vec<EnrollmentRow>>;

    /// All records for the pair whose date falls in `[from, to]`, inclusive.
    async fn attendance_in_range(
        &self,
        student_id: i64,
        course_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRow>>;

    async fn upsert_attendance(&self, rec: &AttendanceUpsert) -> Result<()>;
}
