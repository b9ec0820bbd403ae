//! In-process stand-in for the platform service: seedable tables plus
//! one-shot fault injection so load and save failure paths can be exercised
//! deterministically.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AcademicBackend, AttendanceRow, AttendanceUpsert, EnrollmentRow, StudentRow,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct AttendanceRecord {
    id: String,
    student_id: i64,
    course_id: i64,
    date: NaiveDate,
    status: crate::status::AttendanceStatus,
}

#[derive(Debug, Default)]
struct Tables {
    students: Vec<StudentRow>,
    enrollments: Vec<(i64, EnrollmentRow)>,
    attendance: Vec<AttendanceRecord>,
    fail_next_fetch: bool,
    fail_upserts: HashSet<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

/// One seeded attendance row, addressed like the upsert body.
pub type SeedAttendance = AttendanceUpsert;

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }

    /// Replace all tables. Faults are cleared too.
    pub async fn seed(
        &self,
        students: Vec<StudentRow>,
        enrollments: Vec<(i64, EnrollmentRow)>,
        attendance: Vec<SeedAttendance>,
    ) {
        let mut tables = self.tables.lock().await;
        tables.students = students;
        tables.enrollments = enrollments;
        tables.attendance = attendance
            .into_iter()
            .map(|rec| AttendanceRecord {
                id: Uuid::new_v4().to_string(),
                student_id: rec.student_id,
                course_id: rec.course_id,
                date: rec.date,
                status: rec.status,
            })
            .collect();
        tables.fail_next_fetch = false;
        tables.fail_upserts.clear();
    }

    /// Fail the next fetch (students, enrollments or attendance range) with
    /// a synthetic network error. One-shot.
    pub async fn fail_next_fetch(&self) {
        self.tables.lock().await.fail_next_fetch = true;
    }

    /// Fail the next upsert targeting `date`. One-shot per date.
    pub async fn fail_upsert_on(&self, date: NaiveDate) {
        self.tables.lock().await.fail_upserts.insert(date);
    }

    pub async fn clear_faults(&self) {
        let mut tables = self.tables.lock().await;
        tables.fail_next_fetch = false;
        tables.fail_upserts.clear();
    }

    fn take_fetch_fault(tables: &mut Tables) -> Result<()> {
        if tables.fail_next_fetch {
            tables.fail_next_fetch = false;
            return Err(Error::fetch("injected fetch failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl AcademicBackend for MemoryBackend {
    async fn list_students(&self) -> Result<Vec<StudentRow>> {
        let mut tables = self.tables.lock().await;
        Self::take_fetch_fault(&mut tables)?;
        Ok(tables.students.clone())
    }

    async fn enrollments_for_student(&self, student_id: i64) -> Result<Vec<EnrollmentRow>> {
        let mut tables = self.tables.lock().await;
        Self::take_fetch_fault(&mut tables)?;
        Ok(tables
            .enrollments
            .iter()
            .filter(|(sid, _)| *sid == student_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn attendance_in_range(
        &self,
        student_id: i64,
        course_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRow>> {
        let mut tables = self.tables.lock().await;
        Self::take_fetch_fault(&mut tables)?;
        Ok(tables
            .attendance
            .iter()
            .filter(|rec| {
                rec.student_id == student_id
                    && rec.course_id == course_id
                    && rec.date >= from
                    && rec.date <= to
            })
            .map(|rec| AttendanceRow {
                date: rec.date,
                status: rec.status,
            })
            .collect())
    }

    async fn upsert_attendance(&self, rec: &AttendanceUpsert) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.fail_upserts.remove(&rec.date) {
            return Err(Error::upsert(format!("injected failure for {}", rec.date)));
        }
        let existing = tables.attendance.iter_mut().find(|row| {
            row.student_id == rec.student_id
                && row.course_id == rec.course_id
                && row.date == rec.date
        });
        match existing {
            Some(row) => {
                tracing::debug!(id = %row.id, date = %rec.date, "updated attendance record");
                row.status = rec.status;
            }
            None => {
                let id = Uuid::new_v4().to_string();
                tracing::debug!(id = %id, date = %rec.date, "created attendance record");
                tables.attendance.push(AttendanceRecord {
                    id,
                    student_id: rec.student_id,
                    course_id: rec.course_id,
                    date: rec.date,
                    status: rec.status,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::AttendanceStatus::{Late, Present};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).expect("test date")
    }

    fn upsert(day: u32, status: crate::status::AttendanceStatus) -> AttendanceUpsert {
        AttendanceUpsert {
            student_id: 1,
            course_id: 7,
            date: d(day),
            status,
        }
    }

    #[tokio::test]
    async fn upsert_updates_instead_of_duplicating() {
        let backend = MemoryBackend::new();
        backend.upsert_attendance(&upsert(5, Present)).await.expect("insert");
        backend.upsert_attendance(&upsert(5, Late)).await.expect("update");

        let rows = backend
            .attendance_in_range(1, 7, d(1), d(31))
            .await
            .expect("range");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, Late);
        // Record identity is stable across the update.
        let tables = backend.tables.lock().await;
        assert_eq!(tables.attendance.len(), 1);
        assert!(!tables.attendance[0].id.is_empty());
    }

    #[tokio::test]
    async fn range_filter_is_inclusive_and_scoped() {
        let backend = MemoryBackend::new();
        backend.upsert_attendance(&upsert(1, Present)).await.expect("insert");
        backend.upsert_attendance(&upsert(31, Present)).await.expect("insert");
        let other_course = AttendanceUpsert {
            course_id: 8,
            ..upsert(10, Present)
        };
        backend.upsert_attendance(&other_course).await.expect("insert");

        let rows = backend
            .attendance_in_range(1, 7, d(1), d(31))
            .await
            .expect("range");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn fetch_fault_fires_once() {
        let backend = MemoryBackend::new();
        backend.fail_next_fetch().await;
        assert!(backend.list_students().await.is_err());
        assert!(backend.list_students().await.is_ok());
    }

    #[tokio::test]
    async fn upsert_fault_is_per_date_and_one_shot() {
        let backend = MemoryBackend::new();
        backend.fail_upsert_on(d(5)).await;
        assert!(backend.upsert_attendance(&upsert(6, Present)).await.is_ok());
        assert!(backend.upsert_attendance(&upsert(5, Present)).await.is_err());
        assert!(backend.upsert_attendance(&upsert(5, Present)).await.is_ok());
    }
}
