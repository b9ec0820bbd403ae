//! Seeding and fault injection for the embedded fixture backend. This is the
//! development/test surface; a production shell wires a real HTTP adapter
//! and never speaks these methods.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::{get_required_date, HandlerErr};
use crate::backend::{AttendanceUpsert, EnrollmentRow, StudentRow};
use crate::clock::FixedClock;
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

#[derive(Debug, Deserialize)]
struct SeedEnrollment {
    student_id: i64,
    #[serde(flatten)]
    row: EnrollmentRow,
}

/// Rows arrive in the service's own wire shape (snake_case), since seeding
/// populates the fake service, not the console.
#[derive(Debug, Deserialize)]
struct SeedParams {
    today: Option<NaiveDate>,
    #[serde(default)]
    students: Vec<StudentRow>,
    #[serde(default)]
    enrollments: Vec<SeedEnrollment>,
    #[serde(default)]
    attendance: Vec<AttendanceUpsert>,
}

async fn fixture_seed(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let seed: SeedParams = serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;

    let counts = json!({
        "students": seed.students.len(),
        "enrollments": seed.enrollments.len(),
        "attendance": seed.attendance.len(),
    });
    state
        .backend
        .seed(
            seed.students,
            seed.enrollments
                .into_iter()
                .map(|e| (e.student_id, e.row))
                .collect(),
            seed.attendance,
        )
        .await;
    if let Some(today) = seed.today {
        state.clock = std::sync::Arc::new(FixedClock(today));
    }
    // Any open session points at data that no longer exists.
    state.session = None;
    Ok(json!({ "seeded": counts }))
}

async fn handle_seed(state: &mut AppState, req: &Request) -> serde_json::Value {
    match fixture_seed(state, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

async fn handle_fail_next_fetch(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.backend.fail_next_fetch().await;
    ok(&req.id, json!({ "armed": true }))
}

async fn handle_fail_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match get_required_date(&req.params, "date") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    state.backend.fail_upsert_on(date).await;
    ok(&req.id, json!({ "armed": true }))
}

async fn handle_clear_faults(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.backend.clear_faults().await;
    ok(&req.id, json!({ "cleared": true }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fixture.seed" => Some(handle_seed(state, req).await),
        "fixture.failNextFetch" => Some(handle_fail_next_fetch(state, req).await),
        "fixture.failUpsert" => Some(handle_fail_upsert(state, req).await),
        "fixture.clearFaults" => Some(handle_clear_faults(state, req).await),
        _ => None,
    }
}
