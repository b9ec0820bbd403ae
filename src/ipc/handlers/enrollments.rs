use serde_json::json;

use super::{get_required_i64, with_timeout, HandlerErr};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

/// Only active and completed enrollments are offered for attendance marking;
/// dropped and withdrawn ones are filtered out here, not by the service.
async fn enrollments_for_student(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_i64(params, "studentId")?;
    let backend = state.academic_backend();
    let enrollments = with_timeout(state.config.request_timeout(), async move {
        backend.enrollments_for_student(student_id).await
    })
    .await
    .map_err(HandlerErr::from_core)?;

    let rows: Vec<serde_json::Value> = enrollments
        .iter()
        .filter(|e| e.status.selectable())
        .map(|e| {
            json!({
                "courseId": e.course_id,
                "courseCode": e.course_code,
                "courseName": e.course_name,
                "enrollmentDate": e.enrollment_date.format("%Y-%m-%d").to_string(),
                "status": e.status.as_str(),
            })
        })
        .collect();
    Ok(json!({ "enrollments": rows }))
}

async fn handle_list_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    match enrollments_for_student(state, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "enrollments.listForStudent" => Some(handle_list_for_student(state, req).await),
        _ => None,
    }
}
