use serde_json::json;

use super::{with_timeout, HandlerErr};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

async fn students_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let backend = state.academic_backend();
    let students = with_timeout(state.config.request_timeout(), async move {
        backend.list_students().await
    })
    .await
    .map_err(HandlerErr::from_core)?;

    let rows: Vec<serde_json::Value> = students
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "studentId": s.student_id,
                "fullName": s.full_name,
            })
        })
        .collect();
    Ok(json!({ "students": rows }))
}

async fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match students_list(state).await {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req).await),
        _ => None,
    }
}
